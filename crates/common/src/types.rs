use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candlestick update from the exchange stream. The engine only admits
/// candles with `is_final == true` into price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub close: f64,
    pub close_time: DateTime<Utc>,
    /// True once the candle has closed. Non-final updates repeat every few
    /// hundred milliseconds while the interval is still open.
    pub is_final: bool,
}

/// A single executed trade observed on the market (last-traded price).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickPrice {
    pub symbol: String,
    pub price: f64,
    pub time: DateTime<Utc>,
}

/// Live market data event from the exchange stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    Candle(Candle),
    Tick(TickPrice),
}

impl MarketEvent {
    pub fn symbol(&self) -> &str {
        match self {
            MarketEvent::Candle(c) => &c.symbol,
            MarketEvent::Tick(t) => &t.symbol,
        }
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// A market order to be submitted to the exchange. Immediate market
/// execution is the only order type this system places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
}

impl Order {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            quantity,
        }
    }
}

/// Confirmation of a filled order returned by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub fill_price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
}

/// Whether the bot is running against the real exchange or simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

/// Events emitted by a bot instance on its event channel. The host consumes
/// these for logging and alerting; the bot itself never touches a global sink.
#[derive(Debug, Clone)]
pub enum BotEvent {
    TradeExecuted {
        symbol: String,
        side: OrderSide,
        fill_price: f64,
        quantity: f64,
    },
    OrderFailed {
        symbol: String,
        side: OrderSide,
        code: Option<i64>,
        error: String,
        /// True when the failure code was classified as blocking and the bot
        /// armed its cooldown instead of retrying on the next tick.
        cooldown_armed: bool,
    },
}
