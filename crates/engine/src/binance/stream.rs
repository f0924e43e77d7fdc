use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};
use url::Url;

use common::{Candle, MarketEvent, Result, TickPrice};

/// Binance combined WebSocket stream for a single symbol: 1-minute klines
/// plus live trade ticks.
///
/// Parses events into `MarketEvent` and publishes them on a broadcast
/// channel. Reconnects automatically with exponential backoff, so a failed
/// subscription degrades this symbol to "no trading" without affecting the
/// rest of the process.
pub struct BinanceStream {
    symbol: String,
    market_tx: broadcast::Sender<MarketEvent>,
}

impl BinanceStream {
    pub fn new(symbol: impl Into<String>, market_tx: broadcast::Sender<MarketEvent>) -> Self {
        Self {
            symbol: symbol.into(),
            market_tx,
        }
    }

    /// Run the stream loop forever, reconnecting on failure.
    /// Call this inside a `tokio::spawn`.
    pub async fn run(self) {
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(60);

        loop {
            info!(symbol = %self.symbol, "Connecting to Binance WebSocket stream");
            match self.connect_once().await {
                Ok(()) => {
                    info!(symbol = %self.symbol, "WebSocket stream closed cleanly");
                    // Clean close — reconnect after a short delay (e.g. 24h session end)
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    backoff = Duration::from_secs(1);
                }
                Err(e) => {
                    warn!(symbol = %self.symbol, error = %e, backoff = ?backoff, "WebSocket error, reconnecting");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<()> {
        let sym = self.symbol.to_lowercase();
        let url_str = format!(
            "wss://stream.binance.com:9443/stream?streams={sym}@kline_1m/{sym}@trade"
        );
        let url = Url::parse(&url_str).map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let (_, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| common::Error::WebSocket(e.to_string()))?;

            if let tokio_tungstenite::tungstenite::Message::Text(text) = msg {
                match parse_market_event(&self.symbol, &text) {
                    Ok(Some(event)) => {
                        // Ignore send errors (no active receivers)
                        let _ = self.market_tx.send(event);
                    }
                    Ok(None) => {} // non-market message, skip
                    Err(e) => {
                        warn!(error = %e, "Failed to parse market event");
                    }
                }
            }
        }

        Ok(())
    }
}

// ─── Binance stream JSON parsing ─────────────────────────────────────────────

#[derive(Deserialize)]
struct KlineWrapper {
    k: KlineData,
}

#[derive(Deserialize)]
struct KlineData {
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "x")]
    is_closed: bool,
    #[serde(rename = "T")]
    close_time_ms: i64,
}

#[derive(Deserialize)]
struct TradeData {
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "T")]
    trade_time_ms: i64,
}

fn timestamp(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

fn parse_price(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| common::Error::Exchange(format!("unparseable price '{raw}'")))
}

/// Parse one message from the combined stream. Messages are wrapped as
/// `{"stream": "...", "data": {...}}`; the payload's `e` field identifies
/// kline vs trade events.
fn parse_market_event(symbol: &str, text: &str) -> Result<Option<MarketEvent>> {
    let wrapper: serde_json::Value = serde_json::from_str(text)?;
    let data = wrapper.get("data").cloned().unwrap_or(wrapper);

    match data.get("e").and_then(|v| v.as_str()) {
        Some("kline") => {
            let kline: KlineWrapper = serde_json::from_value(data)?;
            Ok(Some(MarketEvent::Candle(Candle {
                symbol: symbol.to_string(),
                close: parse_price(&kline.k.close)?,
                close_time: timestamp(kline.k.close_time_ms),
                is_final: kline.k.is_closed,
            })))
        }
        Some("trade") => {
            let trade: TradeData = serde_json::from_value(data)?;
            Ok(Some(MarketEvent::Tick(TickPrice {
                symbol: symbol.to_string(),
                price: parse_price(&trade.price)?,
                time: timestamp(trade.trade_time_ms),
            })))
        }
        _ => Ok(None),
    }
}
