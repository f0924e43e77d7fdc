use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use common::{BotEvent, Candle, ExchangeClient, MarketEvent, Order, OrderSide, TickPrice};
use strategy::{BotConfig, CooldownGate, HistoryEntry, LedgerSnapshot, PriceHistory, TradeLedger, VolatilityRule};

/// Cloneable handle for read-only access to a running bot.
#[derive(Clone)]
pub struct BotHandle {
    name: String,
    symbol: String,
    ledger: Arc<RwLock<TradeLedger>>,
}

impl BotHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current buy/sell counts and running averages.
    pub async fn averages(&self) -> LedgerSnapshot {
        self.ledger.read().await.snapshot()
    }
}

/// One volatility strategy instance for one symbol.
///
/// A single tokio task consumes the market event receiver, so candle and
/// tick handling are serialized per instance and at most one order
/// submission is ever in flight. Cross-symbol concurrency is one task per
/// bot.
pub struct VolatilityBot {
    config: BotConfig,
    client: Arc<dyn ExchangeClient>,
    market_rx: broadcast::Receiver<MarketEvent>,
    event_tx: mpsc::Sender<BotEvent>,
    history: PriceHistory,
    rule: VolatilityRule,
    cooldown: CooldownGate,
    ledger: Arc<RwLock<TradeLedger>>,
    last_price: f64,
    /// Hook invoked after every executed trade; the host uses it to trigger
    /// trade-history persistence.
    on_trade: Option<Box<dyn Fn() + Send + Sync>>,
}

impl VolatilityBot {
    pub fn new(
        config: BotConfig,
        client: Arc<dyn ExchangeClient>,
        market_rx: broadcast::Receiver<MarketEvent>,
        event_tx: mpsc::Sender<BotEvent>,
    ) -> (Self, BotHandle) {
        let window = config.window_minutes as usize;
        let ledger = Arc::new(RwLock::new(TradeLedger::new()));

        let handle = BotHandle {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            ledger: ledger.clone(),
        };

        let bot = Self {
            history: PriceHistory::new(window),
            rule: VolatilityRule::new(window, config.change_pct),
            cooldown: CooldownGate::new(),
            ledger,
            last_price: 0.0,
            on_trade: None,
            config,
            client,
            market_rx,
            event_tx,
        };

        (bot, handle)
    }

    pub fn on_trade<F: Fn() + Send + Sync + 'static>(&mut self, f: F) {
        self.on_trade = Some(Box::new(f));
    }

    /// Run the bot loop. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            name = %self.config.name,
            symbol = %self.config.symbol,
            window_minutes = self.config.window_minutes,
            change_pct = self.config.change_pct,
            "VolatilityBot running"
        );

        loop {
            match self.market_rx.recv().await {
                Ok(MarketEvent::Candle(candle)) => self.on_candle(candle),
                Ok(MarketEvent::Tick(tick)) => self.on_tick(tick).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(symbol = %self.config.symbol, dropped = n, "bot lagged — dropped market events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!(symbol = %self.config.symbol, "market channel closed — bot exiting");
                    return;
                }
            }
        }
    }

    /// Only finalized candles enter history; no decision logic here.
    fn on_candle(&mut self, candle: Candle) {
        if !candle.is_final {
            return;
        }
        debug!(symbol = %candle.symbol, close = candle.close, time = %candle.close_time, "candle closed");
        self.history.push(HistoryEntry {
            close: candle.close,
            close_time: candle.close_time,
        });
    }

    async fn on_tick(&mut self, tick: TickPrice) {
        if self.cooldown.is_blocked(Utc::now()) {
            return;
        }
        if tick.price <= 0.0 {
            warn!(symbol = %self.config.symbol, price = tick.price, "ignoring non-positive tick price");
            return;
        }

        self.last_price = tick.price;
        if let Some(side) = self.rule.advise(&self.history, tick.price) {
            info!(
                symbol = %self.config.symbol,
                side = %side,
                price = tick.price,
                "volatility threshold crossed"
            );
            self.execute_order(side).await;
        }
    }

    async fn execute_order(&mut self, side: OrderSide) {
        // Re-check inside the execution path: a tick queued behind a fill
        // must observe the cooldown armed by that fill and stay a no-op.
        if self.cooldown.is_blocked(Utc::now()) {
            return;
        }

        let quantity = self.config.notional_usd / self.last_price;
        let order = Order::market(&self.config.symbol, side, quantity);

        match self.client.submit_order(&order).await {
            Ok(fill) => {
                // Record the executed price, not the requested one
                self.ledger.write().await.record_fill(fill.side, fill.fill_price);
                self.arm_cooldown();
                info!(
                    symbol = %fill.symbol,
                    side = %fill.side,
                    price = fill.fill_price,
                    qty = fill.quantity,
                    "order filled"
                );
                let _ = self
                    .event_tx
                    .send(BotEvent::TradeExecuted {
                        symbol: fill.symbol.clone(),
                        side: fill.side,
                        fill_price: fill.fill_price,
                        quantity: fill.quantity,
                    })
                    .await;
                if let Some(callback) = &self.on_trade {
                    callback();
                }
            }
            Err(e) => {
                let code = e.rejection_code();
                let blocking = code
                    .map(|c| self.config.blocking_error_codes.contains(&c))
                    .unwrap_or(false);

                if blocking {
                    // The account cannot trade this side right now; arming the
                    // cooldown avoids a hot-loop of repeated rejections.
                    self.arm_cooldown();
                    warn!(symbol = %self.config.symbol, error = %e, "order rejected — cooldown armed");
                } else {
                    error!(symbol = %self.config.symbol, error = %e, "order failed — next qualifying tick retries");
                }

                let _ = self
                    .event_tx
                    .send(BotEvent::OrderFailed {
                        symbol: self.config.symbol.clone(),
                        side,
                        code,
                        error: e.to_string(),
                        cooldown_armed: blocking,
                    })
                    .await;
            }
        }
    }

    fn arm_cooldown(&mut self) {
        self.cooldown
            .arm(Utc::now(), Duration::minutes(self.config.window_minutes as i64));
        if let Some(until) = self.cooldown.blocked_until() {
            info!(symbol = %self.config.symbol, until = %until, "cooldown armed — no trades until then");
        }
    }
}
