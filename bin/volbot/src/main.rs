use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{BotEvent, Config, MarketEvent, TradingMode};
use engine::{BinanceClient, BinanceStream, VolatilityBot};
use paper::PaperClient;
use strategy::BotFileConfig;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.trading_mode, "VolBot starting");

    let bot_file = BotFileConfig::load(&cfg.bot_config_path)
        .unwrap_or_else(|e| panic!("{e}"));
    if bot_file.bots.is_empty() {
        panic!("No bots configured in '{}'", cfg.bot_config_path);
    }

    // ── Exchange client (injected based on TRADING_MODE) ──────────────────────
    // In paper mode we keep a typed handle so a feeder task can push prices in.
    let (exchange_client, paper_client): (Arc<dyn common::ExchangeClient>, Option<Arc<PaperClient>>) =
        match cfg.trading_mode {
            TradingMode::Live => {
                info!("Live trading mode — using BinanceClient");
                let client = BinanceClient::new(&cfg.binance_api_key, &cfg.binance_secret);
                (Arc::new(client), None)
            }
            TradingMode::Paper => {
                info!(slippage_bps = cfg.paper_slippage_bps, "Paper trading mode — using PaperClient");
                let client = Arc::new(PaperClient::new(cfg.paper_slippage_bps));
                (client.clone(), Some(client))
            }
        };

    // ── Bots: one stream + one bot task per configured symbol ────────────────
    let (event_tx, mut event_rx) = mpsc::channel::<BotEvent>(128);
    let trades_executed = Arc::new(AtomicU64::new(0));
    let mut bot_handles = Vec::new();

    for bot_cfg in &bot_file.bots {
        let (market_tx, market_rx) = broadcast::channel::<MarketEvent>(1024);

        let stream = BinanceStream::new(bot_cfg.symbol.clone(), market_tx.clone());
        tokio::spawn(stream.run());

        // Paper fills happen at the latest observed tick price
        if let Some(paper) = &paper_client {
            let mut feed_rx = market_tx.subscribe();
            let paper = paper.clone();
            tokio::spawn(async move {
                loop {
                    match feed_rx.recv().await {
                        Ok(MarketEvent::Tick(tick)) => {
                            paper.update_price(&tick.symbol, tick.price).await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            });
        }

        let (mut bot, handle) = VolatilityBot::new(
            bot_cfg.clone(),
            exchange_client.clone(),
            market_rx,
            event_tx.clone(),
        );
        // Persistence seam: the host would write trade history here.
        let counter = trades_executed.clone();
        bot.on_trade(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        tokio::spawn(bot.run());
        bot_handles.push(handle);
    }
    drop(event_tx);

    // ── Bot event logger ──────────────────────────────────────────────────────
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                BotEvent::TradeExecuted {
                    symbol,
                    side,
                    fill_price,
                    quantity,
                } => {
                    info!(%symbol, %side, price = fill_price, qty = quantity, "trade executed");
                }
                BotEvent::OrderFailed {
                    symbol,
                    side,
                    code,
                    error,
                    cooldown_armed,
                } => {
                    if cooldown_armed {
                        warn!(%symbol, %side, ?code, %error, "order rejected — bot cooling down");
                    } else {
                        error!(%symbol, %side, ?code, %error, "order failed — bot will retry");
                    }
                }
            }
        }
    });

    // ── Periodic averages report ──────────────────────────────────────────────
    let report_handles = bot_handles.clone();
    let report_counter = trades_executed.clone();
    let report_interval = cfg.report_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(report_interval));
        interval.tick().await; // skip the immediate first tick
        loop {
            interval.tick().await;
            for handle in &report_handles {
                let s = handle.averages().await;
                info!(
                    bot = %handle.name(),
                    symbol = %handle.symbol(),
                    buys = s.buy_count,
                    avg_buy = ?s.buy_average,
                    sells = s.sell_count,
                    avg_sell = ?s.sell_average,
                    "trade averages"
                );
            }
            info!(total = report_counter.load(Ordering::Relaxed), "trades executed so far");
        }
    });

    // Keep main alive
    info!(bots = bot_handles.len(), "All bots started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}
