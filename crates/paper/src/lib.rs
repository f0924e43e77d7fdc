use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{Error, ExchangeClient, Fill, Order, OrderSide, Result};

/// Simulated exchange client for paper trading.
///
/// Fills are simulated at the latest known price with configurable slippage.
/// No real orders are ever sent to Binance.
pub struct PaperClient {
    /// Latest known price per symbol, updated via `update_price`.
    prices: Arc<RwLock<HashMap<String, f64>>>,
    /// Slippage in basis points applied to all fills.
    slippage_bps: f64,
}

impl PaperClient {
    pub fn new(slippage_bps: f64) -> Self {
        info!(slippage_bps, "PaperClient initialized");
        Self {
            prices: Arc::new(RwLock::new(HashMap::new())),
            slippage_bps,
        }
    }

    /// Update the latest price for a symbol (called by the price feeder task).
    pub async fn update_price(&self, symbol: &str, price: f64) {
        self.prices.write().await.insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl ExchangeClient for PaperClient {
    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        let prices = self.prices.read().await;
        let mid_price = prices.get(&order.symbol).copied().ok_or_else(|| {
            Error::Exchange(format!(
                "PaperClient has no price for symbol '{}'. Ensure market events are flowing.",
                order.symbol
            ))
        })?;
        drop(prices);

        // Apply slippage: buys pay more, sells receive less
        let fill_price = match order.side {
            OrderSide::Buy => mid_price * (1.0 + self.slippage_bps / 10_000.0),
            OrderSide::Sell => mid_price * (1.0 - self.slippage_bps / 10_000.0),
        };

        debug!(
            symbol = %order.symbol,
            side = ?order.side,
            mid = mid_price,
            fill = fill_price,
            qty = order.quantity,
            "Paper fill simulated"
        );

        Ok(Fill {
            order_id: order.id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            fill_price,
            quantity: order.quantity,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Order;

    #[tokio::test]
    async fn paper_buy_fill_applies_positive_slippage() {
        let client = PaperClient::new(10.0); // 10 bps
        client.update_price("BTCUSDT", 1000.0).await;

        let order = Order::market("BTCUSDT", OrderSide::Buy, 0.01);
        let fill = client.submit_order(&order).await.unwrap();

        let expected = 1000.0 * (1.0 + 10.0 / 10_000.0);
        assert!(
            (fill.fill_price - expected).abs() < 1e-6,
            "Buy fill price {}, expected {}",
            fill.fill_price,
            expected
        );
    }

    #[tokio::test]
    async fn paper_sell_fill_applies_negative_slippage() {
        let client = PaperClient::new(10.0);
        client.update_price("BTCUSDT", 1000.0).await;

        let order = Order::market("BTCUSDT", OrderSide::Sell, 0.01);
        let fill = client.submit_order(&order).await.unwrap();

        let expected = 1000.0 * (1.0 - 10.0 / 10_000.0);
        assert!(
            (fill.fill_price - expected).abs() < 1e-6,
            "Sell fill price {}, expected {}",
            fill.fill_price,
            expected
        );
    }

    #[tokio::test]
    async fn paper_order_without_price_is_rejected() {
        let client = PaperClient::new(0.0);
        let order = Order::market("ETHUSDT", OrderSide::Buy, 1.0);
        assert!(client.submit_order(&order).await.is_err());
    }

    #[tokio::test]
    async fn latest_price_wins() {
        let client = PaperClient::new(0.0);
        client.update_price("ETHUSDT", 500.0).await;
        client.update_price("ETHUSDT", 510.0).await;

        let order = Order::market("ETHUSDT", OrderSide::Buy, 1.0);
        let fill = client.submit_order(&order).await.unwrap();
        assert!((fill.fill_price - 510.0).abs() < 1e-9);
    }
}
