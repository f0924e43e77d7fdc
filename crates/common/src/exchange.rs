use async_trait::async_trait;

use crate::{Fill, Order, Result};

/// Abstraction over order submission.
///
/// `BinanceClient` implements this for live trading.
/// `PaperClient` implements this for simulation.
///
/// Only `VolatilityBot::execute_order` submits orders, and it awaits the
/// result before processing the next market event, so at most one order is
/// in flight per bot instance.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Submit an order and return the fill confirmation.
    async fn submit_order(&self, order: &Order) -> Result<Fill>;
}
