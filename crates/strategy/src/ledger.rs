use common::OrderSide;
use serde::Serialize;

/// Accumulates executed fills per side and exposes running averages.
///
/// Never evicts; grows (count-wise) for the lifetime of the bot instance.
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    buy_count: u64,
    buy_avg: f64,
    sell_count: u64,
    sell_avg: f64,
}

/// Point-in-time view of the ledger. Averages are `None` (not zero) while
/// the respective side has no fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub buy_count: u64,
    pub buy_average: Option<f64>,
    pub sell_count: u64,
    pub sell_average: Option<f64>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fill. `price` must be caller-validated as positive.
    pub fn record_fill(&mut self, side: OrderSide, price: f64) {
        let (count, avg) = match side {
            OrderSide::Buy => (&mut self.buy_count, &mut self.buy_avg),
            OrderSide::Sell => (&mut self.sell_count, &mut self.sell_avg),
        };
        *avg = (*avg * *count as f64 + price) / (*count + 1) as f64;
        *count += 1;
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            buy_count: self.buy_count,
            buy_average: (self.buy_count > 0).then_some(self.buy_avg),
            sell_count: self.sell_count,
            sell_average: (self.sell_count > 0).then_some(self.sell_avg),
        }
    }
}
