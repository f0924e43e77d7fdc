use common::OrderSide;
use tracing::debug;

use crate::history::PriceHistory;

/// Single-window percentage-change rule.
///
/// Compares the current price against the close `window` candles ago and
/// advises a mean-reversion trade when the move exceeds `threshold_pct`:
/// price rose → Sell, price fell → Buy. The comparison is strictly
/// greater-than; a move exactly at the threshold does not trigger.
#[derive(Debug, Clone)]
pub struct VolatilityRule {
    pub window: usize,
    pub threshold_pct: f64,
}

impl VolatilityRule {
    pub fn new(window: usize, threshold_pct: f64) -> Self {
        assert!(window > 0, "window must be > 0");
        assert!(threshold_pct > 0.0, "threshold must be > 0");
        Self {
            window,
            threshold_pct,
        }
    }

    /// `None` when fewer than `window` closes are retained (expected during
    /// startup) or the move is within the threshold.
    pub fn advise(&self, history: &PriceHistory, price: f64) -> Option<OrderSide> {
        let reference = history.lookup_by_age(self.window)?;
        let change_pct = (price - reference.close) / reference.close * 100.0;
        debug!(
            reference = reference.close,
            price,
            change_pct,
            "price change vs window"
        );

        if change_pct.abs() > self.threshold_pct {
            if change_pct > 0.0 {
                Some(OrderSide::Sell)
            } else {
                Some(OrderSide::Buy)
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use chrono::Utc;

    fn history_with_reference(window: usize, close: f64) -> PriceHistory {
        let mut history = PriceHistory::new(window);
        for _ in 0..window {
            history.push(HistoryEntry {
                close,
                close_time: Utc::now(),
            });
        }
        history
    }

    #[test]
    fn no_advice_without_enough_history() {
        let rule = VolatilityRule::new(5, 2.0);
        let mut history = PriceHistory::new(5);
        for _ in 0..4 {
            history.push(HistoryEntry {
                close: 100.0,
                close_time: Utc::now(),
            });
        }
        assert_eq!(rule.advise(&history, 200.0), None);
    }

    #[test]
    fn threshold_table_reference_100_threshold_2() {
        let rule = VolatilityRule::new(3, 2.0);
        let history = history_with_reference(3, 100.0);

        assert_eq!(rule.advise(&history, 101.99), None);
        assert_eq!(rule.advise(&history, 102.01), Some(OrderSide::Sell));
        // 98.00 is exactly -2% — strict inequality, no trigger
        assert_eq!(rule.advise(&history, 98.0), None);
        assert_eq!(rule.advise(&history, 97.99), Some(OrderSide::Buy));
    }

    #[test]
    fn exact_positive_threshold_does_not_trigger() {
        let rule = VolatilityRule::new(1, 2.0);
        let history = history_with_reference(1, 100.0);
        assert_eq!(rule.advise(&history, 102.0), None);
    }

    #[test]
    fn reference_is_the_oldest_entry_at_full_window() {
        let rule = VolatilityRule::new(3, 2.0);
        let mut history = PriceHistory::new(3);
        for close in [100.0, 110.0, 120.0] {
            history.push(HistoryEntry {
                close,
                close_time: Utc::now(),
            });
        }
        // Reference at age 3 is 100.0, so 103 is a +3% move
        assert_eq!(rule.advise(&history, 103.0), Some(OrderSide::Sell));
    }
}
