use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// A finalized candle close retained in [`PriceHistory`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub close: f64,
    pub close_time: DateTime<Utc>,
}

/// Fixed-capacity, insertion-ordered buffer of recent candle closes.
///
/// Holds at most `capacity` entries, oldest to newest; pushing past capacity
/// evicts the oldest. Callers must only push finalized candles — this buffer
/// knows nothing about candle finality.
///
/// Not safe for concurrent writers; each bot task owns its history.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `entry` as the newest, evicting the oldest when full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entry `age` positions back from the newest (age 1 = most recent push,
    /// age = capacity → oldest retained). `None` if fewer than `age` entries
    /// have been pushed so far.
    pub fn lookup_by_age(&self, age: usize) -> Option<&HistoryEntry> {
        if age == 0 || age > self.entries.len() {
            return None;
        }
        self.entries.get(self.entries.len() - age)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(close: f64) -> HistoryEntry {
        HistoryEntry {
            close,
            close_time: Utc::now(),
        }
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut history = PriceHistory::new(3);
        for i in 0..10 {
            history.push(entry(i as f64));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn oldest_entry_evicted_first() {
        let mut history = PriceHistory::new(3);
        for close in [1.0, 2.0, 3.0, 4.0] {
            history.push(entry(close));
        }
        // 1.0 evicted; oldest retained is 2.0 at age 3
        assert_eq!(history.lookup_by_age(3).unwrap().close, 2.0);
        assert_eq!(history.lookup_by_age(1).unwrap().close, 4.0);
    }

    #[test]
    fn lookup_absent_before_enough_pushes() {
        let mut history = PriceHistory::new(5);
        assert!(history.lookup_by_age(1).is_none());
        history.push(entry(100.0));
        history.push(entry(101.0));
        assert!(history.lookup_by_age(3).is_none());
        assert_eq!(history.lookup_by_age(2).unwrap().close, 100.0);
    }

    #[test]
    fn age_zero_is_absent() {
        let mut history = PriceHistory::new(2);
        history.push(entry(100.0));
        assert!(history.lookup_by_age(0).is_none());
    }

    #[test]
    fn duplicate_pushes_shift_history() {
        // No deduplication: the same candle pushed twice occupies two slots.
        let mut history = PriceHistory::new(3);
        let dup = entry(50.0);
        history.push(entry(49.0));
        history.push(dup);
        history.push(dup);
        assert_eq!(history.len(), 3);
        assert_eq!(history.lookup_by_age(1).unwrap().close, 50.0);
        assert_eq!(history.lookup_by_age(2).unwrap().close, 50.0);
        assert_eq!(history.lookup_by_age(3).unwrap().close, 49.0);
    }
}
