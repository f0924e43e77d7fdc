use chrono::Utc;
use proptest::prelude::*;
use strategy::{HistoryEntry, PriceHistory};

proptest! {
    /// The buffer never exceeds its capacity for any push sequence.
    #[test]
    fn history_never_exceeds_capacity(
        capacity in 1usize..64,
        closes in prop::collection::vec(0.0001f64..1_000_000.0f64, 0..256),
    ) {
        let mut history = PriceHistory::new(capacity);
        for close in &closes {
            history.push(HistoryEntry { close: *close, close_time: Utc::now() });
            prop_assert!(history.len() <= capacity);
        }
    }

    /// `lookup_by_age(k)` returns the close pushed k pushes ago, for every
    /// k within both the capacity and the number of pushes; larger k is absent.
    #[test]
    fn lookup_by_age_matches_push_order(
        capacity in 1usize..32,
        closes in prop::collection::vec(0.0001f64..1_000_000.0f64, 1..128),
    ) {
        let mut history = PriceHistory::new(capacity);
        for close in &closes {
            history.push(HistoryEntry { close: *close, close_time: Utc::now() });
        }

        let retained = closes.len().min(capacity);
        for age in 1..=retained {
            let expected = closes[closes.len() - age];
            let got = history.lookup_by_age(age).map(|e| e.close);
            prop_assert_eq!(got, Some(expected));
        }
        prop_assert!(history.lookup_by_age(retained + 1).is_none());
    }
}
