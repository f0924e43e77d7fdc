use chrono::{DateTime, Duration, Utc};

/// Tracks a "do not trade until" timestamp.
///
/// The cooldown keeps the bot from re-trading into the same volatility spike;
/// its duration equals the lookback window, so the next reachable history
/// lookup reflects genuinely new information. Expiry is evaluated lazily on
/// each tick — no timers.
#[derive(Debug, Clone, Default)]
pub struct CooldownGate {
    blocked_until: Option<DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a blocked-until timestamp is set and `now` is before it.
    /// Exactly at the timestamp the gate is open.
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        match self.blocked_until {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Block trading until `now + duration`, overwriting any prior value.
    pub fn arm(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.blocked_until = Some(now + duration);
    }

    pub fn clear(&mut self) {
        self.blocked_until = None;
    }

    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        self.blocked_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_gate_is_open() {
        let gate = CooldownGate::new();
        assert!(!gate.is_blocked(Utc::now()));
    }

    #[test]
    fn blocked_strictly_before_expiry_open_at_expiry() {
        let mut gate = CooldownGate::new();
        let t0 = Utc::now();
        gate.arm(t0, Duration::minutes(5));

        assert!(gate.is_blocked(t0));
        assert!(gate.is_blocked(t0 + Duration::minutes(4)));
        assert!(gate.is_blocked(t0 + Duration::minutes(5) - Duration::milliseconds(1)));
        assert!(!gate.is_blocked(t0 + Duration::minutes(5)));
        assert!(!gate.is_blocked(t0 + Duration::minutes(6)));
    }

    #[test]
    fn arm_overwrites_previous_value() {
        let mut gate = CooldownGate::new();
        let t0 = Utc::now();
        gate.arm(t0, Duration::minutes(10));
        gate.arm(t0, Duration::minutes(1));
        assert!(!gate.is_blocked(t0 + Duration::minutes(2)));
    }

    #[test]
    fn clear_unblocks() {
        let mut gate = CooldownGate::new();
        let t0 = Utc::now();
        gate.arm(t0, Duration::minutes(5));
        gate.clear();
        assert!(!gate.is_blocked(t0));
        assert!(gate.blocked_until().is_none());
    }
}
