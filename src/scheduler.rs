//! Cooperative interval gating.
//!
//! The control loop never blocks to pace its subsystems. Each rate-limited
//! path owns an [`IntervalGate`] and asks it every tick whether enough time
//! has elapsed; the gate compares against a stored timestamp and never
//! sleeps. This is what keeps the loop latency bounded by the sampling
//! step alone.

use serde::{Deserialize, Serialize};

/// Elapsed-time gate with a fixed period.
///
/// `try_fire` returns `true` at most once per period. A fresh gate does not
/// fire at time zero; the first fire happens once a full period has
/// elapsed, matching a peripheral that settles before its first update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntervalGate {
    period_ms: u64,
    last_fire_ms: u64,
}

impl IntervalGate {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_fire_ms: 0,
        }
    }

    /// Fire if at least one period has elapsed since the last fire.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        if now_ms >= self.last_fire_ms + self.period_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn last_fire_ms(&self) -> u64 {
        self.last_fire_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_does_not_fire_before_first_period() {
        let mut gate = IntervalGate::new(10);
        assert!(!gate.try_fire(0));
        assert!(!gate.try_fire(5));
        assert!(!gate.try_fire(9));
    }

    #[test]
    fn test_gate_fires_once_per_period() {
        let mut gate = IntervalGate::new(10);
        assert!(gate.try_fire(10));
        assert!(!gate.try_fire(11));
        assert!(!gate.try_fire(19));
        assert!(gate.try_fire(20));
        assert!(!gate.try_fire(20));
    }

    #[test]
    fn test_gate_anchors_to_actual_fire_time() {
        let mut gate = IntervalGate::new(10);
        // Late check: fires, and the next window starts from the late fire.
        assert!(gate.try_fire(37));
        assert!(!gate.try_fire(46));
        assert!(gate.try_fire(47));
        assert_eq!(gate.last_fire_ms(), 47);
    }

    #[test]
    fn test_gate_never_fires_twice_within_one_period() {
        let mut gate = IntervalGate::new(5);
        let mut fires = 0;
        for now in 0..=50 {
            if gate.try_fire(now) {
                fires += 1;
            }
        }
        // Fires at 5, 10, ..., 50.
        assert_eq!(fires, 10);
    }
}
