// src/refresh/activity.rs
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Push/pop counts since the last successful refresh.
///
/// Reads are relaxed: the values only gate the drift trigger.
#[derive(Debug, Default)]
pub struct ActivityCounters {
    pushes: AtomicU64,
    pops: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub pushes: u64,
    pub pops: u64,
}

impl Activity {
    pub fn drift(&self) -> u64 {
        self.pushes.abs_diff(self.pops)
    }
}

impl ActivityCounters {
    pub fn record_push(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pop(&self) {
        self.pops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(&self) -> Activity {
        Activity {
            pushes: self.pushes.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
        }
    }

    /// Takes `seen` off the counters, keeping anything recorded since it was read.
    pub fn consume(&self, seen: Activity) {
        self.pushes.fetch_sub(seen.pushes, Ordering::Relaxed);
        self.pops.fetch_sub(seen.pops, Ordering::Relaxed);
    }

    pub fn exceeds(&self, threshold: u64) -> bool {
        let activity = self.read();
        drift_exceeds(activity.pushes, activity.pops, threshold)
    }
}

/// True once the net push/pop imbalance is strictly above `threshold`.
pub fn drift_exceeds(pushes: u64, pops: u64, threshold: u64) -> bool {
    pushes.abs_diff(pops) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_must_cross_the_threshold() {
        assert!(!drift_exceeds(3, 0, 3));
        assert!(drift_exceeds(4, 0, 3));
        assert!(!drift_exceeds(0, 3, 3));
        assert!(drift_exceeds(1, 5, 3));
        assert!(!drift_exceeds(10, 10, 0));
    }

    #[test]
    fn consume_drops_only_what_was_seen() {
        let counters = ActivityCounters::default();
        counters.record_push();
        counters.record_push();
        counters.record_pop();
        let seen = counters.read();
        assert_eq!(seen, Activity { pushes: 2, pops: 1 });
        assert_eq!(seen.drift(), 1);

        counters.record_push();
        counters.consume(seen);
        assert_eq!(counters.read(), Activity { pushes: 1, pops: 0 });

        counters.consume(counters.read());
        assert_eq!(counters.read(), Activity::default());
    }
}
