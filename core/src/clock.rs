//! Time sources and frame-delta bookkeeping.

use crate::types::Timestamp;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

/// A wall clock in milliseconds since the Unix epoch.
pub trait TimeSource {
    fn now_ms(&self) -> Timestamp;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Arc::new(AtomicI64::new(start)) }
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Tracks the previous frame timestamp and turns wall time into deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameClock {
    last_frame: Option<Timestamp>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous frame. The first frame yields 0 so a
    /// fresh mount never produces a startup spike; a clock that runs
    /// backwards yields 0 as well.
    pub fn delta_secs(&mut self, now: Timestamp) -> f64 {
        let delta = match self.last_frame {
            None => 0.0,
            Some(prev) if now > prev => (now - prev) as f64 / 1000.0,
            Some(_) => 0.0,
        };
        self.last_frame = Some(now);
        delta
    }

    /// Forget the previous frame (next delta is 0 again).
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta_secs(10_000), 0.0);
        assert_eq!(clock.delta_secs(10_500), 0.5);
    }

    #[test]
    fn backwards_time_is_clamped() {
        let mut clock = FrameClock::new();
        clock.delta_secs(5_000);
        assert_eq!(clock.delta_secs(4_000), 0.0);
        assert_eq!(clock.delta_secs(5_000), 1.0);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), 150);
    }
}
