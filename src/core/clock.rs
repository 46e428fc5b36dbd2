//! Fixed-rate tick gate for the host loop.
//!
//! The window system repaints whenever it likes; the clock decides which
//! repaints advance the UI tree. Falling behind by more than one interval
//! resynchronizes to `now` instead of bursting catch-up ticks.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FrameClock {
    rate: f64,
    interval: Duration,
    last_tick: Option<Instant>,
}

impl FrameClock {
    /// Clock at `rate_hz` ticks per second (clamped to at least 1 Hz).
    pub fn new(rate_hz: f64) -> Self {
        let rate = if rate_hz.is_finite() { rate_hz.max(1.0) } else { 60.0 };
        Self {
            rate,
            interval: Duration::from_secs_f64(1.0 / rate),
            last_tick: None,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True if a tick is due at `now`; consumes it.
    pub fn tick_due(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return true;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            return false;
        }
        self.last_tick = Some(if elapsed >= self.interval * 2 {
            now
        } else {
            last + self.interval
        });
        true
    }

    /// Time left before the next tick is due.
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}
