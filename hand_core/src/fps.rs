//! Lagging frames-per-second measurement.
//!
//! Frames are counted as they arrive (including ones that later fail to
//! decode). On each tick the count is divided by the elapsed time since the
//! previous tick, then both are reset, so the value always describes the
//! previous interval.

use std::time::{Duration, Instant};

/// Ticks closer together than this produce no reading.
pub const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub struct FpsCounter {
    frames:    u32,
    last_tick: Instant,
    last_fps:  u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        FpsCounter { frames: 0, last_tick: now, last_fps: 0 }
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    /// Frames counted since the last tick.
    pub fn frames(&self)    -> u32     { self.frames }
    pub fn last_tick(&self) -> Instant { self.last_tick }
    pub fn fps(&self)       -> u32     { self.last_fps }

    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.last_tick) >= interval
    }

    /// Close the current interval. Returns `None` (and keeps counting) when
    /// less than [`MIN_TICK`] has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed < MIN_TICK {
            return None;
        }
        let fps = (self.frames as f64 / elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.last_tick = now;
        self.last_fps = fps;
        Some(fps)
    }

    pub fn reset(&mut self, now: Instant) {
        *self = FpsCounter::new(now);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
