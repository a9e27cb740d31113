//! Frame pacing
//!
//! The loop asks a [`FramePacer`] for the time elapsed since the previous
//! frame boundary. Platforms with a better timer primitive can supply their
//! own pacer without touching the loop.

use std::thread;
use std::time::{Duration, Instant};

pub trait FramePacer {
    /// Blocks until at least `target` has elapsed since the previous frame
    /// boundary (no wait when `target` is `None`), records a new boundary and
    /// returns the elapsed time.
    fn wait_for_next_frame(&mut self, target: Option<Duration>) -> Duration;

    /// Restarts the clock so the next frame measures from now.
    fn reset(&mut self);
}

/// Monotonic pacer that spins with voluntary yields instead of sleeping, so
/// frame times are not quantized to the scheduler's sleep granularity.
pub struct SpinYieldPacer {
    clock: Instant,
    previous_boundary: Duration,
}

impl SpinYieldPacer {
    pub fn new() -> Self {
        Self {
            clock: Instant::now(),
            previous_boundary: Duration::ZERO,
        }
    }

    fn elapsed_since_boundary(&self) -> (Duration, Duration) {
        let now = self.clock.elapsed();
        (now, now.saturating_sub(self.previous_boundary))
    }
}

impl Default for SpinYieldPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePacer for SpinYieldPacer {
    fn wait_for_next_frame(&mut self, target: Option<Duration>) -> Duration {
        let (mut now, mut delta) = self.elapsed_since_boundary();
        if let Some(target) = target {
            while delta < target {
                thread::yield_now();
                (now, delta) = self.elapsed_since_boundary();
            }
        }
        self.previous_boundary = now;
        delta
    }

    fn reset(&mut self) {
        self.clock = Instant::now();
        self.previous_boundary = Duration::ZERO;
    }
}

/// Time between frames at `framerate`.
///
/// `None` when the rate is not finite and positive, or so low that its frame
/// time does not fit in a `Duration`.
pub fn frame_period(framerate: f64) -> Option<Duration> {
    if !framerate.is_finite() || framerate <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(framerate.recip()).ok()
}

/// Desired frame time for a framerate, or `None` when limiting is off.
pub fn frame_budget(desired_framerate: f64, limit_frame_rate: bool) -> Option<Duration> {
    if limit_frame_rate {
        frame_period(desired_framerate)
    } else {
        None
    }
}
