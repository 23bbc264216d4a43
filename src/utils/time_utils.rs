use std::time::{Duration, Instant};

/// Wall-clock stopwatch for per-file conversion stats.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Frames per second of wall-clock time, 0 when nothing has elapsed.
    pub fn rate(&self, frames: u64) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            frames as f64 / secs
        } else {
            0.0
        }
    }
}
