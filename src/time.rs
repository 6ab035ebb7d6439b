//! Frame counting and throughput measurement for the window host.
//!
//! # Example
//!
//! ```ignore
//! use glyphdust::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per presented frame:
//! if let Some(fps) = clock.tick() {
//!     log::debug!("{:.1} fps", fps);
//! }
//! ```

use std::time::{Duration, Instant};

/// Counts frames and reports a fresh FPS figure once per interval.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    frame_count: u64,
    fps: f32,
    /// Frame count at the last FPS report.
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    /// A clock that reports every two seconds.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(2))
    }

    pub fn with_interval(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: interval,
        }
    }

    /// Record a frame. Returns the new FPS figure when an interval has elapsed.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.frame_count += 1;

        let since = now.duration_since(self.fps_update_time);
        if since < self.fps_update_interval || since.is_zero() {
            return None;
        }
        let frames = self.frame_count - self.fps_frame_count;
        self.fps = frames as f32 / since.as_secs_f32();
        self.fps_frame_count = self.frame_count;
        self.fps_update_time = now;
        Some(self.fps)
    }

    /// Total frames recorded.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Last reported FPS, 0 before the first report.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Seconds since the clock was created.
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
