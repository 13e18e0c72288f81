//! Frame clock.
//!
//! Measures the time between redraws and owns the pause state. While
//! paused no delta accumulates, so resuming after a long pause hands the
//! engine a normal-sized frame instead of the whole pause.
//!
//! # Example
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // once per redraw:
//! if let Some(dt) = time.tick() {
//!     engine.step(dt);
//! }
//! ```

use std::time::{Duration, Instant};

/// Time tracking for the session.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    /// Raw seconds between the last two ticks.
    delta_secs: f32,
    /// Frames stepped since start (paused ticks excluded).
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Replaces the measured delta when set.
    fixed_delta: Option<f32>,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(1000),
            paused: false,
            fixed_delta: None,
        }
    }

    /// Advance the clock. Returns the raw delta to step with, or `None`
    /// while paused.
    pub fn tick(&mut self) -> Option<f32> {
        let now = Instant::now();
        if self.paused {
            self.delta_secs = 0.0;
            return None;
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            log::debug!("{:.1} fps", self.fps);
        }

        Some(self.delta_secs)
    }

    /// Raw seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Wall-clock milliseconds since start, paused time included.
    #[inline]
    pub fn wall_millis(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume; the next tick measures from now.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    /// Returns the new pause state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.paused
    }

    /// Use a fixed delta for every tick, or `None` for measured time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_tick_measures() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let delta = time.tick().expect("not paused");
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_pause_skips_steps() {
        let mut time = Time::new();
        time.tick();
        assert!(time.toggle_pause());
        thread::sleep(Duration::from_millis(5));
        assert_eq!(time.tick(), None);
        assert_eq!(time.frame(), 1);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn test_resume_does_not_count_pause() {
        let mut time = Time::new();
        time.pause();
        thread::sleep(Duration::from_millis(50));
        time.resume();
        let delta = time.tick().expect("resumed");
        assert!(delta < 0.05);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(20));
        let delta = time.tick().unwrap();
        assert!((delta - 1.0 / 60.0).abs() < 1e-6);
    }
}
