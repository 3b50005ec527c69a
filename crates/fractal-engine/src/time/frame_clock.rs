use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, after clamping.
    pub dt: Duration,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

impl FrameTime {
    /// Elapsed time since the previous frame in milliseconds.
    ///
    /// The first frame has no predecessor and reports 0.
    pub fn elapsed_ms(&self) -> f64 {
        if self.frame_index == 0 {
            0.0
        } else {
            self.dt.as_secs_f64() * 1000.0
        }
    }
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// turn into one enormous pan step on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps (0.1 ms .. 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the clock baseline.
    ///
    /// Called after the window is (re)created so setup time is not counted as
    /// a frame.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_reports_zero_elapsed() {
        let mut clock = FrameClock::new();
        let ft = clock.tick_at(clock.last + Duration::from_millis(16));
        assert_eq!(ft.frame_index, 0);
        assert_eq!(ft.elapsed_ms(), 0.0);
    }

    #[test]
    fn later_frames_report_milliseconds() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        clock.tick_at(start + Duration::from_millis(16));
        let ft = clock.tick_at(start + Duration::from_millis(36));
        assert_eq!(ft.frame_index, 1);
        assert!((ft.elapsed_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        clock.tick_at(start);
        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, Duration::from_millis(250));
    }

    #[test]
    fn tight_loop_is_clamped_to_minimum() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let ft = clock.tick_at(start);
        assert_eq!(ft.dt, Duration::from_micros(100));
    }
}
