use std::time::{Duration, Instant};

/// Timing snapshot of one render-loop pass.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous pass, clamped.
    pub dt: f32,

    /// Monotonic timestamp taken when the pass started.
    pub started: Instant,

    /// Zero-based pass counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// Deadline of the next pass when running at a fixed `interval`.
    #[inline]
    pub fn next_deadline(&self, interval: Duration) -> Instant {
        self.started + interval
    }
}

/// Produces `FrameTime` snapshots for the render loop.
///
/// Delta time is clamped so that a render thread that stalled (debugger,
/// suspended process, a long unit) does not hand huge steps to animation code.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Number of passes ticked so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Starts a new pass.
    pub fn tick(&mut self) -> FrameTime {
        let started = Instant::now();
        let dt = started
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = started;

        let frame = FrameTime {
            dt: dt.as_secs_f32(),
            started,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
