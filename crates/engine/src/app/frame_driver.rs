use std::time::{Duration, Instant};

pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Turns wall-clock instants into clamped frame deltas.
///
/// `start` is idempotent and `stop` guarantees `frame` invokes no further callbacks until
/// the driver is started again.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    max_delta: Duration,
    last: Option<Instant>,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_DELTA)
    }
}

impl FrameDriver {
    pub fn new(max_delta: Duration) -> Self {
        Self {
            max_delta,
            last: None,
        }
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    /// Returns false when the driver was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.last.is_some() {
            return false;
        }
        self.last = Some(now);
        true
    }

    pub fn stop(&mut self) {
        self.last = None;
    }

    /// Runs `callback` with the clamped delta in seconds. Returns whether it ran.
    pub fn frame<F>(&mut self, now: Instant, callback: F) -> bool
    where
        F: FnOnce(f32),
    {
        let Some(last) = self.last else {
            return false;
        };
        let dt = clamp_frame_delta(now.saturating_duration_since(last), self.max_delta);
        self.last = Some(now);
        callback(dt.as_secs_f32());
        true
    }
}

pub(crate) fn clamp_frame_delta(raw_dt: Duration, max_delta: Duration) -> Duration {
    raw_dt.min(max_delta)
}
