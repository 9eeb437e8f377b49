use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static POISON_REPORTED: AtomicBool = AtomicBool::new(false);

/// Recovers the guard from a poisoned lock. Only the first recovery is logged.
fn recover<G>(poisoned: PoisonError<G>, operation: &'static str) -> G {
    if !POISON_REPORTED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
    poisoned.into_inner()
}

/// Averages over the last completed metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub slowest_frame_ms: f32,
    /// Entities alive in the scene when the interval closed.
    pub entity_count: usize,
}

/// Shared read side of the loop metrics; scenes and HUDs poll it every frame.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(|poisoned| recover(poisoned, "read"))
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self
            .latest
            .write()
            .unwrap_or_else(|poisoned| recover(poisoned, "write")) = snapshot;
    }
}

/// Frame timings gathered over one reporting interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    opened_at: Instant,
    length: Duration,
    frames: u32,
    total: Duration,
    slowest: Duration,
    entities: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(length: Duration, now: Instant) -> Self {
        Self {
            opened_at: now,
            length,
            frames: 0,
            total: Duration::ZERO,
            slowest: Duration::ZERO,
            entities: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, wall_dt: Duration, entity_count: usize) {
        self.frames = self.frames.saturating_add(1);
        self.total = self.total.saturating_add(wall_dt);
        self.slowest = self.slowest.max(wall_dt);
        self.entities = entity_count;
    }

    /// Closes the interval once it has elapsed and opens the next one at `now`.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.length {
            return None;
        }

        let frames = self.frames as f32;
        let snapshot = LoopMetricsSnapshot {
            fps: frames / elapsed.as_secs_f32().max(f32::EPSILON),
            frame_time_ms: if self.frames == 0 {
                0.0
            } else {
                self.total.as_secs_f32() * 1000.0 / frames
            },
            slowest_frame_ms: self.slowest.as_secs_f32() * 1000.0,
            entity_count: self.entities,
        };
        *self = Self {
            entities: self.entities,
            ..Self::new(self.length, now)
        };
        Some(snapshot)
    }
}
