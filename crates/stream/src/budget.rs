use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Frame budget configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Upper bound on redraw rate while the view is static.
    pub target_fps: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

impl FrameSettings {
    /// Minimum time between two idle frames. A zero fps is treated as one.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }
}

/// What the scheduler decided for a frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    Draw,
    Skip,
}

/// Dirty-flag redraw gate.
///
/// Idle and inside the frame interval: skip without touching state.
/// Dirty, or the interval elapsed: draw, stamp the time, go idle.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_interval: Duration,
    dirty: bool,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    /// A new scheduler starts dirty so the first request always draws.
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            frame_interval: settings.frame_interval(),
            dirty: true,
            last_frame: None,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_frame(&self) -> Option<Instant> {
        self.last_frame
    }

    /// Decision for a request at `now`, without committing it.
    pub fn decide(&self, now: Instant) -> FrameDecision {
        let throttled = !self.dirty
            && self
                .last_frame
                .is_some_and(|last| now.saturating_duration_since(last) < self.frame_interval);
        if throttled {
            FrameDecision::Skip
        } else {
            FrameDecision::Draw
        }
    }

    /// Decide and, on `Draw`, record the frame and clear the dirty flag.
    pub fn begin_frame(&mut self, now: Instant) -> FrameDecision {
        let decision = self.decide(now);
        if decision == FrameDecision::Draw {
            self.last_frame = Some(now);
            self.dirty = false;
        }
        decision
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(FrameSettings::default())
    }
}

/// Ring buffer of recent frame-to-frame intervals.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: Vec<Duration>,
    next: usize,
    len: usize,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            len: 0,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.next] = dt;
        self.next = (self.next + 1) % self.history.len();
        self.len = (self.len + 1).min(self.history.len());
    }

    fn samples(&self) -> &[Duration] {
        // Until the buffer wraps, the filled samples are a prefix.
        &self.history[..self.len]
    }

    pub fn average(&self) -> Duration {
        if self.len == 0 {
            return Duration::ZERO;
        }
        self.samples().iter().sum::<Duration>() / self.len as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.samples().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second implied by the average interval, 0 with no samples.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        self.len
    }
}
