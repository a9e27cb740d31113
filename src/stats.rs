use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

/// What happened during one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    /// Unscaled time since the previous frame boundary.
    pub delta: Duration,
    pub time_scale: f32,
    pub scaled_delta_seconds: f32,
    /// Entity destructions committed at the start of this frame.
    pub destroyed: usize,
    pub live_entities: usize,
    pub system_reports: Vec<SystemRunReport>,
    /// Time spent dispatching systems.
    pub duration: Duration,
}

/// Upper bound on the slots reserved up front; larger histories grow on demand.
const PREALLOCATED_FRAMES: usize = 1024;

/// Bounded history of recent frames.
#[derive(Debug)]
pub struct FrameHistory {
    frames: VecDeque<FrameStats>,
    capacity: usize,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity.min(PREALLOCATED_FRAMES)),
            capacity,
        }
    }

    pub fn push(&mut self, stats: FrameStats) {
        if self.capacity == 0 {
            return;
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(stats);
    }

    pub fn latest(&self) -> Option<&FrameStats> {
        self.frames.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameStats> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Mean unscaled frame delta over the retained history.
    pub fn average_delta(&self) -> Option<Duration> {
        if self.frames.is_empty() {
            return None;
        }
        let total: Duration = self.frames.iter().map(|stats| stats.delta).sum();
        Some(total / self.frames.len() as u32)
    }
}
