use std::any::Any;

use anyhow::Result;

use crate::system::{FrameContext, System};

/// Stops the loop after it has been updated a fixed number of times.
pub struct ExitAfterFramesSystem {
    remaining: u64,
}

impl ExitAfterFramesSystem {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl System for ExitAfterFramesSystem {
    fn name(&self) -> &str {
        "exit_after_frames"
    }

    fn update(&mut self, ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            ctx.exit();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
