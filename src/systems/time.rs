use std::any::Any;

use anyhow::Result;

use crate::{
    error::EngineError,
    system::{FrameContext, System},
};

/// Holds the multiplier applied to every frame's delta time.
///
/// The loop reads [`TimeControlSystem::time_scale`] once per frame, before
/// dispatching, so a change made during a frame applies from the next one.
pub struct TimeControlSystem {
    time_scale: f32,
    default_time_scale: f32,
}

fn check_scale(scale: f32) -> Result<f32, EngineError> {
    if scale.is_finite() && scale >= 0.0 {
        Ok(scale)
    } else {
        Err(EngineError::InvalidTimeScale(scale))
    }
}

impl TimeControlSystem {
    pub fn new() -> Self {
        Self {
            time_scale: 1.0,
            default_time_scale: 1.0,
        }
    }

    pub fn with_default_time_scale(scale: f32) -> Result<Self, EngineError> {
        let scale = check_scale(scale)?;
        Ok(Self {
            time_scale: scale,
            default_time_scale: scale,
        })
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Sets the current scale. Zero freezes simulation time; negative or
    /// non-finite values are rejected.
    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), EngineError> {
        self.time_scale = check_scale(scale)?;
        Ok(())
    }

    pub fn default_time_scale(&self) -> f32 {
        self.default_time_scale
    }

    pub fn set_default_time_scale(&mut self, scale: f32) -> Result<(), EngineError> {
        self.default_time_scale = check_scale(scale)?;
        Ok(())
    }
}

impl Default for TimeControlSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TimeControlSystem {
    fn name(&self) -> &str {
        "time_control"
    }

    fn update(&mut self, _ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        Ok(())
    }

    fn on_new_scene_loaded(&mut self) -> Result<()> {
        self.time_scale = self.default_time_scale;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
