use std::any::Any;
use std::sync::Arc;

use anyhow::Result;

use crate::entity::EntityStore;
use crate::game::ExitHandle;
use crate::registry::SystemRegistry;
use crate::scene::SceneLoader;

/// What a system sees while it is being updated.
pub struct FrameContext<'a> {
    pub(crate) frame: u64,
    pub(crate) registry: &'a SystemRegistry,
    pub(crate) entities: &'a Arc<EntityStore>,
    pub(crate) exit: &'a ExitHandle,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        frame: u64,
        registry: &'a SystemRegistry,
        entities: &'a Arc<EntityStore>,
        exit: &'a ExitHandle,
    ) -> Self {
        Self {
            frame,
            registry,
            entities,
            exit,
        }
    }

    /// 1-based number of the frame being dispatched.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &'a SystemRegistry {
        self.registry
    }

    pub fn entities(&self) -> &'a Arc<EntityStore> {
        self.entities
    }

    /// Stops the loop once the current frame has finished dispatching.
    pub fn exit(&self) {
        self.exit.exit();
    }
}

/// A per-frame update unit driven by the main loop.
pub trait System: Any {
    fn name(&self) -> &str;

    /// Advances the system by `delta_seconds` of scaled time. Zero is a valid delta.
    fn update(&mut self, ctx: &FrameContext<'_>, delta_seconds: f32) -> Result<()>;

    fn on_new_scene_loaded(&mut self) -> Result<()> {
        Ok(())
    }

    /// Exposes the scene loader side of a system registered as `dyn SceneLoader`.
    fn as_scene_loader(&mut self) -> Option<&mut dyn SceneLoader> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
