use std::any::Any;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::{
    config::ConfigLoader,
    error::ConfigError,
    scene::{Scene, SceneLoader},
    system::{FrameContext, System},
};

/// Queues the next scene for the loop to load once the current frame has dispatched.
///
/// Register it with `register_as::<dyn SceneLoader, _>` so the loop finds it.
pub struct SceneLoaderSystem {
    loader: ConfigLoader,
    pending: Option<Box<dyn Scene>>,
    active: Option<String>,
    loads: u64,
}

impl SceneLoaderSystem {
    /// Scene files requested by path are resolved against `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            loader: ConfigLoader::new(base_dir),
            pending: None,
            active: None,
            loads: 0,
        }
    }

    /// Queues `scene`, replacing any scene queued earlier in the frame.
    pub fn request(&mut self, scene: impl Scene + 'static) {
        debug!(target: "framecore", scene = scene.name(), "scene requested");
        self.pending = Some(Box::new(scene));
    }

    /// Reads a scene description now and queues it.
    pub fn request_file(&mut self, file: impl AsRef<Path>) -> Result<(), ConfigError> {
        let scene = self.loader.load_scene(file)?;
        self.request(scene);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Name of the scene most recently handed to the loop.
    pub fn active_scene(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn loads(&self) -> u64 {
        self.loads
    }
}

impl SceneLoader for SceneLoaderSystem {
    fn take_pending_scene(&mut self) -> Option<Box<dyn Scene>> {
        let scene = self.pending.take()?;
        self.active = Some(scene.name().to_string());
        self.loads += 1;
        Some(scene)
    }
}

impl System for SceneLoaderSystem {
    fn name(&self) -> &str {
        "scene_loader"
    }

    fn update(&mut self, _ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        Ok(())
    }

    fn as_scene_loader(&mut self) -> Option<&mut dyn SceneLoader> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
