//! The main loop driver
//!
//! A frame is: pacing wait, commit of pending entity destructions, one
//! scaled delta computation, then `update` on every registered system in
//! registration order. A scene queued by the `dyn SceneLoader` system is
//! loaded once dispatch has finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace};

use crate::{
    config::LoopConfig,
    entity::{Entity, EntityId, EntityStore},
    error::EngineError,
    pacing::{frame_budget, frame_period, FramePacer, SpinYieldPacer},
    registry::{SystemHandle, SystemKind, SystemRegistry},
    scene::{Scene, SceneBuilder, SceneLoader},
    stats::{FrameHistory, FrameStats, SystemRunReport},
    system::{FrameContext, System},
    systems::{EntityQuerySystem, TimeControlSystem},
};

/// Cooperative stop flag for the loop. Cheap to clone and usable from any thread.
#[derive(Clone, Debug, Default)]
pub struct ExitHandle {
    running: Arc<AtomicBool>,
}

impl ExitHandle {
    /// Requests the loop to stop after the frame in flight.
    pub fn exit(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn start(&self) {
        self.running.store(true, Ordering::Release);
    }
}

fn check_framerate(framerate: f64) -> Result<f64, EngineError> {
    if frame_period(framerate).is_some() {
        Ok(framerate)
    } else {
        Err(EngineError::InvalidFramerate(framerate))
    }
}

/// Owns the systems and the entity set, and drives them frame by frame.
pub struct Game {
    registry: SystemRegistry,
    entities: Arc<EntityStore>,
    exit: ExitHandle,
    pacer: Box<dyn FramePacer>,
    desired_framerate: f64,
    limit_frame_rate: bool,
    frame: u64,
    history: FrameHistory,
}

impl Game {
    /// Builds a loop paced by the real clock.
    pub fn new(config: &LoopConfig) -> Result<Self, EngineError> {
        Self::with_pacer(config, Box::new(SpinYieldPacer::new()))
    }

    /// Builds a loop that measures frames with a custom pacer.
    ///
    /// The time controller and the entity query system are registered first,
    /// in that order.
    pub fn with_pacer(config: &LoopConfig, pacer: Box<dyn FramePacer>) -> Result<Self, EngineError> {
        let desired_framerate = check_framerate(config.desired_framerate)?;
        let entities = Arc::new(EntityStore::new());

        let mut registry = SystemRegistry::new();
        registry.register(TimeControlSystem::with_default_time_scale(
            config.default_time_scale,
        )?);
        registry.register(EntityQuerySystem::new(Arc::clone(&entities)));

        Ok(Self {
            registry,
            entities,
            exit: ExitHandle::default(),
            pacer,
            desired_framerate,
            limit_frame_rate: config.limit_frame_rate,
            frame: 0,
            history: FrameHistory::new(config.stats_history),
        })
    }

    /// Runs frames until [`Game::exit`] is called or a system fails.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.exit.start();
        info!(
            target: "framecore",
            systems = self.registry.len(),
            framerate = self.desired_framerate,
            limited = self.limit_frame_rate,
            "main loop started"
        );
        while self.exit.is_running() {
            self.step_or_stop()?;
        }
        info!(target: "framecore", frames = self.frame, "main loop stopped");
        Ok(())
    }

    /// Runs at most `frames` frames, stopping early on exit. Returns the number run.
    pub fn run_frames(&mut self, frames: u64) -> Result<u64, EngineError> {
        self.exit.start();
        let mut ran = 0;
        while ran < frames && self.exit.is_running() {
            self.step_or_stop()?;
            ran += 1;
        }
        self.exit.exit();
        Ok(ran)
    }

    fn step_or_stop(&mut self) -> Result<FrameStats, EngineError> {
        self.step().map_err(|err| {
            self.exit.exit();
            error!(target: "framecore", frame = self.frame, error = %err, "frame aborted");
            err
        })
    }

    /// Runs exactly one frame.
    pub fn step(&mut self) -> Result<FrameStats, EngineError> {
        let budget = frame_budget(self.desired_framerate, self.limit_frame_rate);
        let delta = self.pacer.wait_for_next_frame(budget);

        let destroyed = self.entities.flush_pending_destroys();

        let time_scale = self.time_scale();
        let scaled_delta_seconds = delta.as_secs_f32() * time_scale;

        self.frame += 1;
        trace!(
            target: "framecore",
            frame = self.frame,
            delta_ms = delta.as_secs_f64() * 1_000.0,
            time_scale,
            "frame"
        );

        let dispatch_start = Instant::now();
        let ctx = FrameContext::new(self.frame, &self.registry, &self.entities, &self.exit);
        let mut system_reports = Vec::with_capacity(self.registry.len());
        for (kind, handle) in self.registry.systems() {
            let mut system = handle.try_borrow_mut().map_err(|_| EngineError::SystemBusy {
                system: kind.name().to_string(),
            })?;
            let name = system.name().to_string();
            let start = Instant::now();
            if let Err(source) = system.update(&ctx, scaled_delta_seconds) {
                return Err(EngineError::SystemFailed {
                    system: name,
                    source,
                });
            }
            system_reports.push(SystemRunReport {
                name,
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }
        self.load_pending_scene()?;

        let stats = FrameStats {
            frame: self.frame,
            delta,
            time_scale,
            scaled_delta_seconds,
            destroyed,
            live_entities: self.entities.live_count(),
            system_reports,
            duration: dispatch_start.elapsed(),
        };
        self.history.push(stats.clone());
        Ok(stats)
    }

    /// Stops the loop after the frame in flight. Ignored when the loop is not running.
    pub fn exit(&self) {
        self.exit.exit();
    }

    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    pub fn is_running(&self) -> bool {
        self.exit.is_running()
    }

    /// Restarts frame timing so the next frame does not report time spent
    /// in a long blocking operation such as a scene load.
    pub fn reset_delta_time(&mut self) {
        debug!(target: "framecore", "delta time reset");
        self.pacer.reset();
    }

    /// Calls `on_new_scene_loaded` on every system in registration order.
    pub fn notify_new_scene_loaded(&mut self) -> Result<(), EngineError> {
        for (kind, handle) in self.registry.systems() {
            let mut system = handle.try_borrow_mut().map_err(|_| EngineError::SystemBusy {
                system: kind.name().to_string(),
            })?;
            if let Err(source) = system.on_new_scene_loaded() {
                return Err(EngineError::SystemFailed {
                    system: system.name().to_string(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Replaces the active scene.
    ///
    /// The scene is staged first; if staging fails the live set is left as it
    /// was. Otherwise every live entity is marked for destruction (committed
    /// at the next frame's commit point), the staged entities are constructed,
    /// systems are told a new scene is loaded and frame timing is reset.
    pub fn load_scene(&mut self, scene: &dyn Scene) -> Result<(), EngineError> {
        let mut staged = SceneBuilder::new();
        scene
            .populate(&mut staged)
            .map_err(|source| EngineError::SceneLoad {
                scene: scene.name().to_string(),
                source,
            })?;

        let retired = self.entities.request_destroy_all();
        let constructed = staged.commit(&self.entities).len();
        self.notify_new_scene_loaded()?;
        self.reset_delta_time();
        info!(
            target: "framecore",
            scene = scene.name(),
            retired,
            constructed,
            "scene loaded"
        );
        Ok(())
    }

    /// Loads the scene queued by the system registered as `dyn SceneLoader`.
    ///
    /// Returns whether a scene was loaded.
    pub fn load_pending_scene(&mut self) -> Result<bool, EngineError> {
        let Some(handle) = self.registry.get_kind::<dyn SceneLoader>() else {
            return Ok(false);
        };
        let pending = match handle.try_borrow_mut() {
            Ok(mut system) => system
                .as_scene_loader()
                .and_then(|loader| loader.take_pending_scene()),
            Err(_) => {
                return Err(EngineError::SystemBusy {
                    system: SystemKind::of::<dyn SceneLoader>().name().to_string(),
                })
            }
        };
        match pending {
            Some(scene) => {
                self.load_scene(scene.as_ref())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Constructs an entity; systems see it from the next frame.
    pub fn construct_entity(&self, name: impl Into<String>) -> Arc<Entity> {
        self.entities.construct(name)
    }

    /// Marks a live entity for destruction at the next commit point.
    pub fn request_destroy(&self, id: EntityId) -> bool {
        self.entities.request_destroy(id)
    }

    pub fn entities(&self) -> &Arc<EntityStore> {
        &self.entities
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SystemRegistry {
        &mut self.registry
    }

    /// Registers `system` under its own type.
    pub fn register<S: System>(&mut self, system: S) -> Option<SystemHandle> {
        self.registry.register(system)
    }

    /// Registers `system` under kind `K`, replacing any instance already held for `K`.
    pub fn register_as<K, S>(&mut self, system: S) -> Option<SystemHandle>
    where
        K: ?Sized + 'static,
        S: System,
    {
        self.registry.register_as::<K, S>(system)
    }

    /// Current time scale; 1.0 when no time controller is registered.
    pub fn time_scale(&self) -> f32 {
        self.registry
            .get::<TimeControlSystem>()
            .map(|time| time.time_scale())
            .unwrap_or(1.0)
    }

    /// Sets the time scale through the time controller, registering one if needed.
    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), EngineError> {
        if let Some(mut time) = self.registry.get_mut::<TimeControlSystem>() {
            return time.set_time_scale(scale);
        }
        let mut time = TimeControlSystem::new();
        time.set_time_scale(scale)?;
        self.registry.register(time);
        Ok(())
    }

    pub fn desired_framerate(&self) -> f64 {
        self.desired_framerate
    }

    pub fn set_desired_framerate(&mut self, framerate: f64) -> Result<(), EngineError> {
        self.desired_framerate = check_framerate(framerate)?;
        Ok(())
    }

    pub fn limit_frame_rate(&self) -> bool {
        self.limit_frame_rate
    }

    pub fn set_limit_frame_rate(&mut self, limit: bool) {
        self.limit_frame_rate = limit;
    }

    /// Frames dispatched so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn recent_stats(&self) -> &FrameHistory {
        &self.history
    }

    pub fn average_frame_time(&self) -> Option<Duration> {
        self.history.average_delta()
    }
}
