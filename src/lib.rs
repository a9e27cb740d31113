pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod logger;
pub mod pacing;
pub mod registry;
pub mod scene;
pub mod stats;
pub mod system;
pub mod systems;

pub use config::{ConfigLoader, LoopConfig};
pub use entity::{Component, Entity, EntityId, EntityStore, LifecycleListener, LifecycleState};
pub use error::{ConfigError, EngineError};
pub use game::{ExitHandle, Game};
pub use registry::{SystemHandle, SystemKind, SystemRegistry};
pub use scene::{Scene, SceneBuilder, SceneDescription, SceneLoader};
pub use stats::FrameStats;
pub use system::{FrameContext, System};
