use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the main loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A system returned an error from `update` or `on_new_scene_loaded`.
    #[error("system '{system}' failed: {source}")]
    SystemFailed {
        system: String,
        #[source]
        source: anyhow::Error,
    },
    /// A system handle was still borrowed when the loop tried to dispatch to it.
    #[error("system '{system}' is already borrowed")]
    SystemBusy { system: String },
    #[error("desired framerate {0} does not give a valid frame time")]
    InvalidFramerate(f64),
    #[error("time scale must be finite and non-negative, got {0}")]
    InvalidTimeScale(f32),
    #[error("failed to load scene '{scene}': {source}")]
    SceneLoad {
        scene: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config validation error: {0}")]
    Validation(String),
}
