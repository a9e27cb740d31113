use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pacing::frame_period;
use crate::scene::SceneDescription;

fn default_desired_framerate() -> f64 {
    60.0
}

fn default_limit_frame_rate() -> bool {
    true
}

fn default_stats_history() -> usize {
    100
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Startup settings for the main loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "default_desired_framerate")]
    pub desired_framerate: f64,
    #[serde(default = "default_limit_frame_rate")]
    pub limit_frame_rate: bool,
    /// Number of recent frames kept for statistics.
    #[serde(default = "default_stats_history")]
    pub stats_history: usize,
    /// Scale restored by the time controller whenever a new scene is loaded.
    #[serde(default = "default_time_scale")]
    pub default_time_scale: f32,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            desired_framerate: default_desired_framerate(),
            limit_frame_rate: default_limit_frame_rate(),
            stats_history: default_stats_history(),
            default_time_scale: default_time_scale(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LoopConfig {
    pub fn with_desired_framerate(mut self, framerate: f64) -> Self {
        self.desired_framerate = framerate;
        self
    }

    pub fn with_limit_frame_rate(mut self, limit: bool) -> Self {
        self.limit_frame_rate = limit;
        self
    }

    pub fn with_default_time_scale(mut self, scale: f32) -> Self {
        self.default_time_scale = scale;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if frame_period(self.desired_framerate).is_none() {
            return Err(ConfigError::Validation(format!(
                "desired_framerate must be positive with a representable frame time, got {}",
                self.desired_framerate
            )));
        }
        if !self.default_time_scale.is_finite() || self.default_time_scale < 0.0 {
            return Err(ConfigError::Validation(format!(
                "default_time_scale must be non-negative, got {}",
                self.default_time_scale
            )));
        }
        Ok(())
    }
}

/// Reads loop configs and scene descriptions relative to a base directory.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load_config(&self, file: impl AsRef<Path>) -> Result<LoopConfig, ConfigError> {
        let config: LoopConfig = self.read_yaml(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_scene(&self, file: impl AsRef<Path>) -> Result<SceneDescription, ConfigError> {
        self.read_yaml(file)
    }

    fn read_yaml<T: for<'de> Deserialize<'de>>(
        &self,
        file: impl AsRef<Path>,
    ) -> Result<T, ConfigError> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse { path, source })
    }
}
