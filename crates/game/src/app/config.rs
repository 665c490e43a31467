use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{LoopConfig, WorldConfig};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "PLANETFALL_CONFIG";
pub(crate) const SEED_ENV_VAR: &str = "PLANETFALL_SEED";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowSettings {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        let defaults = LoopConfig::default();
        Self {
            title: defaults.window_title,
            width: defaults.window_width,
            height: defaults.window_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoopSettings {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval_ms: u64,
    pub(crate) max_render_fps: Option<u32>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        let defaults = LoopConfig::default();
        Self {
            target_tps: defaults.target_tps,
            max_frame_delta_ms: defaults.max_frame_delta.as_millis() as u64,
            max_ticks_per_frame: defaults.max_ticks_per_frame,
            metrics_log_interval_ms: defaults.metrics_log_interval.as_millis() as u64,
            max_render_fps: defaults.max_render_fps,
        }
    }
}

/// Everything the binary can be configured with. Every section and field
/// is optional; missing values fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window: WindowSettings,
    #[serde(rename = "loop")]
    pub(crate) loop_settings: LoopSettings,
    pub(crate) world: WorldConfig,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}' at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value at {location}: {message}")]
    Invalid { location: String, message: String },
    #[error("{var} must be an unsigned integer (decimal or 0x-prefixed hex), got '{value}'")]
    InvalidSeed { var: &'static str, value: String },
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
}

impl GameConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            target_tps: self.loop_settings.target_tps,
            max_frame_delta: Duration::from_millis(self.loop_settings.max_frame_delta_ms),
            max_ticks_per_frame: self.loop_settings.max_ticks_per_frame,
            metrics_log_interval: Duration::from_millis(self.loop_settings.metrics_log_interval_ms),
            max_render_fps: self.loop_settings.max_render_fps,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(
                "window",
                format!(
                    "window size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }
        if self.loop_settings.target_tps == 0 {
            return Err(invalid("loop.target_tps", "must be at least 1"));
        }
        for (location, value) in [
            ("world.speed_scale", self.world.speed_scale),
            ("world.size_scale", self.world.size_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(
                    location,
                    format!("must be a positive finite number, got {value}"),
                ));
            }
        }
        self.world
            .generation
            .validate(self.world.width, self.world.height)
            .map_err(|error| invalid("world", error.to_string()))
    }
}

fn invalid(location: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        location: location.to_string(),
        message: message.into(),
    }
}

/// Reads the config file named by `PLANETFALL_CONFIG` (defaults when unset)
/// and applies the `PLANETFALL_SEED` override.
pub(crate) fn resolve_config() -> Result<GameConfig, ConfigError> {
    let config_path = read_env(CONFIG_ENV_VAR)?;
    let seed = read_env(SEED_ENV_VAR)?;
    resolve_config_from(config_path.as_deref().map(Path::new), seed.as_deref())
}

pub(crate) fn resolve_config_from(
    config_path: Option<&Path>,
    seed_override: Option<&str>,
) -> Result<GameConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => load_config_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(raw) = seed_override {
        config.world.generation.seed = parse_seed(raw)?;
    }
    config.validate()?;
    Ok(config)
}

pub(crate) fn load_config_file(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        let location = if location.is_empty() || location == "." {
            "<root>".to_string()
        } else {
            location
        };
        ConfigError::Parse {
            path: path.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}

pub(crate) fn parse_seed(raw: &str) -> Result<u64, ConfigError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidSeed {
        var: SEED_ENV_VAR,
        value: raw.to_string(),
    })
}

fn read_env(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { var, source }),
    }
}
