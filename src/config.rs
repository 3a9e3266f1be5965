//! Host Configuration
//!
//! Defaults reproduce the device build. A host may layer a JSON file and
//! then `EDGEAI_*` environment variables on top. The simulation and
//! inference modules only ever see the resolved values.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::npu::{BackendKind, NpuConfig};
use crate::sim::input::DEFAULT_ACCEL_MAP_DENOM;
use crate::sim::state::SimParams;

/// Enables the inference gate (`1`/`true`/`yes` or `0`/`false`/`no`).
pub const ENV_ENABLE_INFERENCE: &str = "EDGEAI_ENABLE_NPU_INFERENCE";

/// Backend selection (`stub`, `neutron`, `0`, `1`).
pub const ENV_BACKEND: &str = "EDGEAI_NPU_BACKEND";

/// Accelerometer counts per 1g.
pub const ENV_ACCEL_MAP_DENOM: &str = "EDGEAI_ACCEL_MAP_DENOM";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment override did not parse
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Arena bounds are inverted on some axis
    #[error("arena bounds inverted: x [{min_x}, {max_x}], y [{min_y}, {max_y}]")]
    InvalidBounds {
        /// Left edge
        min_x: i32,
        /// Right edge
        max_x: i32,
        /// Top edge
        min_y: i32,
        /// Bottom edge
        max_y: i32,
    },

    /// Damping outside (0, 1.0]
    #[error("damping must be in (0, 65536], got {0}")]
    InvalidDamping(i32),

    /// Display size must be positive
    #[error("display size must be positive, got {width}x{height}")]
    InvalidDisplay {
        /// Width in pixels
        width: u16,
        /// Height in pixels
        height: u16,
    },
}

/// Display and sensor settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Accelerometer counts per 1g
    pub accel_map_denom: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: crate::LCD_WIDTH as u16,
            height: crate::LCD_HEIGHT as u16,
            accel_map_denom: DEFAULT_ACCEL_MAP_DENOM,
        }
    }
}

/// Everything the host needs to start a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeAiConfig {
    /// Display and sensor
    pub display: DisplayConfig,
    /// Physics tuning
    pub sim: SimParams,
    /// Inference layer
    pub npu: NpuConfig,
}

impl EdgeAiConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `EDGEAI_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ENABLE_INFERENCE) {
            self.npu.inference_enabled = parse_flag(&value)
                .ok_or(ConfigError::InvalidEnv { var: ENV_ENABLE_INFERENCE, value })?;
        }
        if let Some(value) = lookup(ENV_BACKEND) {
            self.npu.backend = value
                .parse::<BackendKind>()
                .map_err(|_| ConfigError::InvalidEnv { var: ENV_BACKEND, value })?;
        }
        if let Some(value) = lookup(ENV_ACCEL_MAP_DENOM) {
            self.display.accel_map_denom = value
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidEnv { var: ENV_ACCEL_MAP_DENOM, value })?;
        }
        Ok(())
    }

    /// Check the invariants the physics step relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.display;
        if d.width == 0 || d.height == 0 {
            return Err(ConfigError::InvalidDisplay { width: d.width, height: d.height });
        }
        let b = &self.sim.bounds;
        if !b.is_valid() {
            return Err(ConfigError::InvalidBounds {
                min_x: b.min_x,
                max_x: b.max_x,
                min_y: b.min_y,
                max_y: b.max_y,
            });
        }
        if !self.sim.damping_is_valid() {
            return Err(ConfigError::InvalidDamping(self.sim.damp_q16));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
