//! # Engine Configuration
//!
//! Loaded once at startup, from TOML or defaults. Nothing here is
//! consulted per frame.

use phosphor_rendering::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, EngineResult};

/// Configuration for the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of in-flight frame packets (2 = classic double buffer).
    pub slots: usize,
    /// Target frames per second for the simulation loop; 0 = unpaced.
    pub target_fps: u32,
    /// Pass index whose camera drives packet snapshots.
    pub primary_pass: u32,
    /// Capacity of the render→simulation stats channel.
    pub stats_channel_capacity: usize,
    /// Opaque resource ids for the deferred pass sequence.
    pub pipeline: PipelineConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slots: 2,
            target_fps: 60,
            primary_pass: 0,
            stats_channel_capacity: 256,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing fields fall back to defaults, so a partial file is valid.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.slots, 2);
        assert_eq!(config.primary_pass, 0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            target_fps = 120

            [pipeline]
            quad_mesh = 9
            "#,
        )
        .unwrap();

        assert_eq!(config.target_fps, 120);
        assert_eq!(config.slots, 2);
        assert_eq!(config.pipeline.quad_mesh, 9);
        assert_eq!(
            config.pipeline.light_material,
            PipelineConfig::default().light_material
        );
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("slots = \"two\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig {
            target_fps: 144,
            ..EngineConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
