//! Preset configuration for the equalizer
//!
//! A preset is a named settings bundle serialized as TOML. Presets are a
//! control-thread concern: the caller parses or renders them here and
//! pushes the result into the parameter store. Host-persisted plugin state
//! stays with the host.

use crate::domain::params::EqSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during preset operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid preset: {0}")]
    Invalid(String),
}

/// Named equalizer settings bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqPreset {
    pub name: String,
    #[serde(default)]
    pub settings: EqSettings,
}

impl EqPreset {
    pub fn new(name: impl Into<String>, settings: EqSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    /// Parse a preset from TOML, rejecting out-of-range settings
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let preset: EqPreset = toml::from_str(input)?;
        preset
            .settings
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        debug!("Loaded preset '{}'", preset.name);
        Ok(preset)
    }

    /// Render the preset as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for EqPreset {
    fn default() -> Self {
        Self::new("Default", EqSettings::default())
    }
}
