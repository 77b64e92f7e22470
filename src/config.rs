//! Configuration for the store, inference and attention components.
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [space]
//! max_atoms = 100000
//!
//! [pln]
//! max_steps = 1000
//!
//! [ure]
//! max_iter = 100
//! initial_complexity = 1.0
//! complexity_step = 0.1
//!
//! [ecan]
//! total_sti = 0
//! total_lti = 0
//! focus_size = 20
//! spread_mode = "broadcast"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attention::SpreadMode;
use crate::error::ValidationError;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Full configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CogConfig {
    /// Store settings.
    pub space: SpaceConfig,
    /// Forward/backward chaining settings.
    pub pln: PlnConfig,
    /// Rule-guided chaining settings.
    pub ure: UreConfig,
    /// Attention allocator settings.
    pub ecan: EcanConfig,
}

/// Store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Maximum number of live atoms; unbounded when `None`.
    pub max_atoms: Option<usize>,
}

/// Chaining settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlnConfig {
    /// Default round limit for forward and backward chaining.
    pub max_steps: usize,
}

impl Default for PlnConfig {
    fn default() -> Self {
        Self { max_steps: 1000 }
    }
}

/// Rule-guided chaining settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UreConfig {
    /// Iteration limit per run.
    pub max_iter: usize,
    /// Complexity penalty a new chainer starts with.
    pub initial_complexity: f32,
    /// Penalty added after every round that applied a rule.
    pub complexity_step: f32,
}

impl Default for UreConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            initial_complexity: 1.0,
            complexity_step: 0.1,
        }
    }
}

/// Attention allocator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcanConfig {
    /// Declared STI budget. Informational only.
    pub total_sti: i64,
    /// Declared LTI budget. Informational only.
    pub total_lti: i64,
    /// Maximum number of atoms in the attentional focus.
    pub focus_size: usize,
    /// How `spread` moves importance.
    pub spread_mode: SpreadMode,
}

impl Default for EcanConfig {
    fn default() -> Self {
        Self {
            total_sti: 0,
            total_lti: 0,
            focus_size: 20,
            spread_mode: SpreadMode::Broadcast,
        }
    }
}

impl CogConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `TomlParse` for syntax or type errors, `Validation` for bad values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Checks values that deserialize fine but make no sense.
    ///
    /// # Errors
    ///
    /// `OutOfRange` naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.ure.initial_complexity.is_finite() || self.ure.initial_complexity < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "ure.initial_complexity".to_string(),
                reason: format!("{} is not a finite, non-negative number", self.ure.initial_complexity),
            });
        }
        if !self.ure.complexity_step.is_finite() || self.ure.complexity_step < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "ure.complexity_step".to_string(),
                reason: format!("{} is not a finite, non-negative number", self.ure.complexity_step),
            });
        }
        if self.space.max_atoms == Some(0) {
            return Err(ValidationError::OutOfRange {
                field: "space.max_atoms".to_string(),
                reason: "a store must be able to hold at least one atom".to_string(),
            });
        }
        Ok(())
    }
}
