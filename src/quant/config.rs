//! Quantization config and lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::scheme::{ConfigGroup, QuantizationScheme};

/// Lifecycle status of an applied quantization config.
///
/// Transitions are monotonic except for repeated `Calibration` ↔ `Frozen`
/// toggles driven by observer-disable scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuantizationStatus {
    /// No schemes attached yet
    #[default]
    Uninitialized,
    /// Schemes attached, observers not yet collecting
    Initialized,
    /// Observers actively collecting statistics
    Calibration,
    /// Observers frozen; quantized forward emulation continues
    Frozen,
}

impl fmt::Display for QuantizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantizationStatus::Uninitialized => "uninitialized",
            QuantizationStatus::Initialized => "initialized",
            QuantizationStatus::Calibration => "calibration",
            QuantizationStatus::Frozen => "frozen",
        };
        write!(f, "{name}")
    }
}

/// Complete quantization configuration for one run.
///
/// Owned exclusively by one lifecycle modifier per run. `config_groups` keep
/// declaration order; the applier matches first-group-wins. `ignore` patterns
/// use the same syntax as scheme targets and always win over a target match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizationConfig {
    /// Named scheme groups in declaration order
    pub config_groups: Vec<ConfigGroup>,
    /// Patterns for modules that must never be quantized
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Current lifecycle status
    #[serde(default)]
    pub status: QuantizationStatus,
}

impl QuantizationConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self {
            config_groups: Vec::new(),
            ignore: Vec::new(),
            status: QuantizationStatus::default(),
        }
    }

    /// Add a named config group.
    pub fn with_group(mut self, name: impl Into<String>, scheme: QuantizationScheme) -> Self {
        self.config_groups.push(ConfigGroup::new(name, scheme));
        self
    }

    /// Add an ignore pattern.
    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }

    /// Set the lifecycle status.
    pub fn with_status(mut self, status: QuantizationStatus) -> Self {
        self.status = status;
        self
    }

    /// Parse a config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize the config to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self::new()
    }
}
