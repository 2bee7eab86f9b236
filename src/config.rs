use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;

/// Tunables shared by the compiler and the validator.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Canvas position given to the first block of a deserialized program.
    pub layout_origin: [f64; 2],
    /// Label shown in place of effect names while the registry is empty.
    pub placeholder_label: String,
    /// Run the legacy schema table alongside the registry-driven checks.
    pub legacy_checks: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            layout_origin: [20.0, 20.0],
            placeholder_label: "Effects not loaded".to_string(),
            legacy_checks: false,
        }
    }
}

impl CompilerConfig {
    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::JsonParseError(e.to_string()))
    }

    /// Loads a config from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}
