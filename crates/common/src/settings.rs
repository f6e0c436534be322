//! Generator settings loaded from an optional YAML file
//!
//! Every key has a default, so an empty file (or no file at all) yields the
//! settings used for the Nutanix provider.

use crate::{CodegenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables shared by the extraction and generation stages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Token an owning type name must contain (case-folded) to be an API type
    pub api_suffix: String,
    /// Prefix of generated data source names (e.g., "nutanix")
    pub provider_prefix: String,
    /// Go module path of the provider consuming the generated code
    pub provider_module: String,
    /// Port configured on the generated transport client
    pub transport_port: u16,
    /// Layout used when flattening `time.Time` values
    pub time_layout: String,
    /// External formatter executable
    pub gofmt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_suffix: "api".to_string(),
            provider_prefix: "nutanix".to_string(),
            provider_module: "github.com/terraform-providers/terraform-provider-nutanix"
                .to_string(),
            transport_port: 9440,
            time_layout: "2006-01-02T15:04:05Z07:00".to_string(),
            gofmt: "gofmt".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text; missing keys take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| {
            CodegenError::Serialization(format!("Failed to parse settings YAML: {}", e))
        })
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
