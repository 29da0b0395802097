//! Registry configuration
//!
//! Options are stored on the registry exactly as given. The registry itself
//! only reads `apis_dir` (a directory replacing the API documents compiled
//! into the binary) and `discovery` (HTTP client settings); everything else is
//! carried along untouched in `extra` for collaborators that want it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{FactoryError, Result};

/// Default HTTP timeout for discovery requests
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 30;

/// Options a registry is created with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Directory overriding the embedded API documents (`<dir>/<api>/<version>.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apis_dir: Option<PathBuf>,
    pub discovery: DiscoveryConfig,
    /// Any other settings, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apis_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.apis_dir = Some(dir.into());
        self
    }

    /// Directory bundled documents are read from; `None` means the embedded set
    pub fn apis_dir(&self) -> Option<&Path> {
        self.apis_dir.as_deref()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| FactoryError::config(format!("invalid TOML: {e}")))
    }

    /// Load options from a `.toml`, `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FactoryError::config(format!("cannot read {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| FactoryError::config(format!("invalid YAML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| FactoryError::config(format!("invalid JSON: {e}"))),
            _ => Err(FactoryError::config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }
}

/// HTTP settings for the default discovery client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
        })
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}
