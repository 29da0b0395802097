//! Version selectors and client options
//!
//! An API is asked for a client with either a bare version string (`"v3"`) or
//! an options object carrying a `version` field next to arbitrary client
//! configuration. Both shapes are normalized into a [`Selection`] before they
//! reach the factory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{FactoryError, ResolveError, Result};

/// Option key that carries the version inside an options object
pub const VERSION_KEY: &str = "version";

/// Option key that overrides the API root URL
pub const ROOT_URL_KEY: &str = "rootUrl";

/// Option key that holds default request parameters
pub const PARAMS_KEY: &str = "params";

/// Free-form client configuration passed to an endpoint module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOptions(Map<String, JsonValue>);

impl ClientOptions {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Root URL override, if one was supplied as a string
    pub fn root_url(&self) -> Option<&str> {
        self.0.get(ROOT_URL_KEY).and_then(JsonValue::as_str)
    }

    /// Default request parameters, if supplied as an object
    pub fn params(&self) -> Option<&Map<String, JsonValue>> {
        self.0.get(PARAMS_KEY).and_then(JsonValue::as_object)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.0
    }
}

impl From<Map<String, JsonValue>> for ClientOptions {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// The two accepted shapes of a version request
#[derive(Debug, Clone, PartialEq)]
pub enum VersionSelector {
    /// Bare version identifier, no extra configuration
    Version(String),
    /// Options object; its `version` entry names the version
    Options(ClientOptions),
}

impl VersionSelector {
    /// Accept an untyped value at the boundary.
    ///
    /// Strings and objects are accepted; every other JSON kind is an
    /// argument error.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(version) => Ok(Self::Version(version)),
            JsonValue::Object(map) => Ok(Self::Options(ClientOptions(map))),
            other => Err(FactoryError::Argument {
                found: json_kind(&other),
            }),
        }
    }

    /// Version as the caller wrote it, for error reporting
    pub fn requested_version(&self) -> String {
        match self {
            Self::Version(version) => version.clone(),
            Self::Options(options) => match options.get(VERSION_KEY) {
                Some(JsonValue::String(version)) => version.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        }
    }

    /// Split the selector into a version and the remaining configuration.
    ///
    /// The `version` key never reaches the endpoint module.
    pub fn normalize(self) -> std::result::Result<Selection, ResolveError> {
        match self {
            Self::Version(version) => Ok(Selection {
                version,
                options: ClientOptions::new(),
            }),
            Self::Options(mut options) => match options.remove(VERSION_KEY) {
                Some(JsonValue::String(version)) => Ok(Selection { version, options }),
                Some(other) => Err(ResolveError::InvalidVersion(other.to_string())),
                None => Err(ResolveError::MissingVersion),
            },
        }
    }
}

impl From<&str> for VersionSelector {
    fn from(version: &str) -> Self {
        Self::Version(version.to_string())
    }
}

impl From<String> for VersionSelector {
    fn from(version: String) -> Self {
        Self::Version(version)
    }
}

impl From<ClientOptions> for VersionSelector {
    fn from(options: ClientOptions) -> Self {
        Self::Options(options)
    }
}

impl TryFrom<JsonValue> for VersionSelector {
    type Error = FactoryError;

    fn try_from(value: JsonValue) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Canonical form of a selector: a version plus configuration without it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub version: String,
    pub options: ClientOptions,
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
