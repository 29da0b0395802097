//! Discovery document and discovery index models
//!
//! Only the parts the factory needs are modelled: identity, base URL and the
//! method tree. Parameter and schema definitions are kept as raw JSON and never
//! validated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Description of one version of one API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub root_url: String,
    #[serde(default)]
    pub service_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, MethodDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceDescriptor>,
}

/// A named group of methods, possibly nested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, MethodDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceDescriptor>,
}

/// One callable method of an API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_http_method")]
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_order: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, JsonValue>,
}

fn default_http_method() -> String {
    "GET".to_string()
}

impl ApiDescriptor {
    /// Minimal descriptor, mostly useful for in-process modules and tests
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: None,
            name: name.into(),
            version: version.into(),
            title: None,
            description: None,
            root_url: String::new(),
            service_path: String::new(),
            base_url: None,
            parameters: BTreeMap::new(),
            methods: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    pub fn from_value(value: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(base) if !base.is_empty() => base.clone(),
            _ => format!("{}{}", self.root_url, self.service_path),
        }
    }

    /// Find a method anywhere in the tree by its id (e.g. `drive.files.get`)
    pub fn find_method(&self, id: &str) -> Option<&MethodDescriptor> {
        self.methods
            .values()
            .find(|m| m.id == id)
            .or_else(|| self.resources.values().find_map(|r| r.find_method(id)))
    }

    /// All method ids, sorted
    pub fn method_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.methods.values().map(|m| m.id.clone()).collect();
        for resource in self.resources.values() {
            resource.collect_ids(&mut ids);
        }
        ids.sort();
        ids
    }
}

impl ResourceDescriptor {
    fn find_method(&self, id: &str) -> Option<&MethodDescriptor> {
        self.methods
            .values()
            .find(|m| m.id == id)
            .or_else(|| self.resources.values().find_map(|r| r.find_method(id)))
    }

    fn collect_ids(&self, ids: &mut Vec<String>) {
        ids.extend(self.methods.values().map(|m| m.id.clone()));
        for nested in self.resources.values() {
            nested.collect_ids(ids);
        }
    }
}

/// Discovery index listing every available API version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_version: Option<String>,
    #[serde(default)]
    pub items: Vec<DirectoryItem>,
}

/// One entry of a discovery index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryItem {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_rest_url: Option<String>,
    #[serde(default)]
    pub preferred: bool,
}

/// Parse document text as JSON or YAML.
///
/// `hint` is a file name, URL or content type; a `json` or `yaml` hint picks
/// the format, otherwise JSON is tried first and YAML second.
pub fn parse_document(content: &str, hint: &str) -> Result<JsonValue, String> {
    let hint = hint.to_ascii_lowercase();
    if hint.ends_with(".json") || hint.contains("application/json") {
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))
    } else if hint.ends_with(".yaml") || hint.ends_with(".yml") || hint.contains("yaml") {
        serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))
    } else {
        serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| format!("neither JSON nor YAML: {e}"))
    }
}
