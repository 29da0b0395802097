//! File-based discovery document loader
//!
//! This loader handles only file I/O and format detection. Turning the
//! document into a descriptor is left to the discovery client.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::fs;

use super::DocumentLoader;
use crate::descriptor::parse_document;
use crate::error::DiscoveryError;

/// Loads discovery documents from local files
#[derive(Debug, Clone, Default)]
pub struct FileDocumentLoader;

impl FileDocumentLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for FileDocumentLoader {
    async fn load(&self, source: &str) -> Result<JsonValue, DiscoveryError> {
        let content = fs::read_to_string(source)
            .await
            .map_err(|source_err| DiscoveryError::Io {
                path: PathBuf::from(source),
                source: source_err,
            })?;

        parse_document(&content, source).map_err(|message| DiscoveryError::Parse {
            source_name: source.to_string(),
            message,
        })
    }
}
