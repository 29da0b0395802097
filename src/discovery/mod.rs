//! Discovery of API descriptions at runtime
//!
//! A [`DiscoveryClient`] turns a discovery index into a catalog of loaders, or
//! a single discovery document into an endpoint module. The default
//! [`Discovery`] client reads documents from local files or over HTTP(S),
//! picking the loader from the shape of the source.

pub mod file_loader;
pub mod http_loader;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value as JsonValue;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::descriptor::{ApiDescriptor, DirectoryList};
use crate::endpoint::{DescriptorModule, EndpointModule};
use crate::error::DiscoveryError;
use crate::resolver::{ApiCatalog, ApiLoader, VersionedModules};

pub use file_loader::FileDocumentLoader;
pub use http_loader::HttpDocumentLoader;

/// Resolves discovery indexes and documents
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Resolve every API listed at `url` into name → loader pairs
    async fn resolve_index(&self, url: &str) -> Result<ApiCatalog, DiscoveryError>;

    /// Resolve one discovery document (local path or URL) into a module
    async fn resolve_document(
        &self,
        path_or_url: &str,
    ) -> Result<Arc<dyn EndpointModule>, DiscoveryError>;
}

/// Fetches a raw document from a source
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<JsonValue, DiscoveryError>;
}

pub(crate) fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Resolve a document reference found in an index located at `base`
pub fn resolve_reference(base: &str, reference: &str) -> Result<String, DiscoveryError> {
    if is_remote(reference) || Path::new(reference).is_absolute() {
        return Ok(reference.to_string());
    }
    if is_remote(base) {
        let base_url = Url::parse(base).map_err(|e| DiscoveryError::InvalidIndex {
            source_name: base.to_string(),
            message: format!("invalid index URL: {e}"),
        })?;
        let joined = base_url
            .join(reference)
            .map_err(|e| DiscoveryError::InvalidIndex {
                source_name: base.to_string(),
                message: format!("invalid document reference {reference}: {e}"),
            })?;
        return Ok(joined.to_string());
    }
    let dir = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(reference).to_string_lossy().into_owned())
}

/// Default discovery client over files and HTTP(S)
#[derive(Debug, Clone)]
pub struct Discovery {
    http: HttpDocumentLoader,
    file: FileDocumentLoader,
}

impl Discovery {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Ok(Self {
            http: HttpDocumentLoader::new(config)?,
            file: FileDocumentLoader::new(),
        })
    }

    async fn load(&self, source: &str) -> Result<JsonValue, DiscoveryError> {
        if is_remote(source) {
            tracing::debug!("Discovery: Using HTTP loader for {source}");
            self.http.load(source).await
        } else {
            tracing::debug!("Discovery: Using file loader for {source}");
            self.file.load(source).await
        }
    }
}

#[async_trait]
impl DiscoveryClient for Discovery {
    async fn resolve_index(&self, url: &str) -> Result<ApiCatalog, DiscoveryError> {
        let value = self.load(url).await?;
        let list: DirectoryList =
            serde_json::from_value(value).map_err(|e| DiscoveryError::InvalidIndex {
                source_name: url.to_string(),
                message: e.to_string(),
            })?;

        let sources = list
            .items
            .iter()
            .map(|item| {
                let reference = item.discovery_rest_url.as_deref().ok_or_else(|| {
                    DiscoveryError::InvalidIndex {
                        source_name: url.to_string(),
                        message: format!(
                            "{}(\"{}\") has no discoveryRestUrl",
                            item.name, item.version
                        ),
                    }
                })?;
                resolve_reference(url, reference)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            index = %url,
            documents = sources.len(),
            "Fetching discovery documents"
        );
        let modules = try_join_all(sources.iter().map(|source| self.resolve_document(source)))
            .await?;

        let mut grouped: HashMap<String, VersionedModules> = HashMap::new();
        for ((item, source), module) in list.items.iter().zip(&sources).zip(modules) {
            if module.api_name() != item.name || module.version() != item.version {
                return Err(DiscoveryError::InvalidIndex {
                    source_name: url.to_string(),
                    message: format!(
                        "{}(\"{}\") points at {source}, which describes {}(\"{}\")",
                        item.name,
                        item.version,
                        module.api_name(),
                        module.version()
                    ),
                });
            }
            grouped
                .entry(item.name.clone())
                .or_insert_with(|| VersionedModules::new(item.name.clone()))
                .insert(module);
        }

        Ok(grouped
            .into_iter()
            .map(|(name, modules)| (name, Arc::new(modules) as Arc<dyn ApiLoader>))
            .collect())
    }

    async fn resolve_document(
        &self,
        path_or_url: &str,
    ) -> Result<Arc<dyn EndpointModule>, DiscoveryError> {
        let value = self.load(path_or_url).await?;
        let descriptor =
            ApiDescriptor::from_value(value).map_err(|e| DiscoveryError::Parse {
                source_name: path_or_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Arc::new(DescriptorModule::new(descriptor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_reference_against_url() {
        let resolved = resolve_reference(
            "https://example.com/discovery/v1/apis",
            "apis/drive/v3/rest",
        )
        .unwrap();
        assert_eq!(resolved, "https://example.com/discovery/v1/apis/drive/v3/rest");

        let absolute =
            resolve_reference("https://example.com/index", "http://other.com/doc").unwrap();
        assert_eq!(absolute, "http://other.com/doc");
    }

    #[test]
    fn test_resolve_reference_against_path() {
        let resolved = resolve_reference("/srv/discovery/index.json", "drive.json").unwrap();
        assert_eq!(Path::new(&resolved), Path::new("/srv/discovery/drive.json"));
    }

    #[tokio::test]
    async fn test_resolve_index_from_files() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("drive-v2.json"),
            r#"{"name": "drive", "version": "v2"}"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("drive-v3.json"),
            r#"{"name": "drive", "version": "v3"}"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("index.json"),
            r#"{"items": [
                {"name": "drive", "version": "v2", "discoveryRestUrl": "drive-v2.json"},
                {"name": "drive", "version": "v3", "discoveryRestUrl": "drive-v3.json"}
            ]}"#,
        )
        .unwrap();

        let discovery = Discovery::new(&DiscoveryConfig::default()).unwrap();
        let index = temp.path().join("index.json");
        let catalog = discovery
            .resolve_index(index.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog["drive"].versions(), vec!["v2", "v3"]);
    }

    #[tokio::test]
    async fn test_resolve_index_requires_document_urls() {
        let temp = TempDir::new().unwrap();
        let index = temp.path().join("index.json");
        fs::write(&index, r#"{"items": [{"name": "drive", "version": "v3"}]}"#).unwrap();

        let discovery = Discovery::new(&DiscoveryConfig::default()).unwrap();
        let err = discovery
            .resolve_index(index.to_str().unwrap())
            .await
            .err()
            .expect("index without document URLs is rejected");
        assert!(matches!(err, DiscoveryError::InvalidIndex { .. }));
    }

    #[tokio::test]
    async fn test_resolve_index_rejects_mismatched_document() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("doc.json"),
            r#"{"name": "beta", "version": "v9"}"#,
        )
        .unwrap();
        let index = temp.path().join("index.json");
        fs::write(
            &index,
            r#"{"items": [{"name": "alpha", "version": "v1", "discoveryRestUrl": "doc.json"}]}"#,
        )
        .unwrap();

        let discovery = Discovery::new(&DiscoveryConfig::default()).unwrap();
        let err = discovery
            .resolve_index(index.to_str().unwrap())
            .await
            .err()
            .expect("document must match its index entry");
        assert!(matches!(err, DiscoveryError::InvalidIndex { .. }));
        assert!(err.to_string().contains("beta"));
    }

    #[tokio::test]
    async fn test_resolve_document_rejects_non_descriptor() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("doc.json");
        fs::write(&doc, r#"{"title": "missing name and version"}"#).unwrap();

        let discovery = Discovery::new(&DiscoveryConfig::default()).unwrap();
        let err = discovery
            .resolve_document(doc.to_str().unwrap())
            .await
            .err()
            .expect("document without identity is rejected");
        assert!(matches!(err, DiscoveryError::Parse { .. }));
    }
}
