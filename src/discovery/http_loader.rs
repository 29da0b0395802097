//! HTTP-based discovery document loader

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;

use super::{DocumentLoader, is_remote};
use crate::config::DiscoveryConfig;
use crate::descriptor::parse_document;
use crate::error::DiscoveryError;

/// Loads discovery documents from HTTP/HTTPS URLs
#[derive(Debug, Clone)]
pub struct HttpDocumentLoader {
    client: Client,
}

impl HttpDocumentLoader {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| DiscoveryError::Client(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn load(&self, source: &str) -> Result<JsonValue, DiscoveryError> {
        if !is_remote(source) {
            return Err(DiscoveryError::Client(format!(
                "HttpDocumentLoader only handles HTTP(S) URLs, got: {source}"
            )));
        }

        let response = self
            .client
            .get(source)
            .send()
            .await
            .map_err(|e| DiscoveryError::Request {
                url: source.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: source.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let content = response.text().await.map_err(|e| DiscoveryError::Request {
            url: source.to_string(),
            source: e,
        })?;

        // Content type wins over the URL when it names a format
        let hint = if content_type.contains("json") || content_type.contains("yaml") {
            content_type.as_str()
        } else {
            source
        };
        parse_document(&content, hint).map_err(|message| DiscoveryError::Parse {
            source_name: source.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader() -> HttpDocumentLoader {
        HttpDocumentLoader::new(&DiscoveryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_http_loader_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery/v1/apis/storage/v1/rest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"name": "storage", "version": "v1"}"#)
                    .insert_header("content-type", "application/json; charset=UTF-8"),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/discovery/v1/apis/storage/v1/rest", mock_server.uri());
        let value = loader().load(&url).await.unwrap();
        assert_eq!(value["name"], "storage");
    }

    #[tokio::test]
    async fn test_http_loader_yaml() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage.yaml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("name: storage\nversion: v1\n")
                    .insert_header("content-type", "application/x-yaml"),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/storage.yaml", mock_server.uri());
        let value = loader().load(&url).await.unwrap();
        assert_eq!(value["version"], "v1");
    }

    #[tokio::test]
    async fn test_http_loader_404() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notfound"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/notfound", mock_server.uri());
        let err = loader().load(&url).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Status { status, .. } if status.as_u16() == 404));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_http_loader_non_http_url() {
        let err = loader().load("/path/to/discovery.json").await.unwrap_err();
        assert!(err.to_string().contains("only handles HTTP"));
    }
}
