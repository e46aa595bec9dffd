//! HTTP client for the remote document store.
//!
//! `PUT <server>/v1/<collection>/<id>` replaces a document and `PATCH` merges
//! top-level fields. Requests carry `Authorization: Bearer <api_key>`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::remote::{RemoteDocumentStore, RemoteError, WriteMode};
use crate::config::SyncConfig;

#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpDocumentStore {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds a store from config; `None` unless both url and key are set.
    pub fn from_config(config: &SyncConfig) -> Option<Self> {
        Some(Self::new(
            config.server_url.clone()?,
            config.api_key.clone()?,
        ))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Checks the unauthenticated health endpoint.
    pub async fn check_health(&self) -> bool {
        match self.client.get(self.base_url() + "/health").send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn base_url(&self) -> String {
        let url = self.server_url.trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{}/{}", self.base_url(), collection, id)
    }
}

#[async_trait]
impl RemoteDocumentStore for HttpDocumentStore {
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mode: WriteMode,
    ) -> Result<(), RemoteError> {
        let url = self.document_url(collection, id);
        let request = match mode {
            WriteMode::Replace => self.client.put(&url),
            WriteMode::Merge => self.client.patch(&url),
        };

        let response = request
            .bearer_auth(&self.api_key)
            .json(&fields)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_with_http() {
        let store = HttpDocumentStore::new("http://localhost:8080", "key");
        assert_eq!(
            store.document_url("classes", "17"),
            "http://localhost:8080/v1/classes/17"
        );
    }

    #[test]
    fn test_document_url_with_https_and_trailing_slash() {
        let store = HttpDocumentStore::new("https://mirror.example.com/", "key");
        assert_eq!(
            store.document_url("classes", "17"),
            "https://mirror.example.com/v1/classes/17"
        );
    }

    #[test]
    fn test_document_url_bare_host() {
        let store = HttpDocumentStore::new("localhost:8080", "key");
        assert_eq!(
            store.document_url("classes", "1"),
            "http://localhost:8080/v1/classes/1"
        );
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let mut config = SyncConfig::default();
        assert!(HttpDocumentStore::from_config(&config).is_none());

        config.server_url = Some("localhost:8080".into());
        assert!(HttpDocumentStore::from_config(&config).is_none());

        config.api_key = Some("secret".into());
        let store = HttpDocumentStore::from_config(&config).unwrap();
        assert_eq!(store.server_url(), "localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        // port 9 (discard) is closed on test machines
        let store = HttpDocumentStore::new("http://127.0.0.1:9", "key");
        let result = store
            .write_document("classes", "1", Map::new(), WriteMode::Replace)
            .await;
        assert!(matches!(result, Err(RemoteError::Http(_))));
        assert!(!store.check_health().await);
    }
}
