//! HTTP client for the layer-publishing service.
//!
//! Rasters (`.tif`/`.tiff`) are uploaded as coverage stores and zipped
//! shapefiles as data stores. Each published layer gets a store of the
//! same name, so deleting the store with `recurse=true` drops the layer.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PublisherConfig;
use crate::domain::ports::LayerPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Coverage,
    Data,
}

impl StoreKind {
    fn for_file(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "tif" | "tiff" => Some(Self::Coverage),
            "zip" => Some(Self::Data),
            _ => None,
        }
    }

    fn collection(self) -> &'static str {
        match self {
            Self::Coverage => "coveragestores",
            Self::Data => "datastores",
        }
    }

    fn upload(self) -> (&'static str, &'static str) {
        match self {
            Self::Coverage => ("file.geotiff", "image/tiff"),
            Self::Data => ("file.shp", "application/zip"),
        }
    }
}

/// HTTP-backed [`LayerPublisher`].
#[derive(Debug, Clone)]
pub struct HttpLayerPublisher {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpLayerPublisher {
    pub fn new(config: &PublisherConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::PublisherUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn delete_store(&self, kind: StoreKind, layer_name: &str, workspace: &str) -> DomainResult<bool> {
        let path = format!("/workspaces/{workspace}/{}/{layer_name}", kind.collection());
        let response = self
            .request(Method::DELETE, &path)
            .query(&[("recurse", "true")])
            .send()
            .await
            .map_err(|e| DomainError::PublisherUnavailable(format!("delete {layer_name}: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(DomainError::PublisherUnavailable(format!(
                "delete {layer_name} returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl LayerPublisher for HttpLayerPublisher {
    async fn publish(&self, file_path: &Path, workspace: &str, layer_name: &str) -> DomainResult<Option<String>> {
        let Some(kind) = StoreKind::for_file(file_path) else {
            tracing::warn!(file = %file_path.display(), "unsupported file type, not publishing");
            return Ok(None);
        };

        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| DomainError::PublisherUnavailable(format!("cannot read {}: {e}", file_path.display())))?;

        let (upload, content_type) = kind.upload();
        let path = format!("/workspaces/{workspace}/{}/{layer_name}/{upload}", kind.collection());
        let response = self
            .request(Method::PUT, &path)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| DomainError::PublisherUnavailable(format!("publish {layer_name}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(layer = layer_name, workspace, "layer published");
            return Ok(Some(format!("{workspace}:{layer_name}")));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(layer = layer_name, %status, body = %body, "publisher refused layer");
            return Ok(None);
        }
        Err(DomainError::PublisherUnavailable(format!("publish {layer_name} returned {status}")))
    }

    async fn delete(&self, layer_name: &str, workspace: &str) -> DomainResult<bool> {
        if self.delete_store(StoreKind::Coverage, layer_name, workspace).await? {
            return Ok(true);
        }
        self.delete_store(StoreKind::Data, layer_name, workspace).await
    }
}
