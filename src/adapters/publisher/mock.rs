//! In-memory layer publisher for testing.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::ports::LayerPublisher;

/// A publish or delete call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherCall {
    Publish { file: PathBuf, workspace: String, layer: String },
    Delete { workspace: String, layer: String },
}

/// Mock publisher that tracks the set of live layers.
#[derive(Default, Clone)]
pub struct MockLayerPublisher {
    layers: Arc<RwLock<BTreeSet<String>>>,
    calls: Arc<RwLock<Vec<PublisherCall>>>,
    refused: Arc<RwLock<BTreeSet<String>>>,
}

impl MockLayerPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the publisher refuse this layer name.
    pub async fn refuse(&self, layer_name: &str) {
        self.refused.write().await.insert(layer_name.to_string());
    }

    pub async fn live_layers(&self) -> Vec<String> {
        self.layers.read().await.iter().cloned().collect()
    }

    pub async fn calls(&self) -> Vec<PublisherCall> {
        self.calls.read().await.clone()
    }

    pub async fn publish_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, PublisherCall::Publish { .. }))
            .count()
    }
}

#[async_trait]
impl LayerPublisher for MockLayerPublisher {
    async fn publish(&self, file_path: &Path, workspace: &str, layer_name: &str) -> DomainResult<Option<String>> {
        self.calls.write().await.push(PublisherCall::Publish {
            file: file_path.to_path_buf(),
            workspace: workspace.to_string(),
            layer: layer_name.to_string(),
        });
        if self.refused.read().await.contains(layer_name) {
            return Ok(None);
        }
        self.layers.write().await.insert(layer_name.to_string());
        Ok(Some(format!("{workspace}:{layer_name}")))
    }

    async fn delete(&self, layer_name: &str, workspace: &str) -> DomainResult<bool> {
        self.calls.write().await.push(PublisherCall::Delete {
            workspace: workspace.to_string(),
            layer: layer_name.to_string(),
        });
        Ok(self.layers.write().await.remove(layer_name))
    }
}
