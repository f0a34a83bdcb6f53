//! Notifier adapters.
//!
//! With no relay configured, notifications only go to the log.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::NotifierConfig;
use crate::domain::ports::Notifier;

/// Notifier that writes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> DomainResult<()> {
        tracing::info!(subject, body, "notification");
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    subject: &'a str,
    body: &'a str,
    recipients: &'a [String],
}

/// Notifier that posts to an email relay webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    relay_url: String,
    recipients: Vec<String>,
}

impl WebhookNotifier {
    pub fn new(relay_url: impl Into<String>, recipients: Vec<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            relay_url: relay_url.into(),
            recipients,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> DomainResult<()> {
        let message = RelayMessage {
            subject,
            body,
            recipients: &self.recipients,
        };
        let response = self
            .http
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| DomainError::NotifierUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DomainError::NotifierUnavailable(format!(
                "relay returned {}",
                response.status()
            )));
        }
        tracing::debug!(subject, recipients = self.recipients.len(), "notification relayed");
        Ok(())
    }
}

/// Build the notifier described by the configuration.
pub fn notifier_from_config(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match &config.relay_url {
        Some(url) if !url.is_empty() => Arc::new(WebhookNotifier::new(url.clone(), config.recipients.clone())),
        _ => Arc::new(LogNotifier),
    }
}

/// Notifier that keeps every message, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<RwLock<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<(String, String)> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> DomainResult<()> {
        self.messages.write().await.push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
