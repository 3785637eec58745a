//! Alert transports

use crate::scan::AlertTransport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Writes alerts to the log instead of sending them anywhere
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl AlertTransport for LogTransport {
    async fn send_alert(&self, text: &str) -> Result<()> {
        info!(event = "alert_sent", transport = "log", text = %text, "Alert");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts alerts to a chat webhook as `{"text": "..."}`
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: Url,
}

impl WebhookTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid webhook URL: {}", url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertTransport for WebhookTransport {
    async fn send_alert(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&WebhookPayload { text })
            .send()
            .await
            .with_context(|| format!("Failed to post alert to {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Webhook returned {}: {}", status, body);
        }
        Ok(())
    }
}
