use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::errors::CompletionError;
use crate::wire::{reply_content, ChatMessage, CompletionRequest};

pub const DEFAULT_ENDPOINT: &str = "https://lorealworker.nnieto0613.workers.dev/";

/// POSTs `{"messages": [...]}` to a fixed endpoint and reads back
/// `choices[0].message.content`.
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpCompletionClient {
    pub fn new(endpoint: String, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, endpoint, timeout })
    }
}

#[async_trait]
impl super::CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        debug!(endpoint = %self.endpoint, messages = messages.len(), "POST completion");

        let mut req = self
            .client
            .post(&self.endpoint)
            .json(&CompletionRequest { messages });
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%status, "completion endpoint rejected request");
            return Err(CompletionError::Http { status: status.as_u16() });
        }

        let text = resp.text().await?;
        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CompletionError::Format(format!("body is not JSON: {e}")))?;

        reply_content(&body)
            .map(str::to_owned)
            .ok_or_else(|| CompletionError::Format("missing choices[0].message.content".into()))
    }
}
