use async_trait::async_trait;
use std::time::Duration;

use crate::config::Config;
use crate::errors::CompletionError;
use crate::wire::ChatMessage;

pub mod http;

/// Turns an ordered message list into one generated reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}

pub type DynClient = Box<dyn CompletionClient + Send + Sync>;

pub fn make_client(cfg: &Config) -> anyhow::Result<DynClient> {
    let timeout = cfg.timeout_secs.map(Duration::from_secs);
    Ok(Box::new(http::HttpCompletionClient::new(cfg.endpoint.clone(), timeout)?))
}
