use crate::error::Result;
use async_trait::async_trait;

pub mod client;
pub mod types;

pub use client::OllamaClient;

/// Something that turns a prompt into a text completion
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Sends `prompt` and waits for the full completion
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Identifier reported by the health endpoint
    fn model_name(&self) -> &str;

    /// Whether the backend is reachable and has the model installed
    async fn is_available(&self) -> bool {
        true
    }
}
