// Generation backends
//
// A backend takes the ordered conversation and hands back a lazy stream of
// text fragments. Nothing is sent until the stream is first polled, the stream
// ends when the model signals completion, and any error is terminal: after an
// `Err` item the stream yields nothing more.
//
// Implementations:
// - openai: OpenAI-compatible `/v1/chat/completions` (SSE)
// - ollama: Ollama `/api/chat` (newline-delimited JSON)
// - demo:   canned answer streamed word by word, no network

mod demo;
mod framing;
mod ollama;
mod openai;

pub use demo::DemoBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::chat::Message;
use crate::config::{BackendKind, Config};
use anyhow::Result;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Finite, ordered, non-restartable sequence of text fragments
pub type TokenStream = BoxStream<'static, Result<String, BackendError>>;

/// Transport-level failures surfaced while streaming
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not decode stream: {0}")]
    Decode(String),

    #[error("stream interrupted: {0}")]
    Transport(String),

    #[error("backend reported an error: {0}")]
    Remote(String),
}

/// Something that turns a conversation into a token stream
pub trait Backend: Send + Sync {
    /// Short name for logs and the status line
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Start a generation for `messages`. The final entry is the new user turn.
    fn stream(&self, messages: Vec<Message>) -> TokenStream;
}

/// Build the backend selected in config
pub fn from_config(config: &Config) -> Result<Arc<dyn Backend>> {
    let backend = &config.backend;
    let built: Arc<dyn Backend> = match backend.kind {
        BackendKind::OpenAi => {
            let api_key = backend
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok());
            if api_key.is_none() {
                tracing::warn!(
                    "No API key found in ${}; requests will be sent without Authorization",
                    backend.api_key_env.as_deref().unwrap_or("<unset>")
                );
            }
            Arc::new(OpenAiBackend::new(&backend.api_url, &backend.model, api_key)?)
        }
        BackendKind::Ollama => Arc::new(OllamaBackend::new(&backend.api_url, &backend.model)?),
        BackendKind::Demo => Arc::new(DemoBackend::new()),
    };

    tracing::info!(
        backend = built.name(),
        model = built.model(),
        url = %backend.api_url,
        "Backend ready"
    );
    Ok(built)
}

/// Shared HTTP client settings for the network backends
fn http_client() -> Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")
}

/// Join a base URL and an endpoint path without doubling slashes
fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("http://localhost:11434/", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            endpoint("https://api.openai.com", "v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_demo_backend_from_config() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Demo;
        let backend = from_config(&config).unwrap();
        assert_eq!(backend.name(), "demo");
    }
}
