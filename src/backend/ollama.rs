// Ollama `/api/chat` with newline-delimited JSON streaming
//
// Every line is a complete JSON object. `message.content` is the fragment,
// `done: true` marks the last record and `error` reports a failure mid-stream.

use super::framing::{frame_lines, LineOutcome};
use super::{endpoint, http_client, Backend, BackendError, TokenStream};
use crate::chat::Message;
use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatRecord {
    message: Option<RecordMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct RecordMessage {
    #[serde(default)]
    content: String,
}

impl OllamaBackend {
    pub fn new(api_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: endpoint(api_url, "api/chat"),
            model: model.to_string(),
        })
    }
}

impl Backend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn stream(&self, messages: Vec<Message>) -> TokenStream {
        let request = self.client.post(&self.url).json(&ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        });

        tracing::debug!(url = %self.url, turns = messages.len(), "Sending Ollama chat request");

        stream::once(async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BackendError::Status {
                    code: status.as_u16(),
                    body,
                });
            }
            Ok(frame_lines(response.bytes_stream(), parse_ndjson_line))
        })
        .try_flatten()
        .boxed()
    }
}

fn parse_ndjson_line(line: &str) -> LineOutcome {
    let record = match serde_json::from_str::<ChatRecord>(line) {
        Ok(record) => record,
        Err(e) => return LineOutcome::Fail(BackendError::Decode(format!("{}: {}", e, line))),
    };

    if let Some(err) = record.error {
        return LineOutcome::Fail(BackendError::Remote(err));
    }
    // The final record may still carry a trailing fragment, but Ollama sends
    // it empty in practice; completion wins.
    if record.done {
        return LineOutcome::Done;
    }
    match record.message {
        Some(message) => LineOutcome::Fragment(message.content),
        None => LineOutcome::Skip,
    }
}
