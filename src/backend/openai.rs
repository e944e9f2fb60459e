// OpenAI-compatible chat completions over Server-Sent Events
//
// Each `data:` line carries a JSON chunk whose `choices[0].delta.content` holds
// the next fragment. `data: [DONE]` ends the stream.

use super::framing::{frame_lines, LineOutcome};
use super::{endpoint, http_client, Backend, BackendError, TokenStream};
use crate::chat::Message;
use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

pub struct OpenAiBackend {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

impl OpenAiBackend {
    pub fn new(api_url: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: endpoint(api_url, "v1/chat/completions"),
            model: model.to_string(),
            api_key,
        })
    }
}

impl Backend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn stream(&self, messages: Vec<Message>) -> TokenStream {
        let body = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(url = %self.url, turns = messages.len(), "Sending chat completion request");

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
            Ok(frame_lines(response.bytes_stream(), parse_sse_line))
        })
        .try_flatten()
        .boxed()
    }
}

/// Parse one SSE line into a fragment
fn parse_sse_line(line: &str) -> LineOutcome {
    let Some(data) = line.strip_prefix("data:") else {
        // event:, id:, retry:, and `:` comments carry no text
        return LineOutcome::Skip;
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return LineOutcome::Done;
    }

    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return LineOutcome::Fail(BackendError::Remote(err.message));
            }
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .map(LineOutcome::Fragment)
                .unwrap_or(LineOutcome::Skip)
        }
        Err(e) => LineOutcome::Fail(BackendError::Decode(format!("{}: {}", e, data))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_delta() {
        let line = r#"data: {"id":"1","choices":[{"index":0,"delta":{"content":"Hel"}}]}"#;
        assert!(matches!(parse_sse_line(line), LineOutcome::Fragment(text) if text == "Hel"));
    }

    #[test]
    fn test_parse_role_only_chunk_is_skipped() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert!(matches!(parse_sse_line(line), LineOutcome::Skip));
    }

    #[test]
    fn test_parse_done_marker() {
        assert!(matches!(parse_sse_line("data: [DONE]"), LineOutcome::Done));
        assert!(matches!(parse_sse_line("data:[DONE]"), LineOutcome::Done));
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert!(matches!(parse_sse_line(": keep-alive"), LineOutcome::Skip));
        assert!(matches!(parse_sse_line("event: message"), LineOutcome::Skip));
    }

    #[test]
    fn test_in_band_error() {
        let line = r#"data: {"error":{"message":"rate limited"}}"#;
        assert!(matches!(
            parse_sse_line(line),
            LineOutcome::Fail(BackendError::Remote(msg)) if msg == "rate limited"
        ));
    }

    #[test]
    fn test_garbage_payload_fails() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            LineOutcome::Fail(BackendError::Decode(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::user("hi")];
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "gpt-4o-mini");
    }
}
