// chatmark - streaming LLM chat in the terminal
//
// Prompts go to a generation backend; the answer streams back fragment by
// fragment and is re-rendered as markdown on every fragment, with fenced code
// highlighted and offered for copy and (for HTML) sandboxed preview.
//
// Architecture:
// - Backend (reqwest): OpenAI-compatible SSE, Ollama NDJSON, or a demo stream
// - Chat: conversation model plus the session that folds fragments into it
// - Markdown: content -> block tree, rebuilt on every update
// - Actions: clipboard and preview capabilities for code blocks
// - TUI (ratatui): transcript, prompt, modals; one select! loop drives it all

mod actions;
mod backend;
mod chat;
mod cli;
mod config;
mod logging;
mod markdown;
mod theme;
mod tui;

use anyhow::Result;
use chat::{ChatSession, SessionEnd, StreamEvent, FAILURE_MESSAGE};
use config::Config;
use logging::{LogBuffer, LogOutput};
use std::io::Write;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Config subcommands exit here
    let Some(cli) = cli::handle_cli() else {
        return Ok(ExitCode::SUCCESS);
    };

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    cli.apply_overrides(&mut config);

    match cli.prompt {
        Some(prompt) => run_headless(&config, &prompt).await,
        None => run_interactive(&config).await.map(|()| ExitCode::SUCCESS),
    }
}

/// Full-screen chat. Logs are captured for the diagnostics overlay so they
/// never write over the screen.
async fn run_interactive(config: &Config) -> Result<()> {
    let log_buffer = LogBuffer::new();
    let _file_guard = logging::init(&config.logging, LogOutput::Tui(log_buffer.clone()));

    let backend = backend::from_config(config)?;
    let session = ChatSession::new(backend, config.system_preamble.clone());

    tracing::info!(version = config::VERSION, "chatmark started");
    tui::run_tui(session, config, log_buffer).await
}

/// One exchange without the TUI: fragments go to stdout as they arrive,
/// logs go to stderr. A failed stream prints the fallback text and exits
/// non-zero. Returning (rather than exiting) lets the file log guard flush.
async fn run_headless(config: &Config, prompt: &str) -> Result<ExitCode> {
    let _file_guard = logging::init(&config.logging, LogOutput::Stderr);

    let backend = backend::from_config(config)?;
    let mut session = ChatSession::new(backend, config.system_preamble.clone());

    let end = stream_answer(&mut session, prompt, &mut std::io::stdout()).await?;
    Ok(match end {
        Some(SessionEnd::Failed) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

/// Submit `prompt` and write the answer to `out` fragment by fragment. On
/// failure the fallback text is written instead of a trailing newline.
async fn stream_answer(
    session: &mut ChatSession,
    prompt: &str,
    out: &mut impl Write,
) -> Result<Option<SessionEnd>> {
    match session.submit(prompt) {
        chat::SubmitOutcome::Started { .. } => {}
        chat::SubmitOutcome::Empty => anyhow::bail!("Prompt is empty"),
        chat::SubmitOutcome::Busy => anyhow::bail!("A stream is already running"),
    }

    let end = session
        .drain(|event| {
            if let StreamEvent::Fragment(text) = event {
                let _ = write!(out, "{}", text);
                let _ = out.flush();
            }
        })
        .await;

    match end {
        Some(SessionEnd::Failed) => writeln!(out, "\n{}", FAILURE_MESSAGE)?,
        _ => writeln!(out)?,
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError, DemoBackend, TokenStream};
    use crate::chat::Message;
    use futures::stream::{self, StreamExt};
    use std::sync::Arc;
    use std::time::Duration;

    /// Sends one fragment, then drops the connection
    struct BrokenBackend;

    impl Backend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }

        fn model(&self) -> &str {
            "none"
        }

        fn stream(&self, _messages: Vec<Message>) -> TokenStream {
            stream::iter(vec![
                Ok("Hel".to_string()),
                Err(BackendError::Transport("reset".to_string())),
            ])
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_headless_answer_is_written_in_full() {
        let backend = Arc::new(DemoBackend::with_delay(Duration::ZERO));
        let mut session = ChatSession::new(backend, "");
        let mut out = Vec::new();

        let end = stream_answer(&mut session, "hello", &mut out).await.unwrap();

        assert_eq!(end, Some(SessionEnd::Completed));
        let text = String::from_utf8(out).unwrap();
        let answer = &session.conversation().messages()[1].content;
        assert_eq!(text, format!("{}\n", answer));
    }

    #[tokio::test]
    async fn test_headless_failure_returns_instead_of_exiting() {
        let mut session = ChatSession::new(Arc::new(BrokenBackend), "");
        let mut out = Vec::new();

        let end = stream_answer(&mut session, "hello", &mut out).await.unwrap();

        assert_eq!(end, Some(SessionEnd::Failed));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("Hel\n{}\n", FAILURE_MESSAGE));
        assert!(!session.is_streaming());
    }

    #[tokio::test]
    async fn test_headless_rejects_blank_prompt() {
        let backend = Arc::new(DemoBackend::with_delay(Duration::ZERO));
        let mut session = ChatSession::new(backend, "");
        assert!(stream_answer(&mut session, "   ", &mut Vec::new()).await.is_err());
    }
}
