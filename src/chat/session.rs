// Chat session - drives one backend stream at a time into the conversation
//
// The TUI polls `next_event()` inside its select! loop and feeds the result
// straight back into `apply()`. Because the next fragment is only polled after
// the previous one has been applied, deltas land in production order without
// any extra sequencing.

use super::conversation::Conversation;
use crate::backend::{Backend, BackendError, TokenStream};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Shown in place of the answer when the stream fails
pub const FAILURE_MESSAGE: &str = "Sorry, there was an error. Please try again";

/// Left in the assistant slot when a stream is cancelled before any text arrived
pub const CANCELLED_MESSAGE: &str = "_(cancelled)_";

/// Result of a submit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new stream was started; the assistant reply lives at `slot`
    Started { slot: usize },
    /// A stream is already in flight; nothing was appended
    Busy,
    /// Blank input; nothing was appended
    Empty,
}

/// One step of the active stream
#[derive(Debug)]
pub enum StreamEvent {
    Fragment(String),
    Finished,
    Failed(BackendError),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Failed,
    Cancelled,
}

/// The stream currently feeding an assistant slot
struct StreamSession {
    slot: usize,
    tokens: TokenStream,
    fragments: usize,
    started: Instant,
}

pub struct ChatSession {
    conversation: Conversation,
    backend: Arc<dyn Backend>,
    preamble: String,
    active: Option<StreamSession>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, preamble: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(),
            backend,
            preamble: preamble.into(),
            active: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Slot of the assistant message currently being streamed
    pub fn streaming_slot(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.slot)
    }

    /// Submit user text and start streaming the reply.
    ///
    /// The text is trimmed before it is stored. The backend sees every prior
    /// turn plus the new one with the preamble prefixed; it never sees the
    /// empty assistant placeholder.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.active.is_some() {
            tracing::debug!("Submission rejected: stream in flight");
            return SubmitOutcome::Busy;
        }
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        self.conversation.append_user(text);
        let outbound = self.conversation.outbound(&self.preamble);
        let slot = self.conversation.begin_assistant_turn();

        tracing::info!(
            backend = self.backend.name(),
            slot,
            turns = outbound.len(),
            "Starting stream"
        );

        self.active = Some(StreamSession {
            slot,
            tokens: self.backend.stream(outbound),
            fragments: 0,
            started: Instant::now(),
        });
        SubmitOutcome::Started { slot }
    }

    /// Wait for the next step of the active stream.
    ///
    /// Cancel-safe: dropping the future loses nothing. With no active stream
    /// this never resolves, so it can sit in a select! unconditionally.
    pub async fn next_event(&mut self) -> StreamEvent {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };
        match active.tokens.next().await {
            Some(Ok(fragment)) => StreamEvent::Fragment(fragment),
            Some(Err(err)) => StreamEvent::Failed(err),
            None => StreamEvent::Finished,
        }
    }

    /// Fold a stream event into the conversation. Returns how the session
    /// ended, or `None` while it is still running.
    pub fn apply(&mut self, event: StreamEvent) -> Option<SessionEnd> {
        let active = self.active.as_mut()?;
        let slot = active.slot;

        match event {
            StreamEvent::Fragment(delta) => {
                active.fragments += 1;
                let _ = self.conversation.apply_delta(slot, &delta);
                None
            }
            StreamEvent::Finished => {
                tracing::info!(
                    slot,
                    fragments = active.fragments,
                    elapsed_ms = active.started.elapsed().as_millis() as u64,
                    "Stream completed"
                );
                self.active = None;
                Some(SessionEnd::Completed)
            }
            StreamEvent::Failed(err) => {
                tracing::warn!(
                    slot,
                    fragments = active.fragments,
                    backend = self.backend.name(),
                    "Stream failed: {}",
                    err
                );
                let _ = self.conversation.finalize_or_fail(slot, FAILURE_MESSAGE);
                self.active = None;
                Some(SessionEnd::Failed)
            }
        }
    }

    /// Stop the active stream, keeping whatever text already arrived
    pub fn cancel(&mut self) -> Option<SessionEnd> {
        let active = self.active.take()?;
        let partial_is_empty = self
            .conversation
            .get(active.slot)
            .map(|m| m.content.is_empty())
            .unwrap_or(true);
        if partial_is_empty {
            let _ = self
                .conversation
                .finalize_or_fail(active.slot, CANCELLED_MESSAGE);
        }
        tracing::info!(
            slot = active.slot,
            fragments = active.fragments,
            "Stream cancelled"
        );
        Some(SessionEnd::Cancelled)
    }

    /// Run the active stream to the end, calling `on_event` before each event
    /// is applied. Used by headless mode; the TUI drives `next_event` itself.
    pub async fn drain(&mut self, mut on_event: impl FnMut(&StreamEvent)) -> Option<SessionEnd> {
        while self.is_streaming() {
            let event = self.next_event().await;
            on_event(&event);
            if let Some(end) = self.apply(event) {
                return Some(end);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DemoBackend;
    use crate::chat::{Message, Role};
    use futures::stream;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend that replays a fixed script and records what it was sent
    struct ScriptedBackend {
        script: Vec<Result<&'static str, &'static str>>,
        jitter: bool,
        sent: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<&'static str, &'static str>>) -> Arc<Self> {
            Arc::new(Self {
                script,
                jitter: false,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn jittery(script: Vec<Result<&'static str, &'static str>>) -> Arc<Self> {
            Arc::new(Self {
                script,
                jitter: true,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test"
        }

        fn stream(&self, messages: Vec<Message>) -> TokenStream {
            self.sent.lock().unwrap().push(messages);
            let jitter = self.jitter;
            let items: Vec<_> = self.script.iter().copied().enumerate().collect();
            stream::iter(items)
                .then(move |(i, item)| async move {
                    if jitter {
                        // Uneven gaps: later fragments sometimes arrive faster
                        let ms = [7u64, 1, 4, 0, 9, 2][i % 6];
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                    }
                    item.map(str::to_string)
                        .map_err(|e| BackendError::Transport(e.to_string()))
                })
                .boxed()
        }
    }

    fn session(backend: Arc<ScriptedBackend>) -> ChatSession {
        ChatSession::new(backend, "PRE ")
    }

    #[tokio::test]
    async fn test_fragments_applied_in_order() {
        let backend = ScriptedBackend::jittery(vec![Ok("The "), Ok("quick "), Ok("brown "), Ok("fox")]);
        let mut chat = session(backend);

        assert_eq!(chat.submit("hi"), SubmitOutcome::Started { slot: 1 });
        let end = chat.drain(|_| {}).await;

        assert_eq!(end, Some(SessionEnd::Completed));
        assert!(!chat.is_streaming());
        assert_eq!(
            chat.conversation().messages(),
            &[Message::user("hi"), Message::assistant("The quick brown fox")]
        );
    }

    #[tokio::test]
    async fn test_failure_replaces_partial_answer() {
        let backend = ScriptedBackend::new(vec![Ok("Hel"), Ok("lo"), Err("connection reset")]);
        let mut chat = session(backend);

        chat.submit("hi");
        let end = chat.drain(|_| {}).await;

        assert_eq!(end, Some(SessionEnd::Failed));
        assert_eq!(chat.conversation().messages()[1].content, FAILURE_MESSAGE);
        // Submission works again
        assert!(matches!(chat.submit("again"), SubmitOutcome::Started { .. }));
    }

    #[tokio::test]
    async fn test_submit_while_streaming_is_rejected() {
        let backend = ScriptedBackend::new(vec![Ok("a"), Ok("b")]);
        let mut chat = session(backend.clone());

        chat.submit("first");
        let before = chat.conversation().clone();

        assert_eq!(chat.submit("second"), SubmitOutcome::Busy);
        assert_eq!(chat.conversation(), &before);
        assert_eq!(backend.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_submission_is_ignored() {
        let mut chat = session(ScriptedBackend::new(vec![]));
        assert_eq!(chat.submit("   \n\t "), SubmitOutcome::Empty);
        assert!(chat.conversation().is_empty());
        assert!(!chat.is_streaming());
    }

    #[tokio::test]
    async fn test_outbound_carries_preamble_but_display_does_not() {
        let backend = ScriptedBackend::new(vec![Ok("ok")]);
        let mut chat = session(backend.clone());

        chat.submit("  make a page  ");
        chat.drain(|_| {}).await;
        chat.submit("smaller");

        let sent = backend.sent.lock().unwrap();
        assert_eq!(sent[0], vec![Message::user("PRE make a page")]);
        // Second request: history as displayed, no empty assistant placeholder
        assert_eq!(
            sent[1],
            vec![
                Message::user("make a page"),
                Message::assistant("ok"),
                Message::user("PRE smaller"),
            ]
        );
        assert_eq!(chat.conversation().messages()[0].content, "make a page");
        assert_eq!(chat.conversation().messages()[3].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_text() {
        let backend = ScriptedBackend::new(vec![Ok("partial "), Ok("answer")]);
        let mut chat = session(backend);

        chat.submit("hi");
        let event = chat.next_event().await;
        chat.apply(event);

        assert_eq!(chat.cancel(), Some(SessionEnd::Cancelled));
        assert!(!chat.is_streaming());
        assert_eq!(chat.conversation().messages()[1].content, "partial ");
        assert_eq!(chat.cancel(), None);
    }

    #[test]
    fn test_cancel_before_first_fragment() {
        let mut chat = session(ScriptedBackend::new(vec![Ok("never")]));
        chat.submit("hi");
        chat.cancel();
        assert_eq!(chat.conversation().messages()[1].content, CANCELLED_MESSAGE);
    }

    #[tokio::test]
    async fn test_next_event_pends_when_idle() {
        let mut chat = session(ScriptedBackend::new(vec![]));
        let idle = tokio::time::timeout(Duration::from_millis(20), chat.next_event()).await;
        assert!(idle.is_err());
    }

    #[tokio::test]
    async fn test_drain_reports_each_fragment() {
        let backend = Arc::new(DemoBackend::with_delay(Duration::ZERO));
        let mut chat = ChatSession::new(backend, "");
        chat.submit("a page please");

        let mut printed = String::new();
        chat.drain(|event| {
            if let StreamEvent::Fragment(text) = event {
                printed.push_str(text);
            }
        })
        .await;

        assert_eq!(printed, chat.conversation().messages()[1].content);
        assert!(printed.contains("<!DOCTYPE html>"));
    }
}
