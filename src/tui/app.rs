// TUI application state
//
// App owns the chat session plus everything the screen needs around it:
// the prompt buffer, transcript scroll, code block selection and action
// state, the open modal and the live preview. The event loop in `tui::mod`
// mutates it; `views` only reads it (apart from recording scroll sizes).

use super::components::Toast;
use super::input::InputBuffer;
use super::markdown::CodeDecor;
use super::modal::Modal;
use super::scroll::ScrollState;
use super::streaming::{StreamingState, StreamingStateMachine};
use crate::actions::{
    open_external, BlockKey, BrowserPreview, Clipboard, CodeActionBook, PreviewHandle,
    PreviewSurface, SystemClipboard,
};
use crate::chat::{ChatSession, Role, SessionEnd, StreamEvent, SubmitOutcome, EXAMPLE_PROMPTS};
use crate::config::Config;
use crate::logging::LogBuffer;
use crate::markdown::{self, CodeBlock, RenderOptions, RenderedDocument};
use crate::theme::Theme;
use std::time::Instant;

/// Assistant answers always carry code actions
pub const ANSWER_OPTIONS: RenderOptions = RenderOptions { code_actions: true };

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Which pane receives plain keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    /// Typing goes into the prompt
    #[default]
    Input,
    /// Keys navigate the transcript and act on code blocks
    Transcript,
}

pub struct App {
    pub session: ChatSession,
    pub input: InputBuffer,
    pub focus: Focus,
    pub scroll: ScrollState,
    pub actions: CodeActionBook,
    pub selected: Option<BlockKey>,
    /// Set when the selection moves; the transcript view scrolls the block
    /// into view on the next draw and clears it
    pub reveal_selection: bool,
    pub modal: Option<Modal>,
    pub toast: Option<Toast>,
    pub theme: Theme,
    pub highlight_theme: String,
    pub log_buffer: LogBuffer,
    pub streaming: StreamingStateMachine,
    pub should_quit: bool,
    animation_frame: usize,
    clipboard: Box<dyn Clipboard>,
    preview_surface: Box<dyn PreviewSurface>,
    preview: Option<(BlockKey, PreviewHandle)>,
}

impl App {
    pub fn new(session: ChatSession, config: &Config, log_buffer: LogBuffer) -> Self {
        if !super::highlight::theme_names().contains(&config.highlight_theme.as_str()) {
            tracing::warn!(
                "Unknown highlight theme '{}', using the default",
                config.highlight_theme
            );
        }
        Self::with_capabilities(
            session,
            Theme::by_name(&config.theme),
            config.highlight_theme.clone(),
            log_buffer,
            Box::new(SystemClipboard),
            Box::new(BrowserPreview::default()),
        )
    }

    pub fn with_capabilities(
        session: ChatSession,
        theme: Theme,
        highlight_theme: String,
        log_buffer: LogBuffer,
        clipboard: Box<dyn Clipboard>,
        preview_surface: Box<dyn PreviewSurface>,
    ) -> Self {
        Self {
            session,
            input: InputBuffer::new(),
            focus: Focus::Input,
            scroll: ScrollState::new(),
            actions: CodeActionBook::new(),
            selected: None,
            reveal_selection: false,
            modal: None,
            toast: None,
            theme,
            highlight_theme,
            log_buffer,
            streaming: StreamingStateMachine::new(),
            should_quit: false,
            animation_frame: 0,
            clipboard,
            preview_surface,
            preview: None,
        }
    }

    // ─── Conversation ────────────────────────────────────────────────────

    /// Send the prompt. A busy session keeps the text so nothing is lost.
    pub fn submit(&mut self) {
        match self.session.submit(self.input.text()) {
            SubmitOutcome::Started { .. } => {
                self.input.take();
                self.streaming.on_submit(Instant::now());
                self.scroll.scroll_to_bottom();
            }
            SubmitOutcome::Busy => self.show_toast("Still answering (Ctrl+C stops it)"),
            SubmitOutcome::Empty => {}
        }
    }

    /// Pre-fill the prompt with example `index` (F1-F4)
    pub fn use_example(&mut self, index: usize) {
        if let Some(prompt) = EXAMPLE_PROMPTS.get(index) {
            self.input.set(prompt);
            self.focus = Focus::Input;
        }
    }

    pub fn on_stream_event(&mut self, event: StreamEvent) {
        if matches!(event, StreamEvent::Fragment(_)) {
            self.streaming.on_fragment();
        }
        if let Some(end) = self.session.apply(event) {
            self.on_session_end(end);
        }
    }

    pub fn cancel_stream(&mut self) {
        if let Some(end) = self.session.cancel() {
            self.on_session_end(end);
        }
    }

    fn on_session_end(&mut self, end: SessionEnd) {
        self.streaming.on_end();
        match end {
            SessionEnd::Completed => {}
            SessionEnd::Failed => self.show_toast("✗ Request failed (Ctrl+L shows details)"),
            SessionEnd::Cancelled => self.show_toast("Stopped"),
        }
    }

    pub fn streaming_state(&self) -> StreamingState {
        self.streaming.state()
    }

    // ─── Code blocks ─────────────────────────────────────────────────────

    /// Parse an assistant message the way the transcript shows it
    pub fn answer_document(&self, message: usize) -> Option<RenderedDocument> {
        let msg = self.session.conversation().get(message)?;
        (msg.role == Role::Assistant).then(|| markdown::render(&msg.content, &ANSWER_OPTIONS))
    }

    /// Every code block in the transcript, in display order
    pub fn code_keys(&self) -> Vec<BlockKey> {
        let conversation = self.session.conversation();
        (0..conversation.len())
            .filter_map(|i| self.answer_document(i).map(|doc| (i, doc)))
            .flat_map(|(i, doc)| {
                (0..doc.code_blocks().len()).map(move |b| BlockKey::new(i, b))
            })
            .collect()
    }

    /// Snapshot of a block's current text and kind
    pub fn code_block(&self, key: BlockKey) -> Option<CodeBlock> {
        let doc = self.answer_document(key.message)?;
        doc.code_blocks().get(key.block).map(|b| (*b).clone())
    }

    pub fn select_next_block(&mut self) {
        self.move_selection(true);
    }

    pub fn select_prev_block(&mut self) {
        self.move_selection(false);
    }

    fn move_selection(&mut self, forward: bool) {
        let keys = self.code_keys();
        if keys.is_empty() {
            self.show_toast("No code blocks yet");
            return;
        }
        let position = self
            .selected
            .and_then(|key| keys.iter().position(|k| *k == key));
        let next = match (position, forward) {
            (Some(i), true) => (i + 1).min(keys.len() - 1),
            (Some(i), false) => i.saturating_sub(1),
            (None, true) => 0,
            (None, false) => keys.len() - 1,
        };
        self.selected = Some(keys[next]);
        self.reveal_selection = true;
        self.focus = Focus::Transcript;
    }

    /// The selected block, or the newest one when nothing is selected
    pub fn target_block(&self) -> Option<BlockKey> {
        let keys = self.code_keys();
        self.selected
            .filter(|key| keys.contains(key))
            .or_else(|| keys.last().copied())
    }

    /// Copy the target block. Failures only reach the log.
    pub fn copy_block(&mut self, now: Instant) {
        let Some(key) = self.target_block() else {
            self.show_toast("No code blocks yet");
            return;
        };
        let Some(block) = self.code_block(key) else {
            return;
        };
        self.selected = Some(key);
        self.actions
            .entry(key)
            .copy(self.clipboard.as_mut(), &block.text, now);
    }

    /// Open a sandboxed preview of the target block from its current text
    pub fn preview_block(&mut self) {
        let Some(key) = self.target_block() else {
            self.show_toast("No code blocks yet");
            return;
        };
        let Some(block) = self.code_block(key) else {
            return;
        };
        self.selected = Some(key);
        if !block.actions.is_some_and(|a| a.previewable) {
            self.show_toast("Only HTML can be previewed");
            return;
        }

        self.close_preview();
        let handle = self
            .actions
            .entry(key)
            .open_preview(self.preview_surface.as_mut(), &block.text);
        match handle {
            Some(handle) => {
                self.preview = Some((key, handle));
                self.modal = Some(Modal::preview(key));
            }
            None => self.show_toast("✗ Preview failed (Ctrl+L shows details)"),
        }
    }

    /// Discard the open preview, if any
    pub fn close_preview(&mut self) {
        if let Some((key, handle)) = self.preview.take() {
            self.actions.entry(key).close_preview(Some(handle));
        }
    }

    pub fn preview_path(&self) -> Option<&std::path::Path> {
        self.preview.as_ref().map(|(_, handle)| handle.path())
    }

    pub fn code_decor(&self, key: BlockKey, now: Instant) -> CodeDecor {
        CodeDecor {
            selected: self.selected == Some(key),
            copied: self.actions.is_copied(key, now),
            preview_open: self.actions.is_preview_open(key),
        }
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// List the links of the selected answer (or the newest one)
    pub fn show_links(&mut self) {
        let message = self.selected.map(|k| k.message).or_else(|| {
            let conversation = self.session.conversation();
            (0..conversation.len())
                .rev()
                .find(|i| conversation.get(*i).is_some_and(|m| m.role == Role::Assistant))
        });
        let links = message
            .and_then(|m| self.answer_document(m))
            .map(|doc| doc.links())
            .unwrap_or_default();

        if links.is_empty() {
            self.show_toast("No links in this answer");
        } else {
            self.modal = Some(Modal::Links(links));
        }
    }

    /// Links always open outside the terminal
    pub fn open_link(&mut self, url: &str) {
        match open_external(url) {
            Ok(()) => tracing::info!(url, "Opened link"),
            Err(e) => {
                tracing::warn!("{:#}", e);
                self.show_toast("✗ Could not open link");
            }
        }
    }

    // ─── Chrome ──────────────────────────────────────────────────────────

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Transcript,
            Focus::Transcript => Focus::Input,
        };
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }
    }

    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    pub fn spinner_char(&self) -> char {
        SPINNER[self.animation_frame % SPINNER.len()]
    }
}
