// Code block actions: copy to clipboard and HTML preview
//
// State here is per rendered code block and purely ephemeral. It is keyed by
// (message index, code block index) and never touches the conversation, so a
// re-render that reorders or drops blocks only costs a stale "Copied!" label.

mod clipboard;
mod preview;

pub use clipboard::{Clipboard, SystemClipboard};
pub use preview::{open_external, BrowserPreview, PreviewHandle, PreviewSurface};

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long "Copied!" stays up after the most recent successful copy
pub const COPY_FEEDBACK: Duration = Duration::from_millis(2000);

/// Identifies a code block across render passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub message: usize,
    pub block: usize,
}

impl BlockKey {
    pub fn new(message: usize, block: usize) -> Self {
        Self { message, block }
    }
}

/// Copy/preview state for one code block
#[derive(Debug, Clone, Default)]
pub struct CodeActionState {
    copied_at: Option<Instant>,
    preview_open: bool,
}

impl CodeActionState {
    /// True until COPY_FEEDBACK has passed since the latest successful copy
    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_FEEDBACK)
            .unwrap_or(false)
    }

    pub fn is_preview_open(&self) -> bool {
        self.preview_open
    }

    /// Copy `text`. Success (re)starts the feedback window; failure is logged
    /// and leaves the state as it was.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, text: &str, now: Instant) -> bool {
        match clipboard.set_text(text) {
            Ok(()) => {
                self.copied_at = Some(now);
                tracing::debug!(bytes = text.len(), "Copied code block");
                true
            }
            Err(e) => {
                tracing::warn!("Copy failed: {:#}", e);
                false
            }
        }
    }

    /// Open a preview of `text`. Only call for previewable blocks.
    pub fn open_preview(
        &mut self,
        surface: &mut dyn PreviewSurface,
        text: &str,
    ) -> Option<PreviewHandle> {
        match surface.open(text) {
            Ok(handle) => {
                self.preview_open = true;
                tracing::info!(path = %handle.path().display(), "Preview opened");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!("Preview failed: {:#}", e);
                None
            }
        }
    }

    /// Close the preview; dropping the handle discards the rendered document
    pub fn close_preview(&mut self, handle: Option<PreviewHandle>) {
        self.preview_open = false;
        drop(handle);
    }
}

/// All action state for the session
#[derive(Debug, Default)]
pub struct CodeActionBook {
    states: HashMap<BlockKey, CodeActionState>,
}

impl CodeActionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `key`, if the block was ever acted on
    pub fn get(&self, key: BlockKey) -> Option<&CodeActionState> {
        self.states.get(&key)
    }

    pub fn entry(&mut self, key: BlockKey) -> &mut CodeActionState {
        self.states.entry(key).or_default()
    }

    pub fn is_copied(&self, key: BlockKey, now: Instant) -> bool {
        self.get(key).map(|s| s.is_copied(now)).unwrap_or(false)
    }

    pub fn is_preview_open(&self, key: BlockKey) -> bool {
        self.get(key).map(|s| s.is_preview_open()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::preview::preview_document;
    use anyhow::{anyhow, Result};
    use std::path::Path;

    #[derive(Default)]
    struct RecordingClipboard {
        contents: Option<String>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("no display"));
            }
            self.contents = Some(text.to_string());
            Ok(())
        }
    }

    struct FakeSurface {
        dir: tempfile::TempDir,
        opened: Vec<String>,
    }

    impl PreviewSurface for FakeSurface {
        fn open(&mut self, html: &str) -> Result<PreviewHandle> {
            self.opened.push(html.to_string());
            let inner = tempfile::tempdir_in(self.dir.path())?;
            let path = inner.path().join("preview.html");
            std::fs::write(&path, preview_document(html))?;
            Ok(PreviewHandle::new(inner, path))
        }
    }

    #[test]
    fn test_copy_feedback_reverts_after_window() {
        let mut clipboard = RecordingClipboard::default();
        let mut state = CodeActionState::default();
        let t0 = Instant::now();

        assert!(state.copy(&mut clipboard, "let x = 1;", t0));

        assert_eq!(clipboard.contents.as_deref(), Some("let x = 1;"));
        assert!(state.is_copied(t0 + Duration::from_millis(1999)));
        assert!(!state.is_copied(t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_repeat_copy_restarts_window() {
        let mut clipboard = RecordingClipboard::default();
        let mut state = CodeActionState::default();
        let t0 = Instant::now();

        state.copy(&mut clipboard, "a", t0);
        state.copy(&mut clipboard, "a", t0 + Duration::from_millis(1500));

        // Would have reverted at t0+2000 without the second copy
        assert!(state.is_copied(t0 + Duration::from_millis(3000)));
        assert!(!state.is_copied(t0 + Duration::from_millis(3500)));
    }

    #[test]
    fn test_failed_copy_leaves_state_unchanged() {
        let mut clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let mut state = CodeActionState::default();
        let t0 = Instant::now();

        assert!(!state.copy(&mut clipboard, "x", t0));
        assert!(!state.is_copied(t0));
    }

    #[test]
    fn test_preview_open_and_close_discards_document() {
        let mut surface = FakeSurface {
            dir: tempfile::tempdir().unwrap(),
            opened: Vec::new(),
        };
        let mut state = CodeActionState::default();

        let handle = state
            .open_preview(&mut surface, "<h1>hi</h1>")
            .expect("preview opens");
        let path = handle.path().to_path_buf();
        assert!(state.is_preview_open());
        assert!(path.exists());

        state.close_preview(Some(handle));
        assert!(!state.is_preview_open());
        assert!(!Path::new(&path).exists());

        // Re-opening renders the current text again
        let handle = state.open_preview(&mut surface, "<h1>v2</h1>");
        assert!(handle.is_some());
        assert_eq!(surface.opened, vec!["<h1>hi</h1>", "<h1>v2</h1>"]);
    }

    #[test]
    fn test_book_tracks_blocks_independently() {
        let mut clipboard = RecordingClipboard::default();
        let mut book = CodeActionBook::new();
        let t0 = Instant::now();
        let a = BlockKey::new(1, 0);
        let b = BlockKey::new(1, 1);

        book.entry(a).copy(&mut clipboard, "a", t0);

        assert!(book.is_copied(a, t0));
        assert!(!book.is_copied(b, t0));
        assert!(!book.is_copied(a, t0 + COPY_FEEDBACK));
    }
}
