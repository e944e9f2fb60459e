//! Clipboard capability
//!
//! `SystemClipboard` uses `arboard` for cross-platform support (Windows, macOS,
//! Linux). The clipboard is created fresh for each copy so nothing holds the
//! display connection between copies.

use anyhow::{Context, Result};

/// Something that can receive copied text
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The OS clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    /// Common failure cases: no display server (headless Linux), permission denied.
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Failed to access clipboard")?;
        clipboard
            .set_text(text)
            .context("Failed to set clipboard text")?;
        Ok(())
    }
}
