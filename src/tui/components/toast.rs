//! Toast notification component
//!
//! A non-blocking overlay that dismisses itself after two seconds. Renders
//! in the bottom-right corner on top of everything else, modals included.

use crate::theme::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const TOAST_DURATION: Duration = Duration::from_secs(2);

pub struct Toast {
    pub message: String,
    created_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= TOAST_DURATION
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        // Text plus one cell of padding and a border on each side
        let width = (self.message.width() as u16 + 4).min(area.width.saturating_sub(4));
        let height = 3;

        let x = area.right().saturating_sub(width + 2);
        let y = area.bottom().saturating_sub(height + 3);
        let toast_area = Rect::new(x, y, width, height).intersection(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border_focused))
            .style(Style::default().bg(theme.background));

        let text = Paragraph::new(self.message.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.foreground))
            .block(block);

        f.render_widget(Clear, toast_area);
        f.render_widget(text, toast_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_toast_is_visible() {
        let toast = Toast::new("Copied");
        assert!(!toast.is_expired());
        assert_eq!(toast.message, "Copied");
    }

    #[test]
    fn test_old_toast_expires() {
        let mut toast = Toast::new("Stopped");
        if let Some(past) = Instant::now().checked_sub(TOAST_DURATION) {
            toast.created_at = past;
            assert!(toast.is_expired());
        }
    }
}
