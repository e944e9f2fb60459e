// Views - screen layout and rendering
//
// One screen: title bar, transcript (or the welcome screen before the first
// message), prompt, status bar. Modals and the toast draw on top.

mod modal;
mod prompt;
mod transcript;
mod welcome;

use super::app::App;
use crate::tui::components::{status_bar, title_bar};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::Frame;

/// Tallest the prompt box grows before it scrolls
const MAX_PROMPT_LINES: usize = 6;

/// Main render function, called on every frame
pub fn draw(f: &mut Frame, app: &mut App) {
    let bg_block = Block::default().style(Style::default().bg(app.theme.background));
    f.render_widget(bg_block, f.area());

    let prompt_height = app.input.line_count().clamp(1, MAX_PROMPT_LINES) as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(prompt_height),
            Constraint::Length(1),
        ])
        .split(f.area());

    title_bar::render(f, chunks[0], app);
    transcript::render(f, chunks[1], app);
    prompt::render(f, chunks[2], app);
    status_bar::render(f, chunks[3], app);

    if let Some(modal) = app.modal.take() {
        modal::render(f, &modal, app);
        app.modal = Some(modal);
    }

    if let Some(ref toast) = app.toast {
        let area = f.area();
        toast.render(f, area, &app.theme);
    }

    app.clear_expired_toast();
}
