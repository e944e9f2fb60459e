// Title bar component
//
// App name, backend and model, and the streaming indicator while an answer
// is in flight.

use crate::tui::app::App;
use crate::tui::streaming::StreamingState;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Instant;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let backend = app.session.backend();

    let elapsed = app
        .streaming
        .elapsed(Instant::now())
        .map(|d| format!(" {:.1}s", d.as_secs_f32()))
        .unwrap_or_default();
    let indicator = match app.streaming_state() {
        StreamingState::Idle => String::new(),
        StreamingState::Waiting => format!("  {} waiting{}", app.spinner_char(), elapsed),
        StreamingState::Streaming => format!(
            "  {} streaming · {} chunks{}",
            app.spinner_char(),
            app.streaming.fragments(),
            elapsed
        ),
    };

    let line = Line::from(vec![
        Span::styled(
            " chatmark",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} · {}", backend.name(), backend.model()),
            Style::default().fg(theme.muted),
        ),
        Span::styled(indicator, Style::default().fg(theme.warning)),
    ]);

    let title = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border))
            .title_top(Line::from(" ? help ").right_aligned()),
    );

    f.render_widget(title, area);
}
