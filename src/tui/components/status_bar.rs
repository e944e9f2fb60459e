// Status bar component
//
// Key hints for the focused pane plus the diagnostics counter. Hints shrink
// on narrow terminals.

use crate::tui::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Below this width only the short hints are shown
const WIDE: u16 = 100;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let wide = area.width >= WIDE;

    let hints = match (app.focus, wide) {
        (Focus::Input, true) => {
            "Enter send │ Alt+Enter newline │ F1-F4 examples │ Tab transcript │ Ctrl+C stop │ Ctrl+Q quit"
        }
        (Focus::Input, false) => "Enter send │ Tab transcript │ Ctrl+Q quit",
        (Focus::Transcript, true) => {
            "[ ] select code │ c copy │ p preview │ o links │ ↑↓ scroll │ Tab prompt │ ? help"
        }
        (Focus::Transcript, false) => "[ ] select │ c copy │ p preview │ Tab prompt",
    };

    let mut spans = vec![Span::styled(format!(" {}", hints), Style::default().fg(theme.status_bar))];

    let problems = app.log_buffer.problem_count();
    if problems > 0 {
        spans.push(Span::styled(
            format!("  ⚠ {} (Ctrl+L)", problems),
            Style::default().fg(theme.warning),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
