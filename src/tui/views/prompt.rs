// Prompt box: the multi-line input with its cursor

use crate::tui::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const PLACEHOLDER: &str = "Describe what to build, or press F1-F4 for an example";

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let focused = app.focus == Focus::Input && app.modal.is_none();

    let title = if app.session.is_streaming() {
        " Message · answering, Ctrl+C stops "
    } else {
        " Message "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(if focused {
            theme.border_focused
        } else {
            theme.border
        }))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.input.text().is_empty() {
        f.render_widget(
            Paragraph::new(PLACEHOLDER).style(Style::default().fg(theme.muted)),
            inner,
        );
        if focused {
            f.set_cursor_position((inner.x, inner.y));
        }
        return;
    }

    // Keep the cursor inside the box: scroll down and right as needed
    let (row, col) = app.input.cursor_position();
    let height = inner.height.max(1) as usize;
    let width = inner.width.max(1) as usize;
    let top = (row + 1).saturating_sub(height);
    let left = (col + 1).saturating_sub(width);

    let lines: Vec<Line> = app.input.text().split('\n').map(Line::raw).collect();
    f.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(theme.foreground))
            .scroll((top as u16, left as u16)),
        inner,
    );

    if focused {
        f.set_cursor_position((
            inner.x + (col - left) as u16,
            inner.y + (row - top) as u16,
        ));
    }
}
