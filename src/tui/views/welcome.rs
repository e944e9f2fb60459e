// Welcome screen, shown until the first message is sent

use crate::chat::EXAMPLE_PROMPTS;
use crate::tui::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let mut lines = vec![
        Line::from(Span::styled(
            "Hi there 👋",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "What can I help you with?",
            Style::default().fg(theme.foreground),
        )),
        Line::default(),
    ];
    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("F{}  ", i + 1), Style::default().fg(theme.warning)),
            Span::styled(*prompt, Style::default().fg(theme.foreground)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Pick an example or type your own. Code blocks in answers can be copied and HTML previewed.",
        Style::default().fg(theme.muted),
    )));

    let height = lines.len() as u16;
    let top = area.y + area.height.saturating_sub(height) / 2;
    let centered = Rect::new(area.x, top, area.width, height.min(area.height));

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        centered,
    );
}
