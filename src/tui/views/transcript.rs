// Transcript view
//
// Every frame re-renders the whole conversation from the messages: user turns
// literally, assistant turns through the markdown renderer. The streaming
// answer is just the last message, so partial markdown shows up as it lands.

use super::welcome;
use crate::actions::BlockKey;
use crate::chat::Role;
use crate::markdown;
use crate::tui::app::{App, Focus, ANSWER_OPTIONS};
use crate::tui::components::scrollbar::render_scrollbar;
use crate::tui::markdown::{document_lines, literal_lines};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::collections::HashMap;
use std::time::Instant;

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = &app.theme;
    let focused = app.focus == Focus::Transcript && app.modal.is_none();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(if focused {
            theme.border_focused
        } else {
            theme.border
        }))
        .title(" Conversation ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.session.conversation().is_empty() {
        welcome::render(f, inner, app);
        return;
    }

    // One column stays free for the scrollbar
    let width = inner.width.saturating_sub(1) as usize;
    let (lines, anchors) = transcript_lines(app, width, Instant::now());

    let viewport = inner.height as usize;
    app.scroll.update_dimensions(lines.len(), viewport);
    if app.reveal_selection {
        if let Some(line) = app.selected.and_then(|key| anchors.get(&key)) {
            app.scroll.reveal(*line);
        }
        app.reveal_selection = false;
    }

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(app.scroll.offset())
        .take(viewport)
        .collect();
    f.render_widget(Paragraph::new(visible), inner);
    render_scrollbar(f, inner, &app.scroll);
}

/// All transcript lines plus the header line of every code block
fn transcript_lines(
    app: &App,
    width: usize,
    now: Instant,
) -> (Vec<Line<'static>>, HashMap<BlockKey, usize>) {
    let theme = &app.theme;
    let streaming_slot = app.session.streaming_slot();
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut anchors = HashMap::new();

    for (i, message) in app.session.conversation().messages().iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }

        match message.role {
            Role::User => {
                lines.push(role_header("You", Style::default().fg(theme.user)));
                lines.extend(literal_lines(
                    &message.content,
                    width,
                    Style::default().fg(theme.foreground),
                ));
            }
            Role::Assistant => {
                lines.push(role_header("Assistant", Style::default().fg(theme.assistant)));
                let streaming = streaming_slot == Some(i);

                if message.content.is_empty() && streaming {
                    lines.push(Line::from(Span::styled(
                        format!("{} Thinking...", app.spinner_char()),
                        Style::default().fg(theme.muted),
                    )));
                    continue;
                }

                let doc = markdown::render(&message.content, &ANSWER_OPTIONS);
                let rendered = document_lines(&doc, width, theme, &app.highlight_theme, &|block| {
                    app.code_decor(BlockKey::new(i, block), now)
                });

                let base = lines.len();
                for (block, anchor) in rendered.code_anchors.iter().enumerate() {
                    anchors.insert(BlockKey::new(i, block), base + anchor);
                }
                lines.extend(rendered.lines);

                if streaming {
                    if let Some(last) = lines.last_mut() {
                        last.spans.push(Span::styled("▍", Style::default().fg(theme.assistant)));
                    }
                }
            }
        }
    }

    (lines, anchors)
}

fn role_header(label: &'static str, style: Style) -> Line<'static> {
    Line::from(Span::styled(
        format!("▌ {}", label),
        style.add_modifier(Modifier::BOLD),
    ))
}
