// Modal overlay rendering
//
// - Help: key bindings
// - Diagnostics: recent log lines (Ctrl+L)
// - Links: numbered links of an answer
// - Preview: where the sandboxed preview was written, plus the source

use crate::logging::LogLevel;
use crate::markdown::CodeBlock;
use crate::theme::Theme;
use crate::tui::app::App;
use crate::tui::components::scrollbar::render_scrollbar;
use crate::tui::highlight;
use crate::tui::markdown::sanitize_for_tui;
use crate::tui::modal::Modal;
use crate::tui::scroll::ScrollState;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Log lines pulled into the diagnostics overlay
const DIAGNOSTIC_LINES: usize = 500;

pub fn render(f: &mut Frame, modal: &Modal, app: &App) {
    match modal {
        Modal::Help => render_help(f, app),
        Modal::Diagnostics { scroll } => render_diagnostics(f, app, *scroll),
        Modal::Links(links) => render_links(f, app, links),
        Modal::Preview { key, scroll } => render_preview(f, app, *key, *scroll),
    }
}

/// Calculate centered rect for a modal
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Nearly full screen, for scrollable content
fn large_rect(area: Rect) -> Rect {
    let width = (u32::from(area.width) * 90 / 100).max(60) as u16;
    let height = (u32::from(area.height) * 85 / 100).max(16) as u16;
    centered_rect(width, height, area)
}

fn modal_block<'a>(app: &App, title: String, hint: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border_focused))
        .style(Style::default().bg(app.theme.background))
        .title(title)
        .title_bottom(Line::from(hint).centered())
}

/// Scrollable body: clamps the requested offset and draws a scrollbar
fn render_scrolled(f: &mut Frame, area: Rect, block: Block, lines: Vec<Line<'static>>, offset: usize) {
    f.render_widget(Clear, area);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut scroll = ScrollState::new();
    scroll.auto_follow = false;
    scroll.update_dimensions(lines.len(), inner.height as usize);
    scroll.scroll_down(offset);

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(scroll.offset())
        .take(inner.height as usize)
        .collect();
    f.render_widget(Paragraph::new(visible), inner);
    render_scrollbar(f, inner, &scroll);
}

fn render_help(f: &mut Frame, app: &App) {
    let key_style = Style::default().fg(app.theme.warning);
    let desc_style = Style::default().fg(app.theme.foreground);
    let header_style = Style::default()
        .fg(app.theme.title)
        .add_modifier(Modifier::BOLD);

    let kb = |key: &str, desc: &str| -> Line {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{:<14}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let content = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled("  Prompt", header_style)),
        kb("Enter", "Send message"),
        kb("Alt/Shift+Enter", "New line"),
        kb("F1-F4", "Use an example prompt"),
        kb("Ctrl+U", "Clear line"),
        kb("Ctrl+C", "Stop the answer"),
        Line::raw(""),
        Line::from(Span::styled("  Transcript", header_style)),
        kb("Tab", "Switch prompt / transcript"),
        kb("↑/↓, PgUp/PgDn", "Scroll"),
        kb("Home/End", "Jump to start / end"),
        kb("[ / ]", "Select previous / next code block"),
        kb("c", "Copy code block"),
        kb("p", "Preview HTML in browser"),
        kb("o", "Open a link"),
        Line::raw(""),
        Line::from(Span::styled("  General", header_style)),
        kb("?", "Toggle this help"),
        kb("Ctrl+L", "Diagnostics log"),
        kb("Esc", "Close / back to prompt"),
        kb("Ctrl+Q", "Quit"),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  Theme: ", desc_style),
            Span::styled(app.theme.name.clone(), key_style),
            Span::styled("  Code: ", desc_style),
            Span::styled(app.highlight_theme.clone(), key_style),
        ]),
        Line::from(Span::styled(
            format!("  Themes: {}", crate::theme::THEME_NAMES.join(", ")),
            Style::default().fg(app.theme.muted),
        )),
    ]);

    let area = centered_rect(56, 29, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(content).block(modal_block(
            app,
            " Help ".to_string(),
            " Press ? or Esc to close ",
        )),
        area,
    );
}

fn render_diagnostics(f: &mut Frame, app: &App, offset: usize) {
    let theme = &app.theme;
    let entries = app.log_buffer.recent(DIAGNOSTIC_LINES);

    let lines: Vec<Line<'static>> = if entries.is_empty() {
        vec![Line::from(Span::styled(
            "No log entries yet",
            Style::default().fg(theme.muted),
        ))]
    } else {
        entries
            .iter()
            .map(|entry| {
                let level_color = match entry.level {
                    LogLevel::Error => theme.error,
                    LogLevel::Warn => theme.warning,
                    LogLevel::Info => theme.success,
                    LogLevel::Debug | LogLevel::Trace => theme.muted,
                };
                Line::from(vec![
                    Span::styled(
                        entry.timestamp.format("%H:%M:%S ").to_string(),
                        Style::default().fg(theme.muted),
                    ),
                    Span::styled(
                        format!("{:<5} ", entry.level.as_str()),
                        Style::default().fg(level_color),
                    ),
                    Span::styled(format!("{} ", entry.target), Style::default().fg(theme.muted)),
                    Span::styled(
                        sanitize_for_tui(&entry.message),
                        Style::default().fg(theme.foreground),
                    ),
                ])
            })
            .collect()
    };

    let title = format!(" Diagnostics ({} entries) ", app.log_buffer.len());
    let block = modal_block(app, title, " ↑↓ scroll  PgUp/Dn page  Esc close ");
    let area = large_rect(f.area());
    render_scrolled(f, area, block, lines, offset);
}

fn render_links(f: &mut Frame, app: &App, links: &[(String, String)]) {
    let lines = link_lines(&app.theme, links);

    let height = lines.len() as u16 + 2;
    let area = centered_rect(f.area().width.saturating_sub(8).min(90), height, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(modal_block(
            app,
            " Links ".to_string(),
            " 1-9 open in browser  Esc close ",
        )),
        area,
    );
}

/// Numbered link list. Labels and targets come from model output.
fn link_lines(theme: &Theme, links: &[(String, String)]) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw("")];
    for (i, (label, url)) in links.iter().enumerate().take(9) {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", i + 1), Style::default().fg(theme.warning)),
            Span::styled(sanitize_for_tui(label), Style::default().fg(theme.foreground)),
            Span::styled(
                format!("  {}", sanitize_for_tui(url)),
                Style::default().fg(theme.link),
            ),
        ]));
    }
    lines.push(Line::raw(""));
    lines
}

fn render_preview(f: &mut Frame, app: &App, key: crate::actions::BlockKey, offset: usize) {
    let theme = &app.theme;
    let muted = Style::default().fg(theme.muted);

    let mut lines: Vec<Line<'static>> = Vec::new();
    match app.preview_path() {
        Some(path) => {
            lines.push(Line::from(vec![
                Span::styled("Opened in your browser: ", muted),
                Span::styled(path.display().to_string(), Style::default().fg(theme.link)),
            ]));
        }
        None => lines.push(Line::from(Span::styled("Preview closed", muted))),
    }
    lines.push(Line::from(Span::styled(
        "Sandboxed: scripts run, but no same-origin access, forms, popups or navigation.",
        muted,
    )));
    lines.push(Line::raw(""));

    if let Some(block) = app.code_block(key) {
        lines.extend(excerpt_lines(theme, &app.highlight_theme, &block));
    }

    let block = modal_block(
        app,
        " HTML Preview ".to_string(),
        " ↑↓ scroll  Esc close (discards the preview) ",
    );
    let area = large_rect(f.area());
    render_scrolled(f, area, block, lines, offset);
}

/// Highlighted source with a line-number gutter
fn excerpt_lines(theme: &Theme, highlight_theme: &str, block: &CodeBlock) -> Vec<Line<'static>> {
    let highlighted = highlight::highlight(&block.text, &block.kind, highlight_theme);
    let gutter = highlighted.len().to_string().len();
    highlighted
        .into_iter()
        .enumerate()
        .map(|(n, spans)| {
            let mut line = vec![Span::styled(
                format!("{:>w$} ", n + 1, w = gutter),
                Style::default().fg(theme.code_gutter),
            )];
            line.extend(spans.into_iter().map(|span| {
                let text = sanitize_for_tui(&span.content).replace('\t', "    ");
                Span::styled(text, span.style)
            }));
            Line::from(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{render, RenderOptions};

    fn has_control(lines: &[Line]) -> bool {
        lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .any(|s| s.content.chars().any(|c| c.is_control()))
    }

    #[test]
    fn test_link_list_drops_escape_sequences() {
        let links = vec![(
            "label\x1b[2J".to_string(),
            "http://x/\x1b]0;title\x07".to_string(),
        )];
        let lines = link_lines(&Theme::dark(), &links);
        assert!(!has_control(&lines));
        let text: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("label"));
        assert!(text.contains("http://x/"));
    }

    #[test]
    fn test_preview_excerpt_drops_escape_sequences() {
        let doc = render(
            "```html\n<p>\x1b[31mred</p>\n\t<b>x</b>\n```",
            &RenderOptions { code_actions: true },
        );
        let block = doc.code_blocks()[0].clone();
        let lines = excerpt_lines(&Theme::dark(), "base16-ocean.dark", &block);
        assert_eq!(lines.len(), 2);
        assert!(!has_control(&lines));
    }

    #[test]
    fn test_large_rect_on_huge_terminal() {
        let area = Rect::new(0, 0, 2000, 1000);
        let rect = large_rect(area);
        assert_eq!(rect.width, 1800);
        assert_eq!(rect.height, 850);

        let small = large_rect(Rect::new(0, 0, 40, 10));
        assert_eq!((small.width, small.height), (40, 10));
    }
}
