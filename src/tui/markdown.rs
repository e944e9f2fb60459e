// Terminal rendering of markdown block trees
//
// `markdown::render` decides structure; this module turns that tree into
// ratatui lines for a given width. Each block type has one fixed treatment:
// - Headings: bold, tier color, H1 underlined
// - Lists: two columns of indent per depth, `•` / `N.` markers
// - Quotes: `│ ` rule, italic
// - Tables: box-drawn, clipped to the available width
// - Code: framed, syntect-highlighted, header with the copy/preview controls
//
// Output also records where each code block's header landed so the
// transcript can scroll a selected block into view.

use super::highlight;
use crate::markdown::{plain_text, Block, CodeBlock, Inline, RenderedDocument};
use crate::theme::Theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Narrowest layout we try to wrap into
const MIN_WIDTH: usize = 12;

/// Per-block control state shown in a code header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeDecor {
    pub selected: bool,
    pub copied: bool,
    pub preview_open: bool,
}

/// Rendered lines plus the line index of every code block header, in
/// document order
#[derive(Debug, Default)]
pub struct MessageLines {
    pub lines: Vec<Line<'static>>,
    pub code_anchors: Vec<usize>,
}

impl MessageLines {
    fn append(&mut self, other: MessageLines) {
        let base = self.lines.len();
        self.code_anchors
            .extend(other.code_anchors.into_iter().map(|a| a + base));
        self.lines.extend(other.lines);
    }

    fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    /// Prefix the first line with `first` and the rest with `rest`
    fn indent(mut self, first: Span<'static>, rest: Span<'static>) -> Self {
        for (i, line) in self.lines.iter_mut().enumerate() {
            let prefix = if i == 0 { first.clone() } else { rest.clone() };
            line.spans.insert(0, prefix);
        }
        self
    }
}

/// Render an assistant answer. `decor` is asked for the state of each code
/// block by its document-order index.
pub fn document_lines(
    doc: &RenderedDocument,
    width: usize,
    theme: &Theme,
    highlight_theme: &str,
    decor: &dyn Fn(usize) -> CodeDecor,
) -> MessageLines {
    let mut renderer = LineRenderer {
        theme,
        highlight_theme,
        decor,
        next_code: 0,
    };
    renderer.blocks(&doc.blocks, width.max(MIN_WIDTH), true)
}

/// User text is shown as typed: every line kept, long lines hard-wrapped
pub fn literal_lines(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let width = width.max(MIN_WIDTH);
    let mut lines = Vec::new();
    for raw in sanitize_for_tui(text).split('\n') {
        let mut current = String::new();
        let mut used = 0;
        for ch in raw.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width && !current.is_empty() {
                lines.push(Line::from(Span::styled(std::mem::take(&mut current), style)));
                used = 0;
            }
            current.push(ch);
            used += w;
        }
        lines.push(Line::from(Span::styled(current, style)));
    }
    lines
}

struct LineRenderer<'a> {
    theme: &'a Theme,
    highlight_theme: &'a str,
    decor: &'a dyn Fn(usize) -> CodeDecor,
    next_code: usize,
}

impl LineRenderer<'_> {
    /// Blocks separated by a blank line, or packed together for tight list items
    fn blocks(&mut self, blocks: &[Block], width: usize, spaced: bool) -> MessageLines {
        let mut out = MessageLines::default();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 && spaced {
                out.push(Line::default());
            }
            let rendered = self.block(block, width);
            out.append(rendered);
        }
        out
    }

    fn block(&mut self, block: &Block, width: usize) -> MessageLines {
        match block {
            Block::Heading { level, content } => {
                let mut style = Style::default()
                    .fg(self.theme.heading_color(*level))
                    .add_modifier(Modifier::BOLD);
                if *level == 1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.paragraph(content, width, style)
            }
            Block::Paragraph(content) => {
                self.paragraph(content, width, Style::default().fg(self.theme.foreground))
            }
            Block::List { start, items } => self.list(*start, items, width),
            Block::BlockQuote(children) => {
                let inner = self.blocks(children, width.saturating_sub(2).max(MIN_WIDTH), true);
                let rule = Span::styled("│ ", Style::default().fg(self.theme.quote));
                let mut quoted = inner.indent(rule.clone(), rule);
                for line in &mut quoted.lines {
                    for span in line.spans.iter_mut().skip(1) {
                        span.style = span.style.add_modifier(Modifier::ITALIC);
                    }
                }
                quoted
            }
            Block::Table { header, rows } => self.table(header, rows, width),
            Block::Rule => MessageLines {
                lines: vec![Line::from(Span::styled(
                    "─".repeat(width),
                    Style::default().fg(self.theme.border),
                ))],
                code_anchors: Vec::new(),
            },
            Block::Code(code) => self.code(code, width),
            Block::Html(raw) => MessageLines {
                lines: literal_lines(raw.trim_end(), width, Style::default().fg(self.theme.muted)),
                code_anchors: Vec::new(),
            },
        }
    }

    fn paragraph(&self, content: &[Inline], width: usize, base: Style) -> MessageLines {
        let mut pieces = Vec::new();
        self.inline_pieces(content, base, &mut pieces);
        MessageLines {
            lines: wrap_pieces(&pieces, width),
            code_anchors: Vec::new(),
        }
    }

    fn inline_pieces(&self, inlines: &[Inline], base: Style, out: &mut Vec<Piece>) {
        for inline in inlines {
            match inline {
                Inline::Text(text) => out.push(Piece::new(sanitize_for_tui(text), base)),
                Inline::Code(code) => out.push(Piece::new(
                    sanitize_for_tui(code),
                    base.fg(self.theme.code_inline),
                )),
                Inline::Emphasis(children) => {
                    self.inline_pieces(children, base.add_modifier(Modifier::ITALIC), out)
                }
                Inline::Strong(children) => {
                    self.inline_pieces(children, base.add_modifier(Modifier::BOLD), out)
                }
                Inline::Strikethrough(children) => {
                    self.inline_pieces(children, base.add_modifier(Modifier::CROSSED_OUT), out)
                }
                Inline::Link { url, children } => {
                    let style = base
                        .fg(self.theme.link)
                        .add_modifier(Modifier::UNDERLINED);
                    self.inline_pieces(children, style, out);
                    if plain_text(children) != *url {
                        out.push(Piece::new(
                            format!(" ({})", sanitize_for_tui(url)),
                            Style::default().fg(self.theme.muted),
                        ));
                    }
                }
                Inline::Image { src, alt } => out.push(Piece::new(
                    format!("[image: {}]({})", sanitize_for_tui(alt), sanitize_for_tui(src)),
                    Style::default().fg(self.theme.muted),
                )),
                Inline::SoftBreak => out.push(Piece::new(" ".to_string(), base)),
                Inline::HardBreak => out.push(Piece::new("\n".to_string(), base)),
            }
        }
    }

    fn list(&mut self, start: Option<u64>, items: &[Vec<Block>], width: usize) -> MessageLines {
        let marker_style = Style::default().fg(self.theme.muted);
        let mut out = MessageLines::default();

        for (i, item) in items.iter().enumerate() {
            let marker = match start {
                Some(n) => format!("{}. ", n + i as u64),
                None => "• ".to_string(),
            };
            let indent = marker.width().max(2);
            let inner = self.blocks(item, width.saturating_sub(indent).max(MIN_WIDTH), false);
            let inner = if inner.lines.is_empty() {
                MessageLines {
                    lines: vec![Line::default()],
                    code_anchors: Vec::new(),
                }
            } else {
                inner
            };
            out.append(inner.indent(
                Span::styled(marker, marker_style),
                Span::raw(" ".repeat(indent)),
            ));
        }
        out
    }

    fn table(&self, header: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>], width: usize) -> MessageLines {
        let cell_text = |cells: &[Vec<Inline>]| -> Vec<String> {
            cells
                .iter()
                .map(|c| sanitize_for_tui(&plain_text(c)).replace('\n', " "))
                .collect()
        };
        let header = cell_text(header);
        let rows: Vec<Vec<String>> = rows.iter().map(|r| cell_text(r)).collect();

        let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
        let mut widths = vec![3usize; columns];
        for row in std::iter::once(&header).chain(rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let border = Style::default().fg(self.theme.border);
        let rule = |left: &str, mid: &str, right: &str| -> Line<'static> {
            let body: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            let text = format!("{}─{}─{}", left, body.join(&format!("─{}─", mid)), right);
            Line::from(clip_spans(vec![Span::styled(text, border)], width))
        };
        let row_line = |cells: &[String], style: Style| -> Line<'static> {
            let mut spans = vec![Span::styled("│ ", border)];
            for (i, w) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = " ".repeat(w.saturating_sub(cell.width()));
                spans.push(Span::styled(format!("{}{}", cell, pad), style));
                spans.push(Span::styled(if i + 1 == widths.len() { " │" } else { " │ " }, border));
            }
            Line::from(clip_spans(spans, width))
        };

        let header_style = Style::default()
            .fg(self.theme.title)
            .add_modifier(Modifier::BOLD);
        let body_style = Style::default().fg(self.theme.foreground);

        let mut lines = vec![rule("┌", "┬", "┐"), row_line(&header, header_style), rule("├", "┼", "┤")];
        lines.extend(rows.iter().map(|row| row_line(row, body_style)));
        lines.push(rule("└", "┴", "┘"));

        MessageLines {
            lines,
            code_anchors: Vec::new(),
        }
    }

    fn code(&mut self, code: &CodeBlock, width: usize) -> MessageLines {
        let index = self.next_code;
        self.next_code += 1;
        let decor = (self.decor)(index);
        let theme = self.theme;

        let frame_style = if decor.selected {
            Style::default().fg(theme.border_focused)
        } else {
            Style::default().fg(theme.code_header)
        };

        // Header: ╭─ lang ───── Copy code · Preview
        let label = code.language.as_deref().unwrap_or("text");
        let label_style = if decor.selected {
            Style::default().bg(theme.selection).fg(theme.selection_fg)
        } else {
            frame_style
        };
        let mut header = vec![
            Span::styled("╭─ ", frame_style),
            Span::styled(
                label.to_string(),
                label_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ", frame_style),
        ];
        let mut controls: Vec<Span<'static>> = Vec::new();
        if let Some(actions) = code.actions {
            if decor.copied {
                controls.push(Span::styled(
                    "✓ Copied!",
                    Style::default()
                        .fg(theme.success)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                controls.push(Span::styled("Copy code", Style::default().fg(theme.muted)));
            }
            if actions.previewable {
                controls.push(Span::styled(" · ", Style::default().fg(theme.muted)));
                let text = if decor.preview_open { "Previewing" } else { "Preview" };
                controls.push(Span::styled(text, Style::default().fg(theme.link)));
            }
            controls.push(Span::raw(" "));
        }
        let used: usize = header
            .iter()
            .chain(controls.iter())
            .map(|s| s.content.width())
            .sum();
        header.push(Span::styled("─".repeat(width.saturating_sub(used).max(1)), frame_style));
        header.extend(controls);

        let mut out = MessageLines::default();
        out.code_anchors.push(0);
        out.push(Line::from(clip_spans(header, width)));

        let highlighted = highlight::highlight(&code.text, &code.kind, self.highlight_theme);
        let gutter_width = highlighted.len().to_string().len();
        for (n, spans) in highlighted.into_iter().enumerate() {
            let mut line = vec![Span::styled("│ ", frame_style)];
            if code.show_line_numbers() {
                line.push(Span::styled(
                    format!("{:>w$} ", n + 1, w = gutter_width),
                    Style::default().fg(theme.code_gutter),
                ));
            }
            line.extend(spans.into_iter().map(|span| {
                let text = sanitize_for_tui(&span.content).replace('\t', "    ");
                Span::styled(text, span.style)
            }));
            out.push(Line::from(clip_spans(line, width)));
        }
        out.push(Line::from(Span::styled(
            format!("╰{}", "─".repeat(width.saturating_sub(1))),
            frame_style,
        )));
        out
    }
}

/// A run of text sharing one style, before wrapping
struct Piece {
    text: String,
    style: Style,
}

impl Piece {
    fn new(text: String, style: Style) -> Self {
        Self { text, style }
    }
}

/// Word-wrap styled pieces into lines. Whitespace runs collapse to one space
/// and are dropped at line starts; `\n` forces a break; words wider than
/// the line are split.
fn wrap_pieces(pieces: &[Piece], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;

    let flush = |lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>, used: &mut usize| {
        while spans.last().is_some_and(|s| s.content == " ") {
            spans.pop();
        }
        lines.push(Line::from(std::mem::take(spans)));
        *used = 0;
    };

    for piece in pieces {
        for token in tokens(&piece.text) {
            match token {
                Token::Break => flush(&mut lines, &mut spans, &mut used),
                Token::Space => {
                    if used > 0 && used < width {
                        spans.push(Span::styled(" ", piece.style));
                        used += 1;
                    }
                }
                Token::Word(word) => {
                    let w = word.width();
                    if used > 0 && used + w > width {
                        flush(&mut lines, &mut spans, &mut used);
                    }
                    if w <= width {
                        spans.push(Span::styled(word.to_string(), piece.style));
                        used += w;
                        continue;
                    }
                    let mut chunk = String::new();
                    for ch in word.chars() {
                        let cw = ch.width().unwrap_or(0);
                        if used + cw > width {
                            spans.push(Span::styled(std::mem::take(&mut chunk), piece.style));
                            flush(&mut lines, &mut spans, &mut used);
                        }
                        chunk.push(ch);
                        used += cw;
                    }
                    if !chunk.is_empty() {
                        spans.push(Span::styled(chunk, piece.style));
                    }
                }
            }
        }
    }
    if !spans.is_empty() || lines.is_empty() {
        flush(&mut lines, &mut spans, &mut used);
    }
    lines
}

enum Token<'a> {
    Word(&'a str),
    Space,
    Break,
}

fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut word_start = None;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                out.push(Token::Word(&text[start..i]));
            }
            if ch == '\n' {
                out.push(Token::Break);
            } else if !matches!(out.last(), Some(Token::Space)) {
                out.push(Token::Space);
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        out.push(Token::Word(&text[start..]));
    }
    out
}

/// Cut spans off at `width` display columns
fn clip_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Span<'static>> {
    let mut out = Vec::with_capacity(spans.len());
    let mut used = 0usize;
    for span in spans {
        let w = span.content.width();
        if used + w <= width {
            used += w;
            out.push(span);
            continue;
        }
        let mut text = String::new();
        for ch in span.content.chars() {
            let cw = ch.width().unwrap_or(0);
            if used + cw > width {
                break;
            }
            used += cw;
            text.push(ch);
        }
        if !text.is_empty() {
            out.push(Span::styled(text, span.style));
        }
        break;
    }
    out
}

/// Strip terminal escape sequences and control characters (tab and newline
/// survive) so model output cannot repaint the screen
pub fn sanitize_for_tui(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\t' | '\n' => out.push(ch),
            c if c.is_control() => {}
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{render, RenderOptions};

    const ACTIONS: RenderOptions = RenderOptions { code_actions: true };

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn lines_for(content: &str, width: usize, decor: CodeDecor) -> MessageLines {
        let doc = render(content, &ACTIONS);
        document_lines(&doc, width, &Theme::dark(), "base16-ocean.dark", &|_| decor)
    }

    fn texts(content: &str, width: usize) -> Vec<String> {
        lines_for(content, width, CodeDecor::default())
            .lines
            .iter()
            .map(text_of)
            .collect()
    }

    #[test]
    fn test_paragraph_wraps_at_width() {
        let out = texts("alpha beta gamma delta epsilon", 16);
        assert_eq!(out, ["alpha beta gamma", "delta epsilon"]);
    }

    #[test]
    fn test_long_word_is_split() {
        let out = texts("abcdefghijklmnopqrstuvwxyz", 12);
        assert_eq!(out, ["abcdefghijkl", "mnopqrstuvwx", "yz"]);
    }

    #[test]
    fn test_lists_indent_and_number() {
        let out = texts("3. one\n4. two\n   - inner\n", 40);
        assert_eq!(out, ["3. one", "4. two", "   • inner"]);
    }

    #[test]
    fn test_blocks_are_separated_by_blank_lines() {
        let out = texts("# Title\n\nbody\n\n---\n", 20);
        assert_eq!(out[0], "Title");
        assert_eq!(out[1], "");
        assert_eq!(out[2], "body");
        assert_eq!(out[4], "─".repeat(20));
    }

    #[test]
    fn test_quote_gets_rule() {
        let out = texts("> quoted text", 30);
        assert_eq!(out, ["│ quoted text"]);
    }

    #[test]
    fn test_link_shows_url() {
        let out = texts("read [the docs](https://docs.rs)", 60);
        assert_eq!(out, ["read the docs (https://docs.rs)"]);
    }

    #[test]
    fn test_link_and_image_targets_are_sanitized() {
        let out = texts(
            "[go](<http://a\x1b[31mb>) and ![pic\x1b[2J](<img\x1b]0;t\x07.png>)",
            80,
        );
        assert!(out.iter().all(|line| !line.contains('\x1b') && !line.contains('\x07')));
        assert!(out[0].contains("(http://ab)"));
    }

    #[test]
    fn test_table_is_boxed_and_clipped() {
        let out = texts("| a | b |\n|---|---|\n| 1 | 22 |\n", 40);
        assert_eq!(out[0], "┌─────┬─────┐");
        assert_eq!(out[1], "│ a   │ b   │");
        assert_eq!(out[3], "│ 1   │ 22  │");
        assert_eq!(out[4], "└─────┴─────┘");

        let narrow = texts("| a | b |\n|---|---|\n| 1 | 22 |\n", 12);
        assert!(narrow.iter().all(|l| l.width() <= 12));
    }

    #[test]
    fn test_code_block_frame_and_anchor() {
        let rendered = lines_for("intro\n\n```rust\nfn a() {}\nfn b() {}\n```\n", 40, CodeDecor::default());
        assert_eq!(rendered.code_anchors, vec![2]);

        let header = text_of(&rendered.lines[2]);
        assert!(header.starts_with("╭─ rust "));
        assert!(header.ends_with("Copy code "));
        assert_eq!(text_of(&rendered.lines[3]), "│ 1 fn a() {}");
        assert_eq!(text_of(&rendered.lines[4]), "│ 2 fn b() {}");
        assert!(text_of(&rendered.lines[5]).starts_with('╰'));
    }

    #[test]
    fn test_code_header_reflects_actions() {
        let copied = CodeDecor {
            copied: true,
            ..Default::default()
        };
        let rendered = lines_for("```html\n<p>x</p>\n```", 50, copied);
        let header = text_of(&rendered.lines[0]);
        assert!(header.contains("✓ Copied!"));
        assert!(header.contains("Preview"));

        let plain = lines_for("```python\nprint(1)\n```", 50, CodeDecor::default());
        assert!(!text_of(&plain.lines[0]).contains("Preview"));
    }

    #[test]
    fn test_selected_block_label_is_highlighted() {
        let theme = Theme::dark();
        let selected = CodeDecor {
            selected: true,
            ..Default::default()
        };
        let rendered = lines_for("```sh\nls\n```", 40, selected);
        let label = &rendered.lines[0].spans[1];
        assert_eq!(label.content, "sh");
        assert_eq!(label.style.bg, Some(theme.selection));
        assert_eq!(label.style.fg, Some(theme.selection_fg));

        let plain = lines_for("```sh\nls\n```", 40, CodeDecor::default());
        assert_eq!(plain.lines[0].spans[1].style.bg, None);
    }

    #[test]
    fn test_no_controls_without_actions() {
        let doc = render("```js\nx\n```", &RenderOptions::default());
        let rendered =
            document_lines(&doc, 40, &Theme::dark(), "base16-ocean.dark", &|_| CodeDecor::default());
        assert!(!text_of(&rendered.lines[0]).contains("Copy"));
    }

    #[test]
    fn test_anchors_follow_nested_order() {
        let rendered = lines_for(
            "- item\n\n  ```sh\n  ls\n  ```\n\n> ```py\n> x\n> ```\n",
            40,
            CodeDecor::default(),
        );
        assert_eq!(rendered.code_anchors.len(), 2);
        assert!(text_of(&rendered.lines[rendered.code_anchors[0]]).contains("sh"));
        assert!(text_of(&rendered.lines[rendered.code_anchors[1]]).contains("py"));
    }

    #[test]
    fn test_literal_lines_keep_markdown_syntax() {
        let lines = literal_lines("# not a heading\n  **raw**", 40, Style::default());
        let out: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(out, ["# not a heading", "  **raw**"]);
    }

    #[test]
    fn test_sanitize_strips_escapes() {
        assert_eq!(sanitize_for_tui("a\x1b[31mred\x1b[0m\r\tb\x07"), "ared\tb");
    }
}
