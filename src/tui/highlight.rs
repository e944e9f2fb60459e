// Code block syntax highlighting via syntect
//
// Dispatch is on CodeKind: Html uses the HTML grammar, Source looks its token
// up among syntect's bundled grammars, Plain (and unknown tokens) are shown
// without color.

use crate::markdown::CodeKind;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use std::sync::LazyLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme as SyntaxTheme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Bundled syntect theme names, sorted
pub fn theme_names() -> Vec<&'static str> {
    THEME_SET.themes.keys().map(String::as_str).collect()
}

fn syntax_theme(name: &str) -> Option<&'static SyntaxTheme> {
    THEME_SET
        .themes
        .get(name)
        .or_else(|| THEME_SET.themes.get(FALLBACK_THEME))
}

fn syntax_for(kind: &CodeKind) -> Option<&'static SyntaxReference> {
    match kind {
        CodeKind::Html => SYNTAX_SET.find_syntax_by_token("html"),
        CodeKind::Source(token) => SYNTAX_SET.find_syntax_by_token(token),
        CodeKind::Plain => None,
    }
}

/// Highlight `code` line by line. Always returns one entry per line of input;
/// lines come back unstyled when no grammar or theme applies.
pub fn highlight(code: &str, kind: &CodeKind, theme_name: &str) -> Vec<Vec<Span<'static>>> {
    let plain = || {
        code.split('\n')
            .map(|line| vec![Span::raw(line.to_string())])
            .collect()
    };

    let (Some(syntax), Some(theme)) = (syntax_for(kind), syntax_theme(theme_name)) else {
        return plain();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let Ok(ranges) = highlighter.highlight_line(line, &SYNTAX_SET) else {
            tracing::debug!(syntax = %syntax.name, "Highlighting failed, showing plain text");
            return plain();
        };
        out.push(
            ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches(['\n', '\r']);
                    (!text.is_empty()).then(|| Span::styled(text.to_string(), to_style(style)))
                })
                .collect(),
        );
    }
    // LinesWithEndings yields nothing for "" and drops a final empty line
    if code.is_empty() || code.ends_with('\n') {
        out.push(Vec::new());
    }
    out
}

fn to_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_known_language_gets_color() {
        let lines = highlight("fn main() {}\nlet x = 1;", &CodeKind::Source("rust".into()), "base16-ocean.dark");
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "fn main() {}");
        assert!(lines[0].iter().any(|s| s.style.fg.is_some()));
    }

    #[test]
    fn test_html_kind_uses_html_grammar() {
        let lines = highlight("<p>hi</p>", &CodeKind::Html, "base16-ocean.dark");
        assert_eq!(line_text(&lines[0]), "<p>hi</p>");
        assert!(lines[0].len() > 1);
    }

    #[test]
    fn test_unknown_language_and_plain_fall_back() {
        for kind in [CodeKind::Source("nosuchlang".into()), CodeKind::Plain] {
            let lines = highlight("a\nb", &kind, "base16-ocean.dark");
            assert_eq!(lines.len(), 2);
            assert_eq!(lines[1][0].style, Style::default());
        }
    }

    #[test]
    fn test_unknown_theme_uses_fallback() {
        let lines = highlight("x = 1", &CodeKind::Source("py".into()), "No Such Theme");
        assert_eq!(line_text(&lines[0]), "x = 1");
    }

    #[test]
    fn test_line_count_preserved_with_trailing_newline() {
        let lines = highlight("a\n", &CodeKind::Source("rust".into()), "base16-ocean.dark");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_theme_names_include_default() {
        assert!(theme_names().contains(&FALLBACK_THEME));
    }
}
