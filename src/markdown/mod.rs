// Markdown structural renderer
//
// Turns an assistant message into a tree of typed blocks. The tree is rebuilt
// from scratch on every call, so a message that is still streaming can be
// rendered again each time a fragment lands: half-written markers simply come
// out as text, and an unclosed fence becomes a code block running to the end
// of input.
//
// Terminal styling lives in `tui::markdown`; this module only decides
// structure, so it can be tested without a terminal.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Leading word characters of a fence info string (`html`, `rust`, `c` ...)
static LANGUAGE_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\w+").ok());

/// Renderer switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Attach copy/preview affordances to every code block
    pub code_actions: bool,
}

/// What a code block offers when actions are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeActionsSpec {
    pub previewable: bool,
}

/// How a code block is treated, decided once from its fence tag and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    /// HTML: highlighted as HTML and offered for preview
    Html,
    /// Any other tagged language, highlighted by its token
    Source(String),
    /// No tag: plain text
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub kind: CodeKind,
    /// Block body with a single trailing newline removed
    pub text: String,
    pub actions: Option<CodeActionsSpec>,
}

impl CodeBlock {
    fn new(info: Option<&str>, mut text: String, options: &RenderOptions) -> Self {
        if text.ends_with('\n') {
            text.pop();
        }
        let language = info.and_then(language_token);
        let kind = match language.as_deref() {
            Some(lang) if lang.eq_ignore_ascii_case("html") => CodeKind::Html,
            Some(lang) => CodeKind::Source(lang.to_string()),
            None => CodeKind::Plain,
        };
        let actions = options.code_actions.then(|| CodeActionsSpec {
            previewable: is_previewable(&kind, &text),
        });

        Self {
            language,
            kind,
            text,
            actions,
        }
    }

    /// Tagged blocks get a line-number gutter; plain text does not
    pub fn show_line_numbers(&self) -> bool {
        match &self.kind {
            CodeKind::Plain => false,
            CodeKind::Source(lang) => !lang.eq_ignore_ascii_case("text"),
            CodeKind::Html => true,
        }
    }
}

/// HTML blocks and anything that looks like a full document can be previewed
pub fn is_previewable(kind: &CodeKind, text: &str) -> bool {
    *kind == CodeKind::Html || text.contains("<!DOCTYPE html>") || text.contains("<html")
}

/// First word of a fence info string, cut down to its leading `\w+` run
fn language_token(info: &str) -> Option<String> {
    let word = info.split_whitespace().next()?;
    let regex = LANGUAGE_TOKEN.as_ref()?;
    regex.find(word).map(|m| m.as_str().to_string())
}

/// Inline content inside paragraphs, headings, links and table cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { url: String, children: Vec<Inline> },
    Image { src: String, alt: String },
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Levels 4-6 are folded into 3
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// `start` is set for ordered lists
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    BlockQuote(Vec<Block>),
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Rule,
    Code(CodeBlock),
    /// Raw HTML outside a fence, shown literally
    Html(String),
}

/// Result of one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub blocks: Vec<Block>,
}

impl RenderedDocument {
    /// Code blocks in document order (depth-first), the order used for
    /// selection and for action-state keys
    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a CodeBlock>) {
            for block in blocks {
                match block {
                    Block::Code(code) => out.push(code),
                    Block::BlockQuote(children) => walk(children, out),
                    Block::List { items, .. } => {
                        for item in items {
                            walk(item, out);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    /// Every link as `(label, url)`, in reading order
    pub fn links(&self) -> Vec<(String, String)> {
        fn inlines(items: &[Inline], out: &mut Vec<(String, String)>) {
            for item in items {
                match item {
                    Inline::Link { url, children } => {
                        out.push((plain_text(children), url.clone()));
                        inlines(children, out);
                    }
                    Inline::Emphasis(children)
                    | Inline::Strong(children)
                    | Inline::Strikethrough(children) => inlines(children, out),
                    _ => {}
                }
            }
        }
        fn blocks(items: &[Block], out: &mut Vec<(String, String)>) {
            for block in items {
                match block {
                    Block::Heading { content, .. } | Block::Paragraph(content) => {
                        inlines(content, out)
                    }
                    Block::List { items, .. } => {
                        for item in items {
                            blocks(item, out);
                        }
                    }
                    Block::BlockQuote(children) => blocks(children, out),
                    Block::Table { header, rows } => {
                        for cell in header.iter().chain(rows.iter().flatten()) {
                            inlines(cell, out);
                        }
                    }
                    Block::Rule | Block::Code(_) | Block::Html(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        blocks(&self.blocks, &mut out);
        out
    }
}

/// Parse `content` into a block tree. Never fails.
pub fn render(content: &str, options: &RenderOptions) -> RenderedDocument {
    let parser_options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let mut builder = TreeBuilder::new(*options);

    for event in Parser::new_ext(content, parser_options) {
        builder.event(event);
    }

    RenderedDocument {
        blocks: builder.finish(),
    }
}

// ============================================================================
// Tree construction
// ============================================================================

/// An open container waiting for its end event
enum Frame {
    /// Root, block quote or list item
    Blocks { kind: BlockFrame, blocks: Vec<Block> },
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Inlines {
        kind: InlineFrame,
        inlines: Vec<Inline>,
    },
    Image { src: String, alt: String },
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Row(Vec<Vec<Inline>>),
    Code { info: Option<String>, text: String },
    Html(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BlockFrame {
    Root,
    Quote,
    Item,
}

#[derive(Clone, PartialEq, Eq)]
enum InlineFrame {
    /// `implicit` paragraphs wrap the bare text of tight list items
    Paragraph { implicit: bool },
    Heading(u8),
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
    Cell,
}

struct TreeBuilder {
    stack: Vec<Frame>,
    options: RenderOptions,
}

impl TreeBuilder {
    fn new(options: RenderOptions) -> Self {
        Self {
            stack: vec![Frame::Blocks {
                kind: BlockFrame::Root,
                blocks: Vec::new(),
            }],
            options,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),

            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::Code { text: body, .. }) => body.push_str(&text),
                Some(Frame::Image { alt, .. }) => alt.push_str(&text),
                Some(Frame::Html(raw)) => raw.push_str(&text),
                _ => self.push_inline(Inline::Text(text.to_string())),
            },

            Event::Code(code) => match self.stack.last_mut() {
                Some(Frame::Image { alt, .. }) => alt.push_str(&code),
                _ => self.push_inline(Inline::Code(code.to_string())),
            },

            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(raw)) => raw.push_str(&html),
                _ => {
                    self.close_implicit_paragraph();
                    self.push_block(Block::Html(html.to_string()));
                }
            },

            // Inline tags are shown literally, like any other text
            Event::InlineHtml(html) => self.push_inline(Inline::Text(html.to_string())),

            Event::SoftBreak => match self.stack.last_mut() {
                Some(Frame::Image { alt, .. }) => alt.push(' '),
                _ => self.push_inline(Inline::SoftBreak),
            },
            Event::HardBreak => self.push_inline(Inline::HardBreak),

            Event::Rule => {
                self.close_implicit_paragraph();
                self.push_block(Block::Rule);
            }

            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.push_inline(Inline::Text(marker.to_string()));
            }

            Event::FootnoteReference(label) => {
                self.push_inline(Inline::Text(format!("[^{}]", label)));
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit_paragraph();
                self.open_inlines(InlineFrame::Paragraph { implicit: false });
            }
            Tag::Heading { level, .. } => {
                self.close_implicit_paragraph();
                self.open_inlines(InlineFrame::Heading(heading_tier(level)));
            }
            Tag::BlockQuote => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Blocks {
                    kind: BlockFrame::Quote,
                    blocks: Vec::new(),
                });
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit_paragraph();
                let info = match kind {
                    CodeBlockKind::Fenced(info) => Some(info.to_string()),
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::Code {
                    info,
                    text: String::new(),
                });
            }
            Tag::HtmlBlock => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Html(String::new()));
            }
            Tag::List(start) => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::List {
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => self.stack.push(Frame::Blocks {
                kind: BlockFrame::Item,
                blocks: Vec::new(),
            }),
            Tag::Table(_) => {
                self.close_implicit_paragraph();
                self.stack.push(Frame::Table {
                    header: Vec::new(),
                    rows: Vec::new(),
                });
            }
            Tag::TableHead | Tag::TableRow => self.stack.push(Frame::Row(Vec::new())),
            Tag::TableCell => self.stack.push(Frame::Inlines {
                kind: InlineFrame::Cell,
                inlines: Vec::new(),
            }),
            Tag::Emphasis => self.open_inlines(InlineFrame::Emphasis),
            Tag::Strong => self.open_inlines(InlineFrame::Strong),
            Tag::Strikethrough => self.open_inlines(InlineFrame::Strikethrough),
            Tag::Link { dest_url, .. } => self.open_inlines(InlineFrame::Link(dest_url.to_string())),
            Tag::Image { dest_url, .. } => {
                self.ensure_inline_context();
                self.stack.push(Frame::Image {
                    src: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            // Not enabled in the parser options
            Tag::FootnoteDefinition(_) | Tag::MetadataBlock(_) => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::FootnoteDefinition | TagEnd::MetadataBlock(_) => return,
            TagEnd::Item | TagEnd::BlockQuote | TagEnd::List(_) => self.close_implicit_paragraph(),
            _ => {}
        }
        self.close_top();
    }

    /// Pop the innermost frame and attach what it built to its parent
    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Blocks {
                kind: BlockFrame::Item,
                blocks,
            } => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(blocks);
                }
            }
            Frame::Blocks { blocks, .. } => self.push_block(Block::BlockQuote(blocks)),
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Inlines { kind, inlines } => match kind {
                InlineFrame::Paragraph { .. } => self.push_block(Block::Paragraph(inlines)),
                InlineFrame::Heading(level) => self.push_block(Block::Heading {
                    level,
                    content: inlines,
                }),
                InlineFrame::Emphasis => self.push_inline(Inline::Emphasis(inlines)),
                InlineFrame::Strong => self.push_inline(Inline::Strong(inlines)),
                InlineFrame::Strikethrough => self.push_inline(Inline::Strikethrough(inlines)),
                InlineFrame::Link(url) => self.push_inline(Inline::Link {
                    url,
                    children: inlines,
                }),
                InlineFrame::Cell => {
                    if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                        cells.push(inlines);
                    }
                }
            },
            Frame::Image { src, alt } => self.push_inline(Inline::Image { src, alt }),
            Frame::Row(cells) => {
                if let Some(Frame::Table { header, rows }) = self.stack.last_mut() {
                    // The head row arrives first
                    if header.is_empty() && rows.is_empty() {
                        *header = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            Frame::Table { header, rows } => self.push_block(Block::Table { header, rows }),
            Frame::Code { info, text } => {
                let code = CodeBlock::new(info.as_deref(), text, &self.options);
                self.push_block(Block::Code(code));
            }
            Frame::Html(raw) => self.push_block(Block::Html(raw)),
        }
    }

    fn open_inlines(&mut self, kind: InlineFrame) {
        if !matches!(kind, InlineFrame::Paragraph { .. } | InlineFrame::Heading(_)) {
            self.ensure_inline_context();
        }
        self.stack.push(Frame::Inlines {
            kind,
            inlines: Vec::new(),
        });
    }

    /// Tight list items carry bare inline content; give it a paragraph
    fn ensure_inline_context(&mut self) {
        if matches!(self.stack.last(), Some(Frame::Blocks { .. })) {
            self.stack.push(Frame::Inlines {
                kind: InlineFrame::Paragraph { implicit: true },
                inlines: Vec::new(),
            });
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Inlines {
                kind: InlineFrame::Paragraph { implicit: true },
                ..
            })
        ) {
            self.close_top();
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        self.ensure_inline_context();
        match self.stack.last_mut() {
            Some(Frame::Inlines { inlines, .. }) => inlines.push(inline),
            Some(Frame::Image { alt, .. }) => {
                if let Inline::Text(text) = inline {
                    alt.push_str(&text);
                }
            }
            _ => tracing::trace!("Dropping inline outside an inline container"),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Frame::Blocks { blocks, .. }) => blocks.push(block),
            _ => tracing::trace!("Dropping block outside a block container"),
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while self.stack.len() > 1 {
            self.close_implicit_paragraph();
            self.close_top();
        }
        match self.stack.pop() {
            Some(Frame::Blocks { blocks, .. }) => blocks,
            _ => Vec::new(),
        }
    }
}

fn heading_tier(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        _ => 3,
    }
}

/// Flatten inline content to plain text (alt text, table sizing, tests)
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => out.push_str(&plain_text(children)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak => out.push(' '),
            Inline::HardBreak => out.push('\n'),
        }
    }
    out
}
