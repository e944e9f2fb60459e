// Color themes for the TUI
//
// "Terminal" uses the terminal's ANSI palette; the Chatmark themes use true
// color (RGB). Code block colors come from syntect and are configured
// separately (`highlight_theme`).

use ratatui::style::Color;
use ratatui::widgets::BorderType;

pub const THEME_NAMES: [&str; 3] = ["Chatmark Dark", "Chatmark Light", "Terminal"];

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // ─── Terminal Colors ─────────────────────────────────────
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,

    // ─── Chrome ──────────────────────────────────────────────
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,
    pub title: Color,
    pub status_bar: Color,
    pub selection: Color,
    pub selection_fg: Color,

    // ─── Conversation ────────────────────────────────────────
    pub user: Color,
    pub assistant: Color,
    pub error: Color,
    pub success: Color,
    pub warning: Color,

    // ─── Markdown ────────────────────────────────────────────
    pub heading: [Color; 3],
    pub link: Color,
    pub quote: Color,
    pub code_inline: Color,
    pub code_header: Color,
    pub code_gutter: Color,
}

impl Theme {
    /// Load theme by name (case-insensitive). Unknown names get the default.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "chatmark light" | "light" => Self::light(),
            "terminal" | "auto" => Self::terminal(),
            "chatmark dark" | "dark" => Self::dark(),
            other => {
                tracing::warn!("Unknown theme '{}', using Chatmark Dark", other);
                Self::dark()
            }
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "Chatmark Dark".to_string(),
            background: Color::Rgb(0x1a, 0x1b, 0x26),
            foreground: Color::Rgb(0xc0, 0xca, 0xf5),
            muted: Color::Rgb(0x56, 0x5f, 0x89),
            border: Color::Rgb(0x3b, 0x42, 0x61),
            border_focused: Color::Rgb(0x7a, 0xa2, 0xf7),
            border_type: BorderType::Rounded,
            title: Color::Rgb(0x7d, 0xcf, 0xff),
            status_bar: Color::Rgb(0x9e, 0xce, 0x6a),
            selection: Color::Rgb(0x28, 0x34, 0x57),
            selection_fg: Color::Rgb(0xc0, 0xca, 0xf5),
            user: Color::Rgb(0x7a, 0xa2, 0xf7),
            assistant: Color::Rgb(0xbb, 0x9a, 0xf7),
            error: Color::Rgb(0xf7, 0x76, 0x8e),
            success: Color::Rgb(0x9e, 0xce, 0x6a),
            warning: Color::Rgb(0xe0, 0xaf, 0x68),
            heading: [
                Color::Rgb(0xff, 0x9e, 0x64),
                Color::Rgb(0x7d, 0xcf, 0xff),
                Color::Rgb(0xbb, 0x9a, 0xf7),
            ],
            link: Color::Rgb(0x73, 0xda, 0xca),
            quote: Color::Rgb(0x9a, 0xa5, 0xce),
            code_inline: Color::Rgb(0xe0, 0xaf, 0x68),
            code_header: Color::Rgb(0x56, 0x5f, 0x89),
            code_gutter: Color::Rgb(0x3b, 0x42, 0x61),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Chatmark Light".to_string(),
            background: Color::Rgb(0xfa, 0xfa, 0xfa),
            foreground: Color::Rgb(0x38, 0x3a, 0x42),
            muted: Color::Rgb(0x8e, 0x90, 0x98),
            border: Color::Rgb(0xc8, 0xc8, 0xcc),
            border_focused: Color::Rgb(0x40, 0x78, 0xf2),
            border_type: BorderType::Rounded,
            title: Color::Rgb(0x01, 0x84, 0xbc),
            status_bar: Color::Rgb(0x50, 0xa1, 0x4f),
            selection: Color::Rgb(0xe5, 0xe5, 0xe6),
            selection_fg: Color::Rgb(0x38, 0x3a, 0x42),
            user: Color::Rgb(0x40, 0x78, 0xf2),
            assistant: Color::Rgb(0xa6, 0x26, 0xa4),
            error: Color::Rgb(0xe4, 0x56, 0x49),
            success: Color::Rgb(0x50, 0xa1, 0x4f),
            warning: Color::Rgb(0xc1, 0x84, 0x01),
            heading: [
                Color::Rgb(0xc1, 0x84, 0x01),
                Color::Rgb(0x01, 0x84, 0xbc),
                Color::Rgb(0xa6, 0x26, 0xa4),
            ],
            link: Color::Rgb(0x0e, 0x7c, 0x86),
            quote: Color::Rgb(0x69, 0x6c, 0x77),
            code_inline: Color::Rgb(0x98, 0x68, 0x01),
            code_header: Color::Rgb(0x8e, 0x90, 0x98),
            code_gutter: Color::Rgb(0xc8, 0xc8, 0xcc),
        }
    }

    /// Uses the terminal's own palette and background
    pub fn terminal() -> Self {
        Self {
            name: "Terminal".to_string(),
            background: Color::Reset,
            foreground: Color::Reset,
            muted: Color::DarkGray,
            border: Color::Gray,
            border_focused: Color::Cyan,
            border_type: BorderType::Plain,
            title: Color::Cyan,
            status_bar: Color::Green,
            selection: Color::DarkGray,
            selection_fg: Color::White,
            user: Color::Blue,
            assistant: Color::Magenta,
            error: Color::Red,
            success: Color::Green,
            warning: Color::Yellow,
            heading: [Color::Yellow, Color::Cyan, Color::Magenta],
            link: Color::Cyan,
            quote: Color::Gray,
            code_inline: Color::Yellow,
            code_header: Color::DarkGray,
            code_gutter: Color::DarkGray,
        }
    }

    /// Color for a heading tier (1-3)
    pub fn heading_color(&self, level: u8) -> Color {
        let index = usize::from(level.clamp(1, 3)) - 1;
        self.heading[index]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
