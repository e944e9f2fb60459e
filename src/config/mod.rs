//! Configuration for the chat client
//!
//! Configuration is loaded in order of precedence:
//! 1. Command-line flags (applied by main after loading)
//! 2. Environment variables
//! 3. Config file (~/.config/chatmark/config.toml)
//! 4. Built-in defaults

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod backend;
mod observability;
mod serialization;


pub use backend::{BackendConfig, BackendKind, FileBackend};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

use crate::chat::SYSTEM_PREAMBLE;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Syntect theme used for fenced code
pub const DEFAULT_HIGHLIGHT_THEME: &str = "base16-ocean.dark";

pub const DEFAULT_THEME: &str = "Chatmark Dark";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendConfig,

    /// Text prefixed onto each outgoing user turn
    pub system_preamble: String,

    /// UI theme: "Chatmark Dark", "Chatmark Light", "Terminal"
    pub theme: String,

    /// Syntect theme name for code blocks
    pub highlight_theme: String,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            system_preamble: SYSTEM_PREAMBLE.to_string(),
            theme: DEFAULT_THEME.to_string(),
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub system_preamble: Option<String>,
    pub theme: Option<String>,
    pub highlight_theme: Option<String>,

    /// Optional [backend] section
    pub backend: Option<FileBackend>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/chatmark/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("chatmark").join("config.toml"))
    }

    /// Write the default config on first run so the options are discoverable
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists.
    ///
    /// A config file that exists but does not parse is fatal: falling back to
    /// defaults would leave the user debugging the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n  CONFIG ERROR - failed to parse {}\n", path.display());
                    eprintln!("  {}\n", e);
                    eprintln!("  Fix the file, or reset it with: chatmark config --reset\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n  CONFIG ERROR - cannot read {}\n", path.display());
                eprintln!("  {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        Self::resolve(Self::load_file_config(), |name| std::env::var(name).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let file_backend = file.backend.unwrap_or_default();

        // Backend kind: env > file > default. Unknown names are reported and ignored.
        let kind = env("CHATMARK_BACKEND")
            .or(file_backend.kind)
            .and_then(|name| {
                let parsed = BackendKind::parse(&name);
                if parsed.is_none() {
                    eprintln!("Unknown backend '{}', using openai", name);
                }
                parsed
            })
            .unwrap_or_default();
        let defaults = BackendConfig::for_kind(kind);

        let backend = BackendConfig {
            kind,
            api_url: env("CHATMARK_API_URL")
                .or(file_backend.api_url)
                .unwrap_or(defaults.api_url),
            model: env("CHATMARK_MODEL")
                .or(file_backend.model)
                .unwrap_or(defaults.model),
            api_key_env: file_backend.api_key_env.or(defaults.api_key_env),
        };

        let theme = env("CHATMARK_THEME")
            .or(file.theme)
            .unwrap_or_else(|| DEFAULT_THEME.to_string());

        let mut logging = LoggingConfig::from_file(file.logging);
        if let Some(level) = env("CHATMARK_LOG_LEVEL") {
            logging.level = level;
        }

        Self {
            backend,
            system_preamble: file
                .system_preamble
                .unwrap_or_else(|| SYSTEM_PREAMBLE.to_string()),
            theme,
            highlight_theme: file
                .highlight_theme
                .unwrap_or_else(|| DEFAULT_HIGHLIGHT_THEME.to_string()),
            logging,
        }
    }
}
