//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;
use crate::chat::SYSTEM_PREAMBLE;

/// TOML basic string with escapes
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

impl Config {
    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        let preamble = if self.system_preamble == SYSTEM_PREAMBLE {
            "# Text prefixed onto every message you send (default: built-in web page instructions)\n\
             # system_preamble = \"\"\n"
                .to_string()
        } else {
            format!(
                "# Text prefixed onto every message you send\nsystem_preamble = {}\n",
                quoted(&self.system_preamble)
            )
        };

        let api_key_env = match &self.backend.api_key_env {
            Some(var) => format!("api_key_env = {}\n", quoted(var)),
            None => "# api_key_env = \"OPENAI_API_KEY\"  # openai only\n".to_string(),
        };

        format!(
            r#"# chatmark configuration

# Theme: Chatmark Dark, Chatmark Light, Terminal
theme = {theme}

# Code block highlighting (syntect theme): base16-ocean.dark, base16-eighties.dark,
# base16-mocha.dark, base16-ocean.light, InspiredGitHub, Solarized (dark), Solarized (light)
highlight_theme = {highlight_theme}

{preamble}
# Where answers come from: openai, ollama, demo
# CHATMARK_BACKEND, CHATMARK_API_URL and CHATMARK_MODEL override these
[backend]
kind = {kind}
api_url = {api_url}
model = {model}
{api_key_env}
# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# JSON file logging (in addition to the in-app log overlay)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = {log_file_rotation}  # hourly, daily, never
file_prefix = {log_file_prefix}
"#,
            theme = quoted(&self.theme),
            highlight_theme = quoted(&self.highlight_theme),
            preamble = preamble,
            kind = quoted(self.backend.kind.as_str()),
            api_url = quoted(&self.backend.api_url),
            model = quoted(&self.backend.model),
            api_key_env = api_key_env,
            log_level = quoted(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.display().to_string()),
            log_file_rotation = quoted(self.logging.file_rotation.as_str()),
            log_file_prefix = quoted(&self.logging.file_prefix),
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }
}
