//! Backend selection: which service to stream from, where, and with which model

use serde::Deserialize;

/// Supported generation backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// OpenAI-compatible `/v1/chat/completions` (OpenAI, OpenRouter, vLLM, LM Studio...)
    #[default]
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// Canned answers, no network
    Demo,
}

impl BackendKind {
    /// Parse backend name from config or env
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Demo => "demo",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Ollama => "http://localhost:11434",
            Self::Demo => "",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
            Self::Demo => "canned",
        }
    }
}

/// Resolved backend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Base URL; the endpoint path is appended per backend
    pub api_url: String,
    pub model: String,
    /// Name of the env var holding the API key (openai only)
    pub api_key_env: Option<String>,
}

impl BackendConfig {
    /// Defaults for a given backend kind
    pub fn for_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            api_url: kind.default_api_url().to_string(),
            model: kind.default_model().to_string(),
            api_key_env: (kind == BackendKind::OpenAi).then(|| "OPENAI_API_KEY".to_string()),
        }
    }

    /// Switch to another backend from the command line. URL and model fall
    /// back to that backend's defaults, since the configured ones belong to
    /// a different service.
    pub fn switch_to(&mut self, kind: BackendKind) {
        if kind != self.kind {
            let api_key_env = self.api_key_env.take();
            *self = Self::for_kind(kind);
            if kind == BackendKind::OpenAi && api_key_env.is_some() {
                self.api_key_env = api_key_env;
            }
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::for_kind(BackendKind::default())
    }
}

/// `[backend]` section as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileBackend {
    pub kind: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(BackendKind::parse("OpenAI"), Some(BackendKind::OpenAi));
        assert_eq!(BackendKind::parse(" ollama "), Some(BackendKind::Ollama));
        assert_eq!(BackendKind::parse("gemini"), None);
    }

    #[test]
    fn test_switch_resets_url_and_model() {
        let mut backend = BackendConfig::for_kind(BackendKind::OpenAi);
        backend.model = "gpt-4.1".to_string();

        backend.switch_to(BackendKind::Ollama);

        assert_eq!(backend.api_url, "http://localhost:11434");
        assert_eq!(backend.model, "llama3.2");
        assert_eq!(backend.api_key_env, None);
    }

    #[test]
    fn test_switch_to_same_kind_keeps_settings() {
        let mut backend = BackendConfig::for_kind(BackendKind::Ollama);
        backend.model = "qwen2.5-coder".to_string();

        backend.switch_to(BackendKind::Ollama);

        assert_eq!(backend.model, "qwen2.5-coder");
    }
}
