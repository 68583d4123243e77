//! Configuration management for the furigana gateway
//!
//! Handles loading and parsing of `furigana.toml` configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub tts: TtsConfig,

    /// Local library storage settings
    #[serde(default)]
    pub library: LibraryConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port (the `PORT` environment variable takes precedence)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai", "claude", or "none"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key (can also be set via environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (e.g., "gpt-4o-mini", "claude-3-5-haiku-20241022")
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum tokens for annotation and analysis responses
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for annotation and analysis
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens for plain translation
    #[serde(default = "default_translate_max_tokens")]
    pub translate_max_tokens: u32,

    /// Sampling temperature for plain translation
    #[serde(default = "default_translate_temperature")]
    pub translate_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            translate_max_tokens: default_translate_max_tokens(),
            translate_temperature: default_translate_temperature(),
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Spoken language code
    #[serde(default = "default_tts_lang")]
    pub lang: String,

    /// Host serving the `translate_tts` endpoint
    #[serde(default = "default_tts_host")]
    pub host: String,

    /// Longest text accepted in a single synthesis request
    #[serde(default = "default_tts_max_chars")]
    pub max_chars: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            lang: default_tts_lang(),
            host: default_tts_host(),
            max_chars: default_tts_max_chars(),
        }
    }
}

/// Library storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory holding the serialized collections (defaults to the user data dir)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Total bytes the store accepts before rejecting writes
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,

    /// Namespace key of the example sentence library
    #[serde(default = "default_example_key")]
    pub example_key: String,

    /// Namespace key of the subtitle batch library
    #[serde(default = "default_subtitle_key")]
    pub subtitle_key: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            dir: None,
            quota_bytes: default_quota_bytes(),
            example_key: default_example_key(),
            subtitle_key: default_subtitle_key(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_translate_max_tokens() -> u32 {
    1000
}

fn default_translate_temperature() -> f32 {
    0.3
}

fn default_tts_lang() -> String {
    "ja".to_string()
}

fn default_tts_host() -> String {
    "https://translate.google.com".to_string()
}

fn default_tts_max_chars() -> usize {
    200
}

fn default_quota_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_example_key() -> String {
    "jp_learning_library_v1".to_string()
}

fn default_subtitle_key() -> String {
    "jp_learning_srt_library_v1".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "furigana")
            .map(|dirs| dirs.config_dir().join("furigana.toml"))
    }

    /// Load configuration from an explicit path, or fall back to workspace and user config
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        Ok(Self::load_from_default())
    }

    /// Load configuration from default path or workspace
    pub fn load_from_default() -> Self {
        let workspace_path = PathBuf::from("furigana.toml");
        if workspace_path.exists() {
            match Self::load(&workspace_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {:#}", workspace_path.display(), e),
            }
        }

        if let Some(default_path) = Self::default_path() {
            if let Ok(config) = Self::load(&default_path) {
                return config;
            }
        }

        Config::default()
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed serializing config as TOML")
    }

    /// Get the effective API key (from config or environment)
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.llm.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        match self.llm.provider.as_str() {
            "openai" => std::env::var("OPENAI_API_KEY").ok(),
            "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
            _ => None,
        }
    }

    /// Get the effective model name
    pub fn get_model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| match self.llm.provider.as_str() {
                "openai" => "gpt-4o-mini".to_string(),
                "claude" => "claude-3-5-haiku-20241022".to_string(),
                _ => String::new(),
            })
    }

    /// Check if LLM integration is enabled
    pub fn is_llm_enabled(&self) -> bool {
        self.llm.provider != "none" && self.get_api_key().is_some()
    }

    /// Effective listen port, honouring the `PORT` environment variable
    pub fn get_port(&self) -> u16 {
        port_override(std::env::var("PORT").ok().as_deref()).unwrap_or(self.server.port)
    }

    /// Directory where library collections are persisted
    pub fn library_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.library.dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "furigana")
            .map(|dirs| dirs.data_dir().join("library"))
            .unwrap_or_else(|| PathBuf::from(".furigana"))
    }
}

fn port_override(raw: Option<&str>) -> Option<u16> {
    raw.and_then(|value| value.trim().parse().ok())
}
