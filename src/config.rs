use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const ENV_FILE: &str = ".env";

/// Env vars checked for the model credential, in order.
const API_KEY_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_cache_ttl_s")]
    pub cache_ttl_s: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_edition")]
    pub edition: String,
    #[serde(default = "default_feed_timeout")]
    pub request_timeout_ms: u64,
}

fn default_feed_base_url() -> String { "https://news.google.com".to_string() }
fn default_max_entries() -> usize { 6 }
fn default_cache_ttl_s() -> u64 { 300 }
fn default_language() -> String { "en-US".to_string() }
fn default_region() -> String { "US".to_string() }
fn default_edition() -> String { "US:en".to_string() }
fn default_feed_timeout() -> u64 { 15_000 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            max_entries: default_max_entries(),
            cache_ttl_s: default_cache_ttl_s(),
            language: default_language(),
            region: default_region(),
            edition: default_edition(),
            request_timeout_ms: default_feed_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_api_base")]
    pub api_base: String,
    /// Selectable model variants; the first one is active at startup.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_model_timeout")]
    pub request_timeout_ms: u64,
}

fn default_model_api_base() -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_models() -> Vec<String> {
    vec!["gemini-2.5-flash".to_string(), "gemini-2.5-pro".to_string()]
}
fn default_temperature() -> f32 { 0.4 }
fn default_model_timeout() -> u64 { 120_000 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_model_api_base(),
            models: default_models(),
            temperature: default_temperature(),
            request_timeout_ms: default_model_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default)]
    pub auto_process: bool,
}

fn default_topic() -> String { "Artificial Intelligence".to_string() }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_topic: default_topic(),
            auto_process: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    /// Target labels pre-checked in the publish form.
    #[serde(default = "default_targets")]
    pub default_targets: Vec<String>,
}

fn default_targets() -> Vec<String> { vec!["Twitter/X".to_string()] }

impl Default for PublishConfig {
    fn default() -> Self {
        Self { default_targets: default_targets() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        if config.model.models.is_empty() {
            config.model.models = default_models();
        }
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let content = match std::fs::read_to_string(Path::new(ENV_FILE)) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Model credential from the environment. `None` when unset or blank;
    /// the analyzer reports that as a missing credential.
    pub fn google_api_key() -> Option<String> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|v| sanitize_key(&v))
            .find(|v| !v.is_empty())
    }
}

/// Parse `KEY=VALUE` lines from a dotenv file, skipping comments and blanks.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
