//! Runtime configuration, built once at startup and passed by reference.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_HISTORY_MAX_TURNS: usize = 40;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API key. Set WREN_API_KEY (or OPENAI_API_KEY) or pass --api-key.")]
    MissingApiKey,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub api_key: String,
    pub host: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<i32>,
    pub max_tool_iterations: usize,
    pub max_retries: usize,
    pub history_max_turns: usize,
    pub enable_reflection: bool,
    pub system_prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            host: DEFAULT_HOST.to_string(),
            temperature: Some(0.7),
            top_p: None,
            max_tokens: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            max_retries: DEFAULT_MAX_RETRIES,
            history_max_turns: DEFAULT_HISTORY_MAX_TURNS,
            enable_reflection: false,
            system_prompt: None,
        }
    }
}

/// Optional overrides loaded from a JSON config file. Anything absent
/// falls through to the environment and then the defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model: Option<String>,
    api_key: Option<String>,
    host: Option<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<i32>,
    max_tool_iterations: Option<usize>,
    max_retries: Option<usize>,
    history_max_turns: Option<usize>,
    enable_reflection: Option<bool>,
    system_prompt: Option<String>,
}

impl Config {
    /// Build configuration from the environment, with `.env` support.
    ///
    /// API key and base URL accept the same fallback chains the rest of
    /// the OpenAI-compatible ecosystem uses, so pointing wren at DeepSeek
    /// or a local gateway needs no wren-specific variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        if let Some(api_key) = first_env(&["WREN_API_KEY", "LLM_API_KEY", "OPENAI_API_KEY"]) {
            config.api_key = api_key;
        }
        if let Some(host) = first_env(&["WREN_API_BASE", "LLM_API_BASE", "OPENAI_API_BASE"]) {
            config.host = host;
        }
        if let Some(model) = first_env(&["WREN_MODEL", "LLM_MODEL"]) {
            config.model = model;
        }
        if let Some(temperature) = first_env(&["WREN_TEMPERATURE"]) {
            if let Ok(value) = temperature.parse() {
                config.temperature = Some(value);
            }
        }

        config
    }

    /// Layer a JSON config file over the current values.
    pub fn apply_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let file: FileConfig = serde_json::from_str(&raw)?;

        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(api_key) = file.api_key {
            self.api_key = api_key;
        }
        if let Some(host) = file.host {
            self.host = host;
        }
        if file.temperature.is_some() {
            self.temperature = file.temperature;
        }
        if file.top_p.is_some() {
            self.top_p = file.top_p;
        }
        if file.max_tokens.is_some() {
            self.max_tokens = file.max_tokens;
        }
        if let Some(value) = file.max_tool_iterations {
            self.max_tool_iterations = value;
        }
        if let Some(value) = file.max_retries {
            self.max_retries = value;
        }
        if let Some(value) = file.history_max_turns {
            self.history_max_turns = value;
        }
        if let Some(value) = file.enable_reflection {
            self.enable_reflection = value;
        }
        if file.system_prompt.is_some() {
            self.system_prompt = file.system_prompt;
        }

        Ok(())
    }

    /// Final check before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
}
