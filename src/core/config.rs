//! Application configuration management
//!
//! Configuration is read from an optional TOML file and completed from the
//! environment. Everything is validated once at startup so a misconfigured
//! process fails before it accepts work.

use crate::core::constants::model;
use crate::core::provider::ProviderType;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 90;

/// Default server port
const DEFAULT_PORT: u16 = 8000;

/// Default upload body limit (20 MiB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Config file looked up when neither `--config` nor `CONFIG_PATH` is given
const DEFAULT_CONFIG_FILE: &str = "config.toml";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub azure_api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_model_name() -> String {
    model::DEFAULT_NAME.to_string()
}

fn default_max_tokens() -> u32 {
    model::DEFAULT_MAX_TOKENS
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub openai: Option<OpenAIConfig>,
    #[serde(default)]
    pub openrouter: Option<OpenRouterConfig>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider type (OpenAI or OpenRouter)
    pub provider: ProviderType,

    /// Provider API key; filled from the environment when the file has none
    pub api_key: Option<String>,

    /// Provider API base URL
    pub base_url: String,

    /// Azure API version (for Azure OpenAI deployments)
    pub azure_api_version: Option<String>,

    /// OpenRouter specific settings
    pub openrouter_site_url: Option<String>,
    pub openrouter_app_name: Option<String>,

    /// Vision model used for every verification
    pub model: String,

    /// Completion length bound
    pub max_tokens: u32,

    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Logging level
    pub log_level: String,

    /// Largest accepted multipart body
    pub max_upload_bytes: usize,

    /// Directory receiving transient upload files
    pub upload_dir: PathBuf,

    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        let model = ModelConfig::default();
        let server = ServerConfig::default();

        Self {
            provider: ProviderType::OpenAI,
            api_key: None,
            base_url: OPENAI_BASE_URL.to_string(),
            azure_api_version: None,
            openrouter_site_url: None,
            openrouter_app_name: None,
            model: model.name,
            max_tokens: model.max_tokens,
            host: server.host,
            port: server.port,
            log_level: server.log_level,
            max_upload_bytes: server.max_upload_bytes,
            upload_dir: std::env::temp_dir(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Config {
    /// Resolve a parsed TOML document into a configuration
    fn from_toml(config: TomlConfig) -> Result<Self> {
        let provider = match config.provider.as_deref() {
            Some(name) => ProviderType::parse(name)
                .with_context(|| format!("Invalid provider '{}'. Must be one of: openai, openrouter", name))?,
            None => ProviderType::OpenAI,
        };

        let (api_key, base_url, azure_api_version, openrouter_site_url, openrouter_app_name) =
            match provider {
                ProviderType::OpenAI => {
                    let openai = config.openai.unwrap_or_default();
                    (
                        openai.api_key,
                        openai.base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                        openai.azure_api_version,
                        None,
                        None,
                    )
                }
                ProviderType::OpenRouter => {
                    let openrouter = config.openrouter.unwrap_or_default();
                    (
                        openrouter.api_key,
                        openrouter
                            .base_url
                            .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
                        None,
                        openrouter.site_url,
                        openrouter.app_name,
                    )
                }
            };

        if config.model.max_tokens == 0 {
            bail!("model.max_tokens must be greater than zero");
        }

        Ok(Config {
            provider,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            azure_api_version,
            openrouter_site_url,
            openrouter_app_name,
            model: config.model.name,
            max_tokens: config.model.max_tokens,
            host: config.server.host,
            port: config.server.port,
            log_level: config.server.log_level,
            max_upload_bytes: config.server.max_upload_bytes,
            upload_dir: config.server.upload_dir.unwrap_or_else(std::env::temp_dir),
            request_timeout: config.request.request_timeout,
        })
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if a value is
    /// invalid (unknown provider, zero token budget).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        let config: TomlConfig =
            toml::from_str(&content).context("Failed to parse TOML configuration")?;

        Self::from_toml(config)
    }

    /// Load configuration for the running process
    ///
    /// An explicit path (from `--config` or `CONFIG_PATH`) must exist. When
    /// neither is given, `config.toml` is used if present and defaults apply
    /// otherwise. The API key is completed from the environment afterwards.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var("CONFIG_PATH").ok().map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env_credential(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Fill in the API key from the environment when the file carries none
    pub fn apply_env_credential<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing = self
            .api_key
            .as_ref()
            .is_none_or(|key| key.trim().is_empty());

        if missing {
            self.api_key = lookup(self.provider.api_key_env()).filter(|key| !key.trim().is_empty());
        }
    }

    /// Validate API key format based on provider
    ///
    /// For OpenAI: checks that the API key starts with 'sk-' prefix.
    /// For OpenRouter: checks that the key is non-empty.
    pub fn validate_api_key(&self) -> bool {
        match (&self.provider, &self.api_key) {
            (_, None) => false,
            (ProviderType::OpenAI, Some(key)) => {
                // Azure keys carry no prefix
                self.azure_api_version.is_some() || key.starts_with("sk-")
            }
            (ProviderType::OpenRouter, Some(key)) => !key.is_empty(),
        }
    }
}
