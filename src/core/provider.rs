//! Provider abstraction layer for vision-capable chat APIs
//!
//! This module defines the common trait implemented by every chat-completion
//! backend, the error type they share, and the factory that builds the
//! configured provider once per process.

use crate::core::config::Config;
use crate::core::providers::{OpenAIProvider, OpenRouterProvider};
use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Error types for provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key configured; set {0} or add it to the config file")]
    MissingCredential(&'static str),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProviderError {
    /// Map a non-success HTTP status and its (already classified) body
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(message),
            429 => ProviderError::RateLimit(message),
            400 => ProviderError::BadRequest(message),
            _ => ProviderError::Api { status, message },
        }
    }
}

/// Trait for chat-completion providers
///
/// Implementations are stateless per request and shared behind an `Arc`
/// across concurrent verifications.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send a non-streaming chat completion request
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    OpenRouter,
}

impl ProviderType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "azure" => Some(ProviderType::OpenAI),
            "openrouter" => Some(ProviderType::OpenRouter),
            _ => None,
        }
    }

    /// Environment variable consulted when the config file has no key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// Build the configured provider
///
/// This is the single construction point for the process-wide client; callers
/// hold the returned handle and pass it to every verifier they create.
pub fn build_provider(config: &Config) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ProviderError::MissingCredential(config.provider.api_key_env()))?;

    let provider: Arc<dyn Provider> = match config.provider {
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(
            api_key,
            config.base_url.clone(),
            config.request_timeout,
            config.azure_api_version.clone(),
        )?),
        ProviderType::OpenRouter => Arc::new(OpenRouterProvider::new(
            api_key,
            config.base_url.clone(),
            config.request_timeout,
            config.openrouter_site_url.clone(),
            config.openrouter_app_name.clone(),
        )?),
    };

    Ok(provider)
}
