//! OpenRouter provider implementation

use crate::core::provider::{Provider, ProviderError};
use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::error;

/// OpenRouter provider
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
    site_url: Option<String>,
    app_name: Option<String>,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenRouter API key
    /// * `base_url` - OpenRouter API base URL
    /// * `timeout` - Request timeout in seconds
    /// * `site_url` - Optional site URL for OpenRouter credits
    /// * `app_name` - Optional application name
    pub fn new(
        api_key: String,
        base_url: String,
        timeout: u64,
        site_url: Option<String>,
        app_name: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            api_key,
            base_url,
            site_url,
            app_name,
        })
    }

    /// Classify OpenRouter errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid") && error_lower.contains("api") {
            return "Invalid API key. Please check your OPENROUTER_API_KEY configuration."
                .to_string();
        }

        if error_lower.contains("rate_limit") || error_lower.contains("quota") {
            return "Rate limit exceeded. Please wait and try again.".to_string();
        }

        if error_lower.contains("insufficient") && error_lower.contains("credits") {
            return "Insufficient credits. Please add credits to your OpenRouter account."
                .to_string();
        }

        if error_lower.contains("model")
            && (error_lower.contains("not found") || error_lower.contains("does not exist"))
        {
            return "Model not found. Please check the [model] name in your configuration."
                .to_string();
        }

        error_detail.to_string()
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            "Sending request to OpenRouter: model={}, max_tokens={:?}",
            request.model,
            request.max_tokens
        );

        let mut req_builder = self.client.post(&url).bearer_auth(&self.api_key);

        // OpenRouter attribution headers
        if let Some(ref site_url) = self.site_url {
            req_builder = req_builder.header("HTTP-Referer", site_url);
        }
        if let Some(ref app_name) = self.app_name {
            req_builder = req_builder.header("X-Title", app_name);
        }

        let response = req_builder
            .json(request)
            .send()
            .await
            .map_err(ProviderError::Network)?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("OpenRouter returned {}: {}", status, error_text);

            if status.as_u16() == 402 {
                return Err(ProviderError::BadRequest(
                    "Insufficient credits. Please add credits to your OpenRouter account."
                        .to_string(),
                ));
            }
            return Err(ProviderError::from_status(
                status.as_u16(),
                Self::classify_error(&error_text),
            ));
        }

        let body = response.text().await.map_err(ProviderError::Network)?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            "OpenRouter response: model={}, sent_tokens={}, received_tokens={}",
            completion.model,
            completion.usage.prompt_tokens,
            completion.usage.completion_tokens
        );

        Ok(completion)
    }

    fn provider_name(&self) -> &str {
        "OpenRouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::{ChatMessage, ContentPart};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "openai/gpt-4o".to_string(),
            messages: vec![ChatMessage::user(vec![ContentPart::text("hi")])],
            max_tokens: Some(500),
        }
    }

    #[test]
    fn test_classify_credits_error() {
        let result = OpenRouterProvider::classify_error("Insufficient credits remaining");
        assert!(result.contains("credits"));
    }

    #[tokio::test]
    async fn test_attribution_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer or-key"))
            .and(header("HTTP-Referer", "https://example.com"))
            .and(header("X-Title", "caption-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "gen-1",
                "object": "chat.completion",
                "created": 1715367049,
                "model": "openai/gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "incorrect"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(
            "or-key".into(),
            server.uri(),
            5,
            Some("https://example.com".into()),
            Some("caption-verifier".into()),
        )
        .unwrap();
        let response = provider.create_chat_completion(&sample_request()).await.unwrap();
        assert_eq!(response.first_text(), Some("incorrect"));
    }

    #[tokio::test]
    async fn test_payment_required_is_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let provider =
            OpenRouterProvider::new("or-key".into(), server.uri(), 5, None, None).unwrap();
        let err = provider.create_chat_completion(&sample_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::BadRequest(ref msg) if msg.contains("credits")));
    }
}
