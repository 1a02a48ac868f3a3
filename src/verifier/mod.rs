//! Caption verification pipeline
//!
//! Every entry point runs the same sequence: resolve and load the image from
//! its source, base64-encode it, build one multimodal prompt, and send it to
//! the injected provider. Input problems are reported before the provider is
//! touched.

pub mod encoder;
pub mod error;
pub mod format;
pub mod prompt;
pub mod source;

pub use encoder::EncodedImage;
pub use error::VerifyError;
pub use format::ImageFormatTag;
pub use source::{DecodedImageSource, FileSource, ImageSource, RawImage};

use crate::core::config::Config;
use crate::core::constants::model;
use crate::core::provider::{Provider, ProviderError};
use crate::models::openai::{ChatCompletionResponse, Usage};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a successful verification
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// The model's verdict, by convention starting with "correct" or "incorrect"
    pub verification_text: String,

    /// Untouched provider response
    pub raw_response: ChatCompletionResponse,
}

impl VerificationResult {
    pub fn model(&self) -> &str {
        &self.raw_response.model
    }

    pub fn created(&self) -> i64 {
        self.raw_response.created
    }

    pub fn usage(&self) -> &Usage {
        &self.raw_response.usage
    }
}

/// Verifies captions against images with a vision-capable chat model
///
/// Cheap to clone and safe to share; the provider handle is immutable once
/// constructed.
#[derive(Clone)]
pub struct CaptionVerifier {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
}

impl CaptionVerifier {
    /// Create a verifier using the default model and token budget
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            model: model::DEFAULT_NAME.to_string(),
            max_tokens: model::DEFAULT_MAX_TOKENS,
        }
    }

    /// Create a verifier using the model settings from configuration
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Self {
        Self::new(provider)
            .with_model(config.model.clone())
            .with_max_tokens(config.max_tokens)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Verify a caption against an image stored on disk
    pub async fn verify_from_path(
        &self,
        path: impl AsRef<Path>,
        caption: &str,
        instructions: Option<&str>,
    ) -> Result<VerificationResult, VerifyError> {
        let source = FileSource::new(path.as_ref());
        self.verify(&source, caption, instructions).await
    }

    /// Verify a caption against an already-decoded image
    pub async fn verify_from_image_object(
        &self,
        image: &DecodedImageSource,
        caption: &str,
        instructions: Option<&str>,
    ) -> Result<VerificationResult, VerifyError> {
        self.verify(image, caption, instructions).await
    }

    /// Verify a caption against any image source
    pub async fn verify<S>(
        &self,
        source: &S,
        caption: &str,
        instructions: Option<&str>,
    ) -> Result<VerificationResult, VerifyError>
    where
        S: ImageSource + ?Sized,
    {
        let raw = source.load().await?;
        let encoded = EncodedImage::encode(&raw);
        drop(raw);

        info!(
            "Verifying caption ({} chars) against {} as {} with {}",
            caption.chars().count(),
            source.describe(),
            encoded.format,
            self.model
        );

        let request = prompt::build_verification_request(
            &self.model,
            self.max_tokens,
            caption,
            instructions,
            &encoded,
        );

        let response = self
            .provider
            .create_chat_completion(&request)
            .await
            .inspect_err(|e| error!("{} request failed: {}", self.provider.provider_name(), e))?;

        let verification_text = response
            .first_text()
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response contained no message content".to_string())
            })?
            .to_string();

        info!(
            "Verification complete: model={}, total_tokens={}",
            response.model, response.usage.total_tokens
        );

        Ok(VerificationResult {
            verification_text,
            raw_response: response,
        })
    }
}
