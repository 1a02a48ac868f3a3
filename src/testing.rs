//! Test doubles shared by unit tests

use crate::core::constants::role;
use crate::core::provider::{Provider, ProviderError};
use crate::models::openai::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, ResponseMessage, Usage,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

enum Reply {
    Text(String),
    NoChoices,
    Pending,
    Fail(Box<dyn Fn() -> ProviderError + Send + Sync>),
}

/// Provider that answers every request with a canned completion
pub struct StubProvider {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatCompletionRequest>>,
}

impl StubProvider {
    pub fn new(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> ProviderError + Send + Sync + 'static,
    {
        Self::with_reply(Reply::Fail(Box::new(make_error)))
    }

    pub fn without_choices() -> Self {
        Self::with_reply(Reply::NoChoices)
    }

    /// Provider whose requests never complete
    pub fn pending() -> Self {
        Self::with_reply(Reply::Pending)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let choices = match &self.reply {
            Reply::Text(text) => vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: role::ASSISTANT.to_string(),
                    content: Some(text.clone()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            Reply::NoChoices => Vec::new(),
            Reply::Pending => return std::future::pending().await,
            Reply::Fail(make_error) => return Err(make_error()),
        };

        Ok(ChatCompletionResponse {
            id: "chatcmpl-stub".to_string(),
            object: "chat.completion".to_string(),
            created: 1_700_000_000,
            model: "gpt-4o-stub".to_string(),
            choices,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }

    fn provider_name(&self) -> &str {
        "Stub"
    }
}

/// Encode a small red PNG in memory
pub fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 6, Rgb([180, 20, 20])));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Write a small red PNG into `dir` and return its path
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes()).unwrap();
    path
}
