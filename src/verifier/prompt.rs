//! Verification prompt construction
//!
//! Builds the single user message sent to the vision model: one text part
//! carrying the caption (and any extra instructions), followed by one image
//! part referencing the encoded image.

use super::encoder::EncodedImage;
use crate::core::constants::prompt;
use crate::models::openai::{ChatCompletionRequest, ChatMessage, ContentPart};

/// Build the instruction text for a caption
///
/// Blank or whitespace-only instructions are treated the same as none.
pub fn build_prompt_text(caption: &str, instructions: Option<&str>) -> String {
    let mut text = format!("{}'{}'", prompt::VERIFY_PREFIX, caption);

    if let Some(extra) = instructions.filter(|s| !s.trim().is_empty()) {
        text.push_str(prompt::INSTRUCTIONS_PREFIX);
        text.push_str(extra);
    }

    text
}

/// Build the message list: exactly one user message, text first, image second
pub fn build_messages(
    caption: &str,
    instructions: Option<&str>,
    image: &EncodedImage,
) -> Vec<ChatMessage> {
    vec![ChatMessage::user(vec![
        ContentPart::text(build_prompt_text(caption, instructions)),
        ContentPart::image_url(image.data_url()),
    ])]
}

/// Assemble the full chat completion request
pub fn build_verification_request(
    model: &str,
    max_tokens: u32,
    caption: &str,
    instructions: Option<&str>,
    image: &EncodedImage,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: build_messages(caption, instructions, image),
        max_tokens: Some(max_tokens),
    }
}
