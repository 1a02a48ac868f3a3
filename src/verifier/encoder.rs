//! Base64 image encoding

use super::format::ImageFormatTag;
use super::source::RawImage;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Base64 payload ready to be embedded in a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub format: ImageFormatTag,
}

impl EncodedImage {
    pub fn encode(raw: &RawImage) -> Self {
        Self {
            data: STANDARD.encode(&raw.bytes),
            format: raw.format,
        }
    }

    /// `data:image/<format>;base64,<data>`
    pub fn data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.format, self.data)
    }
}
