//! Image format resolution
//!
//! Normalizes a file extension or a decoded image's declared format into one
//! of the five encodings vision models accept, rejecting everything else
//! before any bytes are read or sent.

use super::error::VerifyError;
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Normalized image format tag
///
/// `Jpg` and `Jpeg` are kept distinct so the tag echoes what the caller
/// supplied; both encode through the JPEG codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatTag {
    Png,
    Jpeg,
    Jpg,
    Gif,
    Webp,
}

impl ImageFormatTag {
    pub const ALL: [ImageFormatTag; 5] = [
        ImageFormatTag::Png,
        ImageFormatTag::Jpeg,
        ImageFormatTag::Jpg,
        ImageFormatTag::Gif,
        ImageFormatTag::Webp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormatTag::Png => "png",
            ImageFormatTag::Jpeg => "jpeg",
            ImageFormatTag::Jpg => "jpg",
            ImageFormatTag::Gif => "gif",
            ImageFormatTag::Webp => "webp",
        }
    }

    /// Resolve a tag from a file path's extension
    pub fn from_path(path: &Path) -> Result<Self, VerifyError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    /// Resolve a tag from a decoded image's self-reported format
    ///
    /// Images that report no format are treated as PNG.
    pub fn from_image_format(format: Option<ImageFormat>) -> Result<Self, VerifyError> {
        match format {
            None | Some(ImageFormat::Png) => Ok(ImageFormatTag::Png),
            Some(ImageFormat::Jpeg) => Ok(ImageFormatTag::Jpeg),
            Some(ImageFormat::Gif) => Ok(ImageFormatTag::Gif),
            Some(ImageFormat::WebP) => Ok(ImageFormatTag::Webp),
            Some(other) => Err(VerifyError::UnsupportedFormat(
                format!("{:?}", other).to_lowercase(),
            )),
        }
    }

    /// Codec used to serialize a decoded image under this tag
    pub fn codec(&self) -> ImageFormat {
        match self {
            ImageFormatTag::Png => ImageFormat::Png,
            ImageFormatTag::Jpeg | ImageFormatTag::Jpg => ImageFormat::Jpeg,
            ImageFormatTag::Gif => ImageFormat::Gif,
            ImageFormatTag::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for ImageFormatTag {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim_start_matches('.').to_lowercase();
        ImageFormatTag::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == tag)
            .ok_or(VerifyError::UnsupportedFormat(tag))
    }
}

impl fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
