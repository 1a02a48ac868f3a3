//! Verification error taxonomy

use crate::core::provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a caption verification
///
/// `ImageNotFound` and `UnsupportedFormat` are raised before any encoding or
/// network work. Everything the remote call can go wrong with arrives as
/// `Provider` with the underlying cause attached.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Image not found at {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Unsupported image format '{0}'. Please use one of: png, jpeg, jpg, gif, webp")]
    UnsupportedFormat(String),

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process image: {0}")]
    ImageCodec(#[from] image::ImageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl VerifyError {
    /// Whether the failure came from the caller's input rather than the provider
    pub fn is_input_error(&self) -> bool {
        !matches!(self, VerifyError::Provider(_))
    }
}
