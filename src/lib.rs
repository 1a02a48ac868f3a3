//! Photo caption verifier
//!
//! Asks a vision-capable chat model whether a caption accurately describes an
//! image. The [`verifier::CaptionVerifier`] pipeline is shared by the command
//! line tool and the HTTP service in [`api`].

pub mod api;
pub mod core;
pub mod models;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use verifier::{
    CaptionVerifier, DecodedImageSource, FileSource, ImageFormatTag, ImageSource,
    VerificationResult, VerifyError,
};
