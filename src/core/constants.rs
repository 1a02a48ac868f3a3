//! Constants for message roles, content part types, and prompt text
//!
//! This module defines the string constants used when building chat requests
//! for the vision model, plus the defaults shared by the CLI and the web UI.

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";

    /// Assistant role identifier
    pub const ASSISTANT: &str = "assistant";
}

/// Content part type constants
pub mod content {
    /// Text content part
    pub const TEXT: &str = "text";

    /// Image reference content part
    pub const IMAGE_URL: &str = "image_url";
}

/// Prompt text fragments
pub mod prompt {
    /// Leading instruction; the caption is appended in single quotes
    pub const VERIFY_PREFIX: &str = "Please verify if this caption accurately describes the image: ";

    /// Separator placed before caller-supplied instructions
    pub const INSTRUCTIONS_PREFIX: &str = "\n\nAdditional instructions: ";
}

/// Model selection defaults
pub mod model {
    /// Vision-capable chat model used when none is configured
    pub const DEFAULT_NAME: &str = "gpt-4o";

    /// Upper bound on the length of the verdict
    pub const DEFAULT_MAX_TOKENS: u32 = 500;
}

/// Defaults offered by the command line and the web UI
pub mod defaults {
    /// Image path used by `verify` when none is given
    pub const IMAGE_PATH: &str = "mountains.jpg";

    /// Caption pre-filled in the CLI and the web form
    pub const CAPTION: &str = "A beautiful sunset over mountains";

    /// Instructions pre-filled in the CLI and the web form
    pub const INSTRUCTIONS: &str = "Please check if the colors and composition match the caption. Your response must start with 'correct' or 'incorrect'.";
}
