//! Input for composing letters.

use serde::{Deserialize, Serialize};

/// What the user asked to send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRequest {
    /// Free-text message; empty for scheduled letters.
    pub message: String,

    /// Theme (template) name.
    pub theme: String,

    /// Optional emoji appended after the message.
    pub emoji: String,
}

impl LetterRequest {
    pub fn new(
        message: impl Into<String>,
        theme: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into().trim().to_string(),
            theme: theme.into().trim().to_string(),
            emoji: emoji.into().trim().to_string(),
        }
    }
}
