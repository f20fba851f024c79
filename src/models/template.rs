//! Letter theme model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named letter template stored in SQLite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Template {
    /// Theme name (primary key).
    pub name: String,

    /// Text placed between the greeting and the message.
    pub body: String,

    /// Seeded at startup; may be overridden but not removed.
    pub builtin: bool,

    /// Unix timestamp of creation.
    pub created_at: i64,

    /// Unix timestamp of the last body change.
    pub updated_at: i64,
}

/// Themes seeded into every new database.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "romantic",
        "Every second with you is a happiness nothing could replace.",
    ),
    (
        "poetic",
        "Like stars dancing in a dark night sky, you light up my heart.",
    ),
    (
        "playful",
        "If you were a program, I would be your debugger for life.",
    ),
];
