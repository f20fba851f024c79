//! Delivery history models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    Letter,
    Upload,
}

impl From<&str> for DeliveryKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "upload" => Self::Upload,
            _ => Self::Letter,
        }
    }
}

impl std::fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Letter => write!(f, "letter"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
    /// Upload target already had identical content.
    Skipped,
}

impl From<&str> for DeliveryStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "success" => Self::Success,
            "skipped" => Self::Skipped,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// A row of the `deliveries` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryRecord {
    pub id: i64,

    /// `letter` or `upload`.
    pub kind: String,

    /// Repository, `owner/name`.
    pub repo: String,

    pub branch: String,

    /// Path of the file inside the repository.
    pub remote_path: String,

    /// Theme name (letters only).
    pub theme: Option<String>,

    /// First characters of the message (letters only).
    pub preview: Option<String>,

    /// Hex SHA-256 of the committed content.
    pub content_sha256: String,

    /// Commit created by GitHub, when the delivery succeeded.
    pub commit_sha: Option<String>,

    /// `success`, `failed` or `skipped`.
    pub status: String,

    /// Error message for failed deliveries.
    pub message: Option<String>,

    /// Unix timestamp of the attempt.
    pub timestamp: i64,
}

impl DeliveryRecord {
    pub fn kind_enum(&self) -> DeliveryKind {
        DeliveryKind::from(self.kind.as_str())
    }

    pub fn status_enum(&self) -> DeliveryStatus {
        DeliveryStatus::from(self.status.as_str())
    }
}

/// Data for inserting a delivery row.
#[derive(Debug, Clone, Serialize)]
pub struct NewDelivery {
    pub kind: DeliveryKind,
    pub repo: String,
    pub branch: String,
    pub remote_path: String,
    pub theme: Option<String>,
    pub preview: Option<String>,
    pub content_sha256: String,
    pub commit_sha: Option<String>,
    pub status: DeliveryStatus,
    pub message: Option<String>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_strings() {
        for status in [
            DeliveryStatus::Success,
            DeliveryStatus::Failed,
            DeliveryStatus::Skipped,
        ] {
            assert_eq!(DeliveryStatus::from(status.to_string().as_str()), status);
        }
        assert_eq!(DeliveryStatus::from("garbage"), DeliveryStatus::Failed);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(DeliveryKind::from("UPLOAD"), DeliveryKind::Upload);
        assert_eq!(DeliveryKind::from("letter"), DeliveryKind::Letter);
    }
}
