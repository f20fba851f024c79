//! Persisted application configuration.
//!
//! The first three keys (`token`, `repo`, `branch_folder`) are the whole file
//! written by older versions; every other key is optional and defaulted.

use crate::error::AppError;
use crate::models::destination::{parse_destinations, Destination, RepoId};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Folder used when a destination names only a branch.
pub const DEFAULT_FOLDER: &str = "letters";

/// Bounds on how many letters one send (or one scheduled run) produces.
pub const MIN_LETTERS_PER_DAY: u32 = 1;
pub const MAX_LETTERS_PER_DAY: u32 = 10;

/// Format of `send_time`.
pub const SEND_TIME_FORMAT: &str = "%H:%M";

/// Application configuration stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GitHub access token. Empty when the token lives in the keychain.
    pub token: String,

    /// Repository identifier, `owner/name`.
    pub repo: String,

    /// Comma-separated destinations, each `branch` or `branch/folder`.
    pub branch_folder: String,

    /// Base URL of the GitHub REST API.
    pub api_url: String,

    /// Greeting target in the first line of every letter.
    pub recipient: String,

    /// Closing line before the sender name.
    pub closing: String,

    /// Name signed under the closing line.
    pub sender: String,

    /// Theme used when `--theme` is not given.
    pub theme: String,

    /// Emoji appended after the message.
    pub emoji: String,

    /// Letters per scheduled run (and default `--count` for `send`).
    pub letters_per_day: u32,

    /// Daily send time, `HH:MM` local time.
    pub send_time: String,

    /// Folder for destinations that only name a branch.
    pub default_folder: String,

    /// File name prefix for letters.
    pub file_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            repo: String::new(),
            branch_folder: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            recipient: "my dear".to_string(),
            closing: "Yours forever,".to_string(),
            sender: "repo-courier".to_string(),
            theme: "romantic".to_string(),
            emoji: String::new(),
            letters_per_day: MIN_LETTERS_PER_DAY,
            send_time: "09:00".to_string(),
            default_folder: DEFAULT_FOLDER.to_string(),
            file_prefix: "letter".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse and validate the repository identifier.
    pub fn repo_id(&self) -> Result<RepoId, AppError> {
        RepoId::parse(&self.repo)
    }

    /// Parse the destination list.
    pub fn destinations(&self) -> Result<Vec<Destination>, AppError> {
        parse_destinations(&self.branch_folder, &self.default_folder)
    }

    /// Parse the daily send time.
    pub fn send_time(&self) -> Result<NaiveTime, AppError> {
        parse_send_time(&self.send_time)
    }

    /// Return the configured token, if any.
    pub fn token(&self) -> Option<&str> {
        let token = self.token.trim();
        (!token.is_empty()).then_some(token)
    }

    /// Set a single key by name, validating the value.
    ///
    /// Used by `config set`; key names match the JSON keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        match key {
            "token" => self.token = value.to_string(),
            "repo" => {
                RepoId::parse(value)?;
                self.repo = value.to_string();
            }
            "branch_folder" => {
                parse_destinations(value, &self.default_folder)?;
                self.branch_folder = value.to_string();
            }
            "api_url" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    return Err(AppError::invalid_input_field(
                        "API URL must start with http:// or https://",
                        key,
                    ));
                }
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "recipient" => self.recipient = value.to_string(),
            "closing" => self.closing = value.to_string(),
            "sender" => self.sender = value.to_string(),
            "theme" => self.theme = value.to_string(),
            "emoji" => self.emoji = value.to_string(),
            "letters_per_day" => {
                let count = value.parse::<u32>().map_err(|_| {
                    AppError::invalid_input_field("letters_per_day must be a number", key)
                })?;
                self.letters_per_day = validate_letter_count(count)?;
            }
            "send_time" => {
                parse_send_time(value)?;
                self.send_time = value.to_string();
            }
            "default_folder" => {
                let folder = value.trim_matches('/');
                if folder.is_empty() {
                    return Err(AppError::invalid_input_field("Folder cannot be empty", key));
                }
                self.default_folder = folder.to_string();
            }
            "file_prefix" => {
                if value.is_empty() || value.contains('/') {
                    return Err(AppError::invalid_input_field(
                        "File prefix must be non-empty and contain no '/'",
                        key,
                    ));
                }
                self.file_prefix = value.to_string();
            }
            _ => {
                return Err(AppError::invalid_input_field(
                    format!("Unknown config key '{}'", key),
                    "key",
                ))
            }
        }
        Ok(())
    }

    /// Copy with the token blanked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.token.is_empty() {
            copy.token = "********".to_string();
        }
        copy
    }
}

/// Parse an `HH:MM` send time.
pub fn parse_send_time(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), SEND_TIME_FORMAT).map_err(|_| {
        AppError::invalid_input_field(
            format!("Invalid send time '{}', expected HH:MM", value),
            "send_time",
        )
    })
}

/// Check a letter count against the allowed range.
pub fn validate_letter_count(count: u32) -> Result<u32, AppError> {
    if (MIN_LETTERS_PER_DAY..=MAX_LETTERS_PER_DAY).contains(&count) {
        Ok(count)
    } else {
        Err(AppError::invalid_input_field(
            format!(
                "Letter count must be between {} and {}",
                MIN_LETTERS_PER_DAY, MAX_LETTERS_PER_DAY
            ),
            "count",
        ))
    }
}
