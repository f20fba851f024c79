//! Letter text and file naming.

use crate::models::AppConfig;
use chrono::NaiveDateTime;

/// Name of the per-folder delivery log file.
pub const LOG_FILE_NAME: &str = "delivery_log.txt";

/// Characters of the message kept in a log line.
pub const PREVIEW_CHARS: usize = 30;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Builds letter bodies, file paths and log lines from the config.
#[derive(Debug, Clone)]
pub struct Composer {
    recipient: String,
    closing: String,
    sender: String,
    file_prefix: String,
}

impl Composer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            recipient: config.recipient.clone(),
            closing: config.closing.clone(),
            sender: config.sender.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Render a letter. Text is placed verbatim; inputs are trimmed once
    /// when the request is built.
    pub fn compose(
        &self,
        template_text: &str,
        message: &str,
        emoji: &str,
        now: NaiveDateTime,
    ) -> String {
        format!(
            "\nTo {}, {}\n\n{}\n{} {}\n\n{}\n{}\n",
            self.recipient,
            now.format(DISPLAY_FORMAT),
            template_text,
            message,
            emoji,
            self.closing,
            self.sender,
        )
    }

    /// Path of a letter file. `seq` is the position in the batch; letters
    /// after the first get a numeric suffix so a batch sent within one
    /// second never collides.
    pub fn letter_path(&self, folder: &str, now: NaiveDateTime, seq: u32) -> String {
        let stamp = now.format(FILE_STAMP_FORMAT);
        if seq == 0 {
            format!("{}/{}-{}.txt", folder, self.file_prefix, stamp)
        } else {
            format!("{}/{}-{}-{}.txt", folder, self.file_prefix, stamp, seq + 1)
        }
    }
}

/// Path of the delivery log inside a folder.
pub fn log_path(folder: &str) -> String {
    format!("{}/{}", folder, LOG_FILE_NAME)
}

/// First `PREVIEW_CHARS` characters of a message.
pub fn preview(message: &str) -> String {
    message.chars().take(PREVIEW_CHARS).collect()
}

/// One line of the delivery log.
pub fn log_entry(now: NaiveDateTime, path: &str, theme: &str, message: &str) -> String {
    format!(
        "{} | {} | Theme: {} | Message: {}...\n",
        now.format(DISPLAY_FORMAT),
        path,
        theme,
        preview(message)
    )
}
