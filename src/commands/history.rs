//! Delivery history command.

use super::{AppContext, Render};
use crate::cli::HistoryArgs;
use crate::db::deliveries;
use crate::error::AppError;
use crate::models::DeliveryRecord;
use chrono::{Local, TimeZone};
use serde::Serialize;

/// Response for `history`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: i64,
    pub failed: i64,
    pub skipped: i64,
    /// Newest first.
    pub entries: Vec<DeliveryRecord>,
}

impl Render for HistoryResponse {
    fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let when = Local
                    .timestamp_opt(entry.timestamp, 0)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| entry.timestamp.to_string());
                let mut line = format!(
                    "{} {:<7} {:<6} {}@{}:{}",
                    when, entry.status, entry.kind, entry.repo, entry.branch, entry.remote_path
                );
                if let Some(message) = &entry.message {
                    line.push_str(&format!(" ({})", message));
                }
                line
            })
            .collect();

        lines.push(format!(
            "Total: {} succeeded, {} failed, {} skipped",
            self.success, self.failed, self.skipped
        ));
        lines.join("\n")
    }
}

/// Show recent deliveries and overall counts.
pub async fn history(ctx: &AppContext, args: HistoryArgs) -> Result<HistoryResponse, AppError> {
    let pool = ctx.open_db().await?;
    let entries = deliveries::recent_deliveries(&pool, args.limit).await?;
    let (success, failed, skipped) = deliveries::delivery_counts(&pool).await?;

    Ok(HistoryResponse {
        success,
        failed,
        skipped,
        entries,
    })
}
