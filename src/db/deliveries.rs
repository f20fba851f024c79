//! Database queries for the local delivery history.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::delivery::{DeliveryRecord, NewDelivery};

/// Maximum number of history rows to keep.
pub const MAX_DELIVERY_RECORDS: i64 = 500;

/// Record a delivery attempt and trim the history to its cap.
pub async fn record_delivery(pool: &DbPool, delivery: &NewDelivery) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO deliveries (
            kind, repo, branch, remote_path, theme, preview,
            content_sha256, commit_sha, status, message, timestamp
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(delivery.kind.to_string())
    .bind(&delivery.repo)
    .bind(&delivery.branch)
    .bind(&delivery.remote_path)
    .bind(&delivery.theme)
    .bind(&delivery.preview)
    .bind(&delivery.content_sha256)
    .bind(&delivery.commit_sha)
    .bind(delivery.status.to_string())
    .bind(&delivery.message)
    .bind(delivery.timestamp)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "DELETE FROM deliveries WHERE id NOT IN (SELECT id FROM deliveries ORDER BY timestamp DESC, id DESC LIMIT ?)",
    )
    .bind(MAX_DELIVERY_RECORDS)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Most recent deliveries, newest first.
pub async fn recent_deliveries(pool: &DbPool, limit: i64) -> Result<Vec<DeliveryRecord>, AppError> {
    let records = sqlx::query_as::<_, DeliveryRecord>(
        r#"
        SELECT id, kind, repo, branch, remote_path, theme, preview,
               content_sha256, commit_sha, status, message, timestamp
        FROM deliveries
        ORDER BY timestamp DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Count deliveries grouped by status: (success, failed, skipped).
pub async fn delivery_counts(pool: &DbPool) -> Result<(i64, i64, i64), AppError> {
    let row: (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'skipped' THEN 1 ELSE 0 END), 0)
        FROM deliveries
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
