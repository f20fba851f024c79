//! Database queries for letter themes.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::template::{Template, BUILTIN_TEMPLATES};

/// Insert the built-in themes if they are missing. Existing rows, including
/// user overrides of a built-in, are left alone.
pub async fn seed_builtins(pool: &DbPool) -> Result<(), sqlx::Error> {
    for (name, body) in BUILTIN_TEMPLATES {
        sqlx::query("INSERT OR IGNORE INTO templates (name, body, builtin) VALUES (?, ?, 1)")
            .bind(name)
            .bind(body)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// List all themes ordered by name.
pub async fn list_templates(pool: &DbPool) -> Result<Vec<Template>, AppError> {
    let templates = sqlx::query_as::<_, Template>(
        "SELECT name, body, builtin, created_at, updated_at FROM templates ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(templates)
}

/// Get a theme by name.
pub async fn get_template(pool: &DbPool, name: &str) -> Result<Option<Template>, AppError> {
    let template = sqlx::query_as::<_, Template>(
        "SELECT name, body, builtin, created_at, updated_at FROM templates WHERE name = ?",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(template)
}

/// Get a theme by name, failing with `NotFound` when it does not exist.
pub async fn require_template(pool: &DbPool, name: &str) -> Result<Template, AppError> {
    get_template(pool, name)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("template", name.trim()))
}

/// Add a theme or replace the body of an existing one.
pub async fn upsert_template(pool: &DbPool, name: &str, body: &str) -> Result<Template, AppError> {
    let name = name.trim();
    let body = body.trim();

    if name.is_empty() {
        return Err(AppError::invalid_input_field("Theme name cannot be empty", "name"));
    }
    if body.is_empty() {
        return Err(AppError::invalid_input_field("Theme text cannot be empty", "body"));
    }

    let now = chrono::Utc::now().timestamp();
    let template = sqlx::query_as::<_, Template>(
        r#"
        INSERT INTO templates (name, body, builtin, created_at, updated_at)
        VALUES (?1, ?2, 0, ?3, ?3)
        ON CONFLICT (name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
        RETURNING name, body, builtin, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(body)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(template)
}

/// Remove a user-defined theme.
pub async fn delete_template(pool: &DbPool, name: &str) -> Result<(), AppError> {
    let template = require_template(pool, name).await?;

    if template.builtin {
        return Err(AppError::invalid_input_field(
            format!("'{}' is a built-in theme and cannot be removed", template.name),
            "name",
        ));
    }

    sqlx::query("DELETE FROM templates WHERE name = ?")
        .bind(&template.name)
        .execute(pool)
        .await?;

    Ok(())
}
