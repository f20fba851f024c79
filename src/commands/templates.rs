//! Theme management commands.

use super::{AppContext, Render};
use crate::cli::TemplateSubcommand;
use crate::db::templates;
use crate::error::AppError;
use crate::models::Template;
use serde::Serialize;

/// Response for template commands.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TemplateResponse {
    List(Vec<Template>),
    One(Template),
    Removed { removed: String },
}

impl Render for TemplateResponse {
    fn render(&self) -> String {
        match self {
            TemplateResponse::List(list) => list
                .iter()
                .map(|t| {
                    format!(
                        "{}{}: {}",
                        t.name,
                        if t.builtin { " (built-in)" } else { "" },
                        t.body
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            TemplateResponse::One(t) => format!("{}\n\n{}", t.name, t.body),
            TemplateResponse::Removed { removed } => format!("Removed theme '{}'", removed),
        }
    }
}

/// Dispatch a `template` subcommand.
pub async fn handle(ctx: &AppContext, command: TemplateSubcommand) -> Result<TemplateResponse, AppError> {
    let pool = ctx.open_db().await?;

    match command {
        TemplateSubcommand::List => Ok(TemplateResponse::List(
            templates::list_templates(&pool).await?,
        )),
        TemplateSubcommand::Show { name } => Ok(TemplateResponse::One(
            templates::require_template(&pool, &name).await?,
        )),
        TemplateSubcommand::Add { name, body } => {
            let template = templates::upsert_template(&pool, &name, &body).await?;
            log::info!("[template] Saved theme '{}'", template.name);
            Ok(TemplateResponse::One(template))
        }
        TemplateSubcommand::Remove { name } => {
            templates::delete_template(&pool, &name).await?;
            log::info!("[template] Removed theme '{}'", name.trim());
            Ok(TemplateResponse::Removed {
                removed: name.trim().to_string(),
            })
        }
    }
}
