//! Config file commands.

use super::{AppContext, Render};
use crate::cli::ConfigSubcommand;
use crate::error::AppError;
use crate::models::AppConfig;
use crate::services::config_store;
use serde::Serialize;
use std::path::PathBuf;

/// Response for config commands. The token is always redacted.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ConfigResponse {
    Config(AppConfig),
    Path { path: PathBuf },
}

impl Render for ConfigResponse {
    fn render(&self) -> String {
        match self {
            ConfigResponse::Config(config) => {
                serde_json::to_string_pretty(config).unwrap_or_default()
            }
            ConfigResponse::Path { path } => path.display().to_string(),
        }
    }
}

/// Dispatch a `config` subcommand.
pub fn handle(ctx: &AppContext, command: ConfigSubcommand) -> Result<ConfigResponse, AppError> {
    match command {
        ConfigSubcommand::Show => Ok(ConfigResponse::Config(ctx.load_config()?.redacted())),
        ConfigSubcommand::Path => Ok(ConfigResponse::Path {
            path: ctx.config_path.clone(),
        }),
        ConfigSubcommand::Set { key, value } => {
            let mut config = ctx.load_config()?;
            config.set(key.trim(), &value)?;
            ctx.save_config(&config)?;
            log::info!("[config] Set {}", key.trim());
            Ok(ConfigResponse::Config(config.redacted()))
        }
        ConfigSubcommand::Import { file } => {
            let config = config_store::import(&file, &ctx.config_path)?;
            Ok(ConfigResponse::Config(config.redacted()))
        }
    }
}
