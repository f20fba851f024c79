//! CLI command handlers.
//!
//! Each subcommand has a handler returning a serializable response, which
//! `run` prints either as JSON or as human-readable text via [`Render`].
//! Commands are organized by functionality:
//! - `send`: compose and send letters
//! - `upload`: upload a local file
//! - `schedule`: daily scheduler
//! - `templates`: theme management
//! - `config`: config file inspection and editing
//! - `auth`: keychain token management and verification
//! - `history`: local delivery history

pub mod auth;
pub mod config;
pub mod history;
pub mod schedule;
pub mod send;
pub mod templates;
pub mod upload;

use crate::cli::TargetArgs;
use crate::db::{self, pool::DbPool};
use crate::error::AppError;
use crate::models::AppConfig;
use crate::services::config_store;
use crate::services::courier::DeliveryReport;
use crate::services::credentials;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Human-readable rendering of a command response.
pub trait Render {
    fn render(&self) -> String;
}

/// Paths and flags shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Active config file.
    pub config_path: PathBuf,

    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,

    /// Token given on the command line or in the environment.
    pub token_override: Option<String>,
}

impl AppContext {
    pub fn new(
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        token_override: Option<String>,
    ) -> Self {
        Self {
            config_path: config_path.unwrap_or_else(config_store::default_config_path),
            data_dir: data_dir.unwrap_or_else(default_data_dir),
            token_override,
        }
    }

    /// Load the active config.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        config_store::load(&self.config_path)
    }

    /// Persist the active config.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), AppError> {
        config_store::save(&self.config_path, config)
    }

    /// Open (and migrate) the local database.
    pub async fn open_db(&self) -> Result<DbPool, AppError> {
        Ok(db::initialize(&db::get_db_path(&self.data_dir)).await?)
    }

    /// Resolve the token for `config`, failing when none is available.
    pub fn require_token(&self, config: &AppConfig) -> Result<String, AppError> {
        credentials::resolve_token(self.token_override.as_deref(), config.token(), &config.api_url)
            .ok_or_else(|| {
                AppError::authentication(
                    "No GitHub token found. Pass --token, set REPO_COURIER_TOKEN, or run `repo-courier auth login`.",
                )
            })
    }
}

/// Default data directory (`<data dir>/repo-courier`).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("repo-courier"))
        .unwrap_or_else(|| PathBuf::from(".repo-courier"))
}

/// Apply `--repo`/`--to` overrides to the in-memory config.
///
/// Returns whether anything changed. Callers save the config only once the
/// delivery has passed its local checks.
pub(crate) fn apply_target_overrides(
    config: &mut AppConfig,
    target: &TargetArgs,
) -> Result<bool, AppError> {
    let mut changed = false;

    if let Some(repo) = &target.repo {
        config.set("repo", repo)?;
        changed = true;
    }
    if let Some(destinations) = &target.destinations {
        config.set("branch_folder", destinations)?;
        changed = true;
    }

    Ok(changed)
}

impl Render for DeliveryReport {
    fn render(&self) -> String {
        let mut out = String::new();
        for delivered in &self.delivered {
            let _ = writeln!(
                out,
                "✔ {} {} ({}){}",
                delivered.branch,
                delivered.path,
                serde_json::to_value(delivered.operation)
                    .ok()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                delivered
                    .commit_sha
                    .as_deref()
                    .map(|sha| format!(" {}", &sha[..sha.len().min(7)]))
                    .unwrap_or_default()
            );
            if let Some(log_error) = &delivered.log_error {
                let _ = writeln!(out, "  ! log not updated: {}", log_error);
            }
        }
        for failed in &self.failed {
            let _ = writeln!(out, "✘ {} {}: {}", failed.branch, failed.path, failed.error);
        }
        let _ = write!(
            out,
            "{} delivered, {} failed",
            self.delivered.len(),
            self.failed.len()
        );
        out
    }
}
