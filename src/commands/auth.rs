//! Token management commands.
//!
//! The token can live in the config file, come from `--token` /
//! `REPO_COURIER_TOKEN`, or be stored in the OS keychain, keyed by API URL.

use super::{AppContext, Render};
use crate::cli::AuthSubcommand;
use crate::error::AppError;
use crate::services::courier::Courier;
use crate::services::credentials::CredentialService;
use crate::services::github_client::{GitHubClient, GitHubClientConfig};
use serde::Serialize;
use std::io::BufRead;

/// Where the active token comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Flag,
    Config,
    Keychain,
    None,
}

/// Response for auth commands.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AuthResponse {
    LoggedIn {
        api_url: String,
        login: String,
    },
    LoggedOut {
        api_url: String,
    },
    Status {
        api_url: String,
        source: TokenSource,
    },
    Verified {
        login: String,
        repository: String,
        default_branch: String,
        private: bool,
        destinations: Vec<String>,
    },
}

impl Render for AuthResponse {
    fn render(&self) -> String {
        match self {
            AuthResponse::LoggedIn { api_url, login } => {
                format!("Token for {} stored in keychain (user {})", api_url, login)
            }
            AuthResponse::LoggedOut { api_url } => format!("Token for {} removed", api_url),
            AuthResponse::Status { api_url, source } => match source {
                TokenSource::Flag => format!("{}: token from --token / REPO_COURIER_TOKEN", api_url),
                TokenSource::Config => format!("{}: token from config file", api_url),
                TokenSource::Keychain => format!("{}: token from keychain", api_url),
                TokenSource::None => format!("{}: no token configured", api_url),
            },
            AuthResponse::Verified {
                login,
                repository,
                default_branch,
                private,
                destinations,
            } => format!(
                "Authenticated as {}\nRepository {} ({}, default branch {})\nDestinations: {}",
                login,
                repository,
                if *private { "private" } else { "public" },
                default_branch,
                destinations.join(", ")
            ),
        }
    }
}

/// Dispatch an `auth` subcommand.
pub async fn handle(ctx: &AppContext, command: AuthSubcommand) -> Result<AuthResponse, AppError> {
    match command {
        AuthSubcommand::Login => login(ctx).await,
        AuthSubcommand::Logout => logout(ctx),
        AuthSubcommand::Status => status(ctx),
        AuthSubcommand::Check => check(ctx).await,
    }
}

/// Validate a token against GitHub and store it in the keychain.
///
/// The token comes from `--token` when given, otherwise from the first line
/// of standard input.
async fn login(ctx: &AppContext) -> Result<AuthResponse, AppError> {
    let config = ctx.load_config()?;

    let token = match ctx.token_override.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => read_token_line(std::io::stdin().lock())?,
    };

    let client = GitHubClient::new(GitHubClientConfig {
        base_url: config.api_url.clone(),
        token: token.clone(),
        ..Default::default()
    })?;
    let user = client.validate_token().await?;

    CredentialService::store_token(&config.api_url, &token)?;
    log::info!("[auth] Stored token for {} ({})", config.api_url, user.login);

    Ok(AuthResponse::LoggedIn {
        api_url: config.api_url,
        login: user.login,
    })
}

fn logout(ctx: &AppContext) -> Result<AuthResponse, AppError> {
    let config = ctx.load_config()?;
    CredentialService::delete_token(&config.api_url)?;
    log::info!("[auth] Removed token for {}", config.api_url);

    Ok(AuthResponse::LoggedOut {
        api_url: config.api_url,
    })
}

fn status(ctx: &AppContext) -> Result<AuthResponse, AppError> {
    let config = ctx.load_config()?;

    let has_flag = ctx
        .token_override
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());

    let source = if has_flag {
        TokenSource::Flag
    } else if config.token().is_some() {
        TokenSource::Config
    } else if CredentialService::has_token(&config.api_url)? {
        TokenSource::Keychain
    } else {
        TokenSource::None
    };

    Ok(AuthResponse::Status {
        api_url: config.api_url,
        source,
    })
}

/// Verify the token and that the configured repository is reachable.
async fn check(ctx: &AppContext) -> Result<AuthResponse, AppError> {
    let config = ctx.load_config()?;
    let token = ctx.require_token(&config)?;
    let pool = ctx.open_db().await?;
    let courier = Courier::from_config(&config, &token, pool)?;

    let (user, repository) = courier.verify().await?;

    Ok(AuthResponse::Verified {
        login: user.login,
        repository: repository.full_name,
        default_branch: repository.default_branch,
        private: repository.private,
        destinations: courier
            .destinations()
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

fn read_token_line(mut input: impl BufRead) -> Result<String, AppError> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let token = line.trim();
    if token.is_empty() {
        return Err(AppError::invalid_input_field(
            "No token given; pass --token or pipe it on stdin",
            "token",
        ));
    }
    Ok(token.to_string())
}
