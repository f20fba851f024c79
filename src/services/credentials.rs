//! Credential storage service using the OS keychain.
//!
//! Stores GitHub access tokens in the system's native credential store
//! (Keychain on macOS, Credential Manager on Windows, kernel keyutils on Linux)
//! as an alternative to keeping the token in the plain config file.

use crate::error::AppError;
use keyring::Entry;

/// Service name used in the keychain.
const SERVICE_NAME: &str = "repo-courier";

/// Credential storage operations.
pub struct CredentialService;

impl CredentialService {
    /// Store a token for a GitHub API endpoint.
    ///
    /// # Arguments
    /// * `api_url` - The API base URL (used as the account identifier)
    /// * `token` - The access token to store
    pub fn store_token(api_url: &str, token: &str) -> Result<(), AppError> {
        let entry = Self::get_entry(api_url)?;

        entry
            .set_password(token)
            .map_err(|e| AppError::credential_storage(format!("Failed to store token: {}", e)))
    }

    /// Retrieve the token for an API endpoint.
    ///
    /// # Returns
    /// The stored token, or `None` if nothing is stored
    pub fn get_token(api_url: &str) -> Result<Option<String>, AppError> {
        let entry = Self::get_entry(api_url)?;

        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to retrieve token: {}",
                e
            ))),
        }
    }

    /// Delete the token for an API endpoint.
    ///
    /// Deleting a non-existent token is not an error.
    pub fn delete_token(api_url: &str) -> Result<(), AppError> {
        let entry = Self::get_entry(api_url)?;

        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }

    /// Check if a token exists for an API endpoint.
    pub fn has_token(api_url: &str) -> Result<bool, AppError> {
        Self::get_token(api_url).map(|token| token.is_some())
    }

    fn get_entry(api_url: &str) -> Result<Entry, AppError> {
        let account = normalize_url(api_url);

        Entry::new(SERVICE_NAME, &account).map_err(|e| {
            AppError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

/// Pick the token to use: explicit override, then config file, then keychain.
///
/// A keychain failure is logged and treated as "no token" so a broken
/// keychain never hides a usable token from the other sources.
pub fn resolve_token(
    override_token: Option<&str>,
    config_token: Option<&str>,
    api_url: &str,
) -> Option<String> {
    let explicit = [override_token, config_token]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty());

    if let Some(token) = explicit {
        return Some(token.to_string());
    }

    match CredentialService::get_token(api_url) {
        Ok(token) => token,
        Err(e) => {
            log::warn!("[credentials] Keychain lookup failed: {}", e);
            None
        }
    }
}

/// Normalize a URL for use as an account identifier.
///
/// Removes trailing slashes and converts to lowercase.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}
