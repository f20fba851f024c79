//! Letter and file delivery.
//!
//! Every delivery goes to each configured destination in turn. A failure at
//! one destination is recorded and reported, and the remaining destinations
//! still get their copy. Nothing is retried.

use crate::db::pool::DbPool;
use crate::db::{deliveries, templates};
use crate::error::AppError;
use crate::models::config::validate_letter_count;
use crate::models::{
    AppConfig, DeliveryKind, DeliveryStatus, Destination, LetterRequest, NewDelivery, RepoId,
    Template,
};
use crate::services::composer::{self, Composer};
use crate::services::github_client::{
    GitHubClient, GitHubClientConfig, GitHubRepository, GitHubUser, WriteOperation,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Commit messages used for each kind of write.
const LETTER_COMMIT_MESSAGE: &str = "Letter from repo-courier";
const LOG_CREATE_MESSAGE: &str = "Start delivery log";
const LOG_UPDATE_MESSAGE: &str = "Update delivery log";
const UPLOAD_CREATE_MESSAGE: &str = "Upload file";
const UPLOAD_UPDATE_MESSAGE: &str = "Update uploaded file";

/// A file that reached its destination.
#[derive(Debug, Clone, Serialize)]
pub struct Delivered {
    pub branch: String,
    pub path: String,
    pub operation: WriteOperation,
    pub commit_sha: Option<String>,
    /// Set when the letter landed but its log line could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
}

/// A destination that could not be written.
#[derive(Debug, Clone, Serialize)]
pub struct Failed {
    pub branch: String,
    pub path: String,
    pub error: String,
}

/// Outcome of a send or upload across all destinations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub delivered: Vec<Delivered>,
    pub failed: Vec<Failed>,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends letters and uploads files to one repository.
#[derive(Debug, Clone)]
pub struct Courier {
    client: GitHubClient,
    repo: RepoId,
    destinations: Vec<Destination>,
    composer: Composer,
    pool: DbPool,
}

impl Courier {
    /// Build a courier from the config. Validates the repository and the
    /// destination list before anything touches the network.
    pub fn from_config(config: &AppConfig, token: &str, pool: DbPool) -> Result<Self, AppError> {
        let repo = config.repo_id()?;
        let destinations = config.destinations()?;

        let client = GitHubClient::new(GitHubClientConfig {
            base_url: config.api_url.clone(),
            token: token.to_string(),
            ..Default::default()
        })?;

        Ok(Self {
            client,
            repo,
            destinations,
            composer: Composer::new(config),
            pool,
        })
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Check that the token works and can see the repository.
    pub async fn verify(&self) -> Result<(GitHubUser, GitHubRepository), AppError> {
        let user = self.client.validate_token().await?;
        let repository = self.client.get_repository(&self.repo).await?;
        Ok((user, repository))
    }

    /// Check a send without touching the network: the count must be in
    /// range and the theme must exist.
    pub async fn check_send(
        &self,
        request: &LetterRequest,
        count: u32,
    ) -> Result<(u32, Template), AppError> {
        let count = validate_letter_count(count)?;
        let template = templates::require_template(&self.pool, &request.theme).await?;
        Ok((count, template))
    }

    /// Send `count` letters to every destination.
    ///
    /// # Errors
    /// Only for problems found before sending (unknown theme, bad count).
    /// Per-destination failures are returned inside the report.
    pub async fn send_letters(
        &self,
        request: &LetterRequest,
        count: u32,
    ) -> Result<DeliveryReport, AppError> {
        let (count, template) = self.check_send(request, count).await?;

        let mut report = DeliveryReport::default();

        for seq in 0..count {
            let now = chrono::Local::now().naive_local();
            let letter =
                self.composer
                    .compose(&template.body, &request.message, &request.emoji, now);

            for destination in &self.destinations {
                let path = self.composer.letter_path(&destination.folder, now, seq);
                let outcome = self
                    .deliver_letter(destination, &path, &letter, request, now)
                    .await;

                let record = NewDelivery {
                    kind: DeliveryKind::Letter,
                    repo: self.repo.to_string(),
                    branch: destination.branch.clone(),
                    remote_path: path.clone(),
                    theme: Some(template.name.clone()),
                    preview: Some(composer::preview(&request.message)),
                    content_sha256: sha256_hex(letter.as_bytes()),
                    commit_sha: None,
                    status: DeliveryStatus::Success,
                    message: None,
                    timestamp: chrono::Utc::now().timestamp(),
                };

                self.finish(record, destination, path, outcome, &mut report)
                    .await;
            }
        }

        log::info!(
            "[courier] Sent {} letter(s) to {}: {} delivered, {} failed",
            count,
            self.repo,
            report.delivered.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Create the letter file, then append a line to the folder's log.
    async fn deliver_letter(
        &self,
        destination: &Destination,
        path: &str,
        letter: &str,
        request: &LetterRequest,
        now: chrono::NaiveDateTime,
    ) -> Result<Delivered, AppError> {
        let write = self
            .client
            .create_file(
                &self.repo,
                path,
                LETTER_COMMIT_MESSAGE,
                letter.as_bytes(),
                &destination.branch,
            )
            .await?;

        let entry = composer::log_entry(now, path, &request.theme, &request.message);
        let log_error = match self
            .client
            .append_to_file(
                &self.repo,
                &composer::log_path(&destination.folder),
                &entry,
                LOG_CREATE_MESSAGE,
                LOG_UPDATE_MESSAGE,
                &destination.branch,
            )
            .await
        {
            Ok(_) => None,
            Err(e) => {
                log::warn!("[courier] Letter {} sent but log update failed: {}", path, e);
                Some(e.to_string())
            }
        };

        Ok(Delivered {
            branch: destination.branch.clone(),
            path: write.path,
            operation: write.operation,
            commit_sha: write.commit_sha,
            log_error,
        })
    }

    /// Upload a local file to `<folder>/<file name>` at every destination,
    /// replacing an existing file of the same name.
    pub async fn upload_file(&self, local_path: &Path) -> Result<DeliveryReport, AppError> {
        let file_name = Self::check_upload(local_path)?;
        let content = tokio::fs::read(local_path).await?;
        let content_sha256 = sha256_hex(&content);

        let mut report = DeliveryReport::default();

        for destination in &self.destinations {
            let path = destination.path_for(&file_name);
            let outcome = self
                .client
                .create_or_update_file(
                    &self.repo,
                    &path,
                    UPLOAD_CREATE_MESSAGE,
                    UPLOAD_UPDATE_MESSAGE,
                    &content,
                    &destination.branch,
                )
                .await
                .map(|write| Delivered {
                    branch: destination.branch.clone(),
                    path: write.path,
                    operation: write.operation,
                    commit_sha: write.commit_sha,
                    log_error: None,
                });

            let record = NewDelivery {
                kind: DeliveryKind::Upload,
                repo: self.repo.to_string(),
                branch: destination.branch.clone(),
                remote_path: path.clone(),
                theme: None,
                preview: None,
                content_sha256: content_sha256.clone(),
                commit_sha: None,
                status: DeliveryStatus::Success,
                message: None,
                timestamp: chrono::Utc::now().timestamp(),
            };

            self.finish(record, destination, path, outcome, &mut report)
                .await;
        }

        log::info!(
            "[courier] Uploaded {} to {}: {} delivered, {} failed",
            file_name,
            self.repo,
            report.delivered.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Check that `local_path` is an uploadable file and return its name.
    pub fn check_upload(local_path: &Path) -> Result<String, AppError> {
        if !local_path.is_file() {
            return Err(AppError::invalid_input_field(
                format!("File not found: {}", local_path.display()),
                "path",
            ));
        }

        local_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| AppError::invalid_input_field("File name is not valid UTF-8", "path"))
    }

    /// Record the attempt in the local history and add it to the report.
    async fn finish(
        &self,
        mut record: NewDelivery,
        destination: &Destination,
        path: String,
        outcome: Result<Delivered, AppError>,
        report: &mut DeliveryReport,
    ) {
        match outcome {
            Ok(delivered) => {
                record.status = if delivered.operation == WriteOperation::Unchanged {
                    DeliveryStatus::Skipped
                } else {
                    DeliveryStatus::Success
                };
                record.commit_sha = delivered.commit_sha.clone();
                record.message = delivered.log_error.clone();
                report.delivered.push(delivered);
            }
            Err(e) => {
                log::error!("[courier] Delivery to {} failed: {}", destination, e);
                record.status = DeliveryStatus::Failed;
                record.message = Some(e.to_string());
                report.failed.push(Failed {
                    branch: destination.branch.clone(),
                    path,
                    error: e.to_string(),
                });
            }
        }

        if let Err(e) = deliveries::record_delivery(&self.pool, &record).await {
            log::warn!("[courier] Failed to record delivery history: {}", e);
        }
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
