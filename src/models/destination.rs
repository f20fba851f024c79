//! Repository identifier and delivery destinations.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse `owner/name`. Both halves must be non-empty and there must be
    /// exactly one slash.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        let mut parts = value.split('/');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(AppError::invalid_input_field(
                format!("Invalid repository '{}', expected owner/name", value),
                "repo",
            )),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A branch plus a folder inside the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub branch: String,
    pub folder: String,
}

impl Destination {
    /// Parse one entry: `branch` or `branch/folder[/sub...]`.
    ///
    /// Splits on the first slash only, so folders may be nested.
    pub fn parse(entry: &str, default_folder: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let (branch, folder) = match entry.split_once('/') {
            Some((branch, folder)) => (branch.trim(), folder.trim().trim_matches('/')),
            None => (entry, ""),
        };

        if branch.is_empty() {
            return None;
        }

        let folder = if folder.is_empty() { default_folder } else { folder };

        Some(Self {
            branch: branch.to_string(),
            folder: folder.to_string(),
        })
    }

    /// Join a file name onto this destination's folder.
    pub fn path_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.folder, file_name)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.branch, self.folder)
    }
}

/// Parse a comma-separated destination list.
///
/// Blank entries are skipped; an empty result is an error.
pub fn parse_destinations(list: &str, default_folder: &str) -> Result<Vec<Destination>, AppError> {
    let destinations: Vec<Destination> = list
        .split(',')
        .filter_map(|entry| Destination::parse(entry, default_folder))
        .collect();

    if destinations.is_empty() {
        return Err(AppError::invalid_input_field(
            "At least one destination (branch or branch/folder) is required",
            "branch_folder",
        ));
    }

    Ok(destinations)
}
