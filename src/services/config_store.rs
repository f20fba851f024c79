//! JSON config file persistence.

use crate::error::AppError;
use crate::models::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the active config inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default location of the config file (`<config dir>/repo-courier/config.json`).
///
/// Falls back to the working directory when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("repo-courier"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE)
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        log::debug!("[config] {} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    read(path)
}

/// Read a config file that must exist.
fn read(path: &Path) -> Result<AppConfig, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::config_at(format!("Failed to read config: {}", e), path.display().to_string())
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        AppError::config_at(format!("Invalid config JSON: {}", e), path.display().to_string())
    })
}

/// Write the config as pretty JSON, creating the parent directory.
pub fn save(path: &Path, config: &AppConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::config_at(
                format!("Failed to create config directory: {}", e),
                parent.display().to_string(),
            )
        })?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|e| {
        AppError::config_at(format!("Failed to write config: {}", e), path.display().to_string())
    })?;

    log::debug!("[config] Saved {}", path.display());
    Ok(())
}

/// Load a config from an arbitrary JSON file and make it the active config.
///
/// Fails if the source file is missing or is not valid config JSON; the
/// active config is left untouched in that case.
pub fn import(from: &Path, to: &Path) -> Result<AppConfig, AppError> {
    if !from.is_file() {
        return Err(AppError::config_at(
            "Config file to import does not exist",
            from.display().to_string(),
        ));
    }

    let config = read(from)?;
    save(to, &config)?;
    log::info!("[config] Imported {} into {}", from.display(), to.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/config.json");

        let config = AppConfig {
            token: "ghp_x".into(),
            repo: "octo/notes".into(),
            branch_folder: "main/love".into(),
            letters_per_day: 4,
            ..Default::default()
        };
        save(&path, &config).unwrap();

        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        match load(&path).unwrap_err() {
            AppError::Config { path: Some(p), .. } => assert!(p.ends_with("config.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_import_legacy_file() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join("old_config.json");
        let active = dir.path().join("active/config.json");
        fs::write(
            &legacy,
            r#"{"token": "ghp_old", "repo": "me/letters", "branch_folder": "main"}"#,
        )
        .unwrap();

        let imported = import(&legacy, &active).unwrap();
        assert_eq!(imported.repo, "me/letters");
        assert_eq!(load(&active).unwrap(), imported);
    }

    #[test]
    fn test_import_missing_source_keeps_active() {
        let dir = tempdir().unwrap();
        let active = dir.path().join("config.json");
        let config = AppConfig {
            repo: "octo/notes".into(),
            ..Default::default()
        };
        save(&active, &config).unwrap();

        assert!(import(&dir.path().join("missing.json"), &active).is_err());
        assert_eq!(load(&active).unwrap(), config);
    }
}
