//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use pathweave::{PathweaveError, config::AppConfig, session::SyncSession};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for PathweaveError {
    fn from(err: ConfigError) -> Self {
        PathweaveError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (pathweave/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or validated
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, PathweaveError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("pathweave/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("org", "pathweave", "pathweave") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, PathweaveError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    // Attribute overrides and view scale are only checked when a session is built
    SyncSession::new(&config).map_err(|e| ConfigError::Validation(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_explicit_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [conversion]
            label_as_node = true

            [view]
            zoom = 2.0

            [attributes.mappings]
            TextLabel = "name"
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.conversion().label_as_node());
        assert_eq!(config.view().zoom(), 2.0);
        assert_eq!(config.attributes().mappings()["TextLabel"], "name");
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, PathweaveError::Config(_)));
    }

    #[test]
    fn test_invalid_attribute_tag_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[attributes]\nprotected = [\"NoSuchProperty\"]\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Validation error"));
    }
}
