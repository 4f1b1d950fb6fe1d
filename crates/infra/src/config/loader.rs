//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment when present
//! 2. Attempts to load from environment variables
//! 3. If the client id is missing, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON and TOML)
//! 5. Fills in the data directory and validates the result
//!
//! ## Environment Variables
//! - `STREAMSNAP_GOOGLE_CLIENT_ID` (or `GOOGLE_CLIENT_ID`): OAuth client id
//! - `STREAMSNAP_GOOGLE_CLIENT_SECRET` (or `GOOGLE_CLIENT_SECRET`)
//! - `STREAMSNAP_DATA_DIR`: directory for account documents
//! - `STREAMSNAP_OAUTH_TIMEOUT_SECS`: authorization wait in seconds
//! - `STREAMSNAP_KEYCHAIN_SERVICE`: keychain service name
//!
//! ## File Locations
//! The loader probes, in the working directory and then next to the
//! executable: `streamsnap.toml`, `streamsnap.json`, `config.toml`,
//! `config.json`.

use std::path::{Path, PathBuf};

use streamsnap_domain::constants::DATA_DIR_NAME;
use streamsnap_domain::{AppConfig, Result, StreamSnapError};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["streamsnap.toml", "streamsnap.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StreamSnapError::Config` if:
/// - Neither the environment nor a file provides a client id
/// - File format is invalid
/// - The home directory cannot be determined for the default data dir
pub fn load() -> Result<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    let config = resolve_data_dir(config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only the client id is required; everything else keeps its default.
///
/// # Errors
/// Returns `StreamSnapError::Config` if the client id is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config = AppConfig::default();

    config.google.client_id = first_env(&["STREAMSNAP_GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_ID"])
        .ok_or_else(|| {
            StreamSnapError::Config(
                "Missing required environment variable: STREAMSNAP_GOOGLE_CLIENT_ID".to_string(),
            )
        })?;
    config.google.client_secret =
        first_env(&["STREAMSNAP_GOOGLE_CLIENT_SECRET", "GOOGLE_CLIENT_SECRET"]);

    if let Some(dir) = first_env(&["STREAMSNAP_DATA_DIR"]) {
        config.storage.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(service) = first_env(&["STREAMSNAP_KEYCHAIN_SERVICE"]) {
        config.storage.keychain_service = service;
    }
    if let Some(raw) = first_env(&["STREAMSNAP_OAUTH_TIMEOUT_SECS"]) {
        config.oauth.timeout_secs = raw.parse::<u64>().map_err(|e| {
            StreamSnapError::Config(format!("Invalid OAuth timeout: {}", e))
        })?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `StreamSnapError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StreamSnapError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StreamSnapError::Config(
                "No Google client id in the environment and no config file found".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StreamSnapError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StreamSnapError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StreamSnapError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(StreamSnapError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    let exe_dir = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf));
    if let Some(exe_dir) = exe_dir {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Default the data directory to `~/.streamsnap`.
///
/// # Errors
/// Returns `StreamSnapError::Config` when no home directory is known.
pub fn resolve_data_dir(mut config: AppConfig) -> Result<AppConfig> {
    if config.storage.data_dir.is_none() {
        let home = dirs::home_dir().ok_or_else(|| {
            StreamSnapError::Config("cannot determine home directory for data dir".to_string())
        })?;
        config.storage.data_dir = Some(home.join(DATA_DIR_NAME));
    }
    Ok(config)
}

/// First non-empty value among `keys`.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
