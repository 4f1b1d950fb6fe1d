//! Configuration structures
//!
//! Loaded by `streamsnap-infra::config::loader` from the environment or a
//! TOML/JSON file. Every section has defaults so a file only needs to name
//! what it overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DRIVE_API_BASE, DRIVE_UPLOAD_URL, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL,
    KEYCHAIN_SERVICE, OAUTH_TIMEOUT_SECS, YOUTUBE_API_BASE, YOUTUBE_UPLOAD_URL,
};
use crate::errors::{Result, StreamSnapError};

/// Root application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub google: GoogleConfig,
    pub storage: StorageConfig,
    pub oauth: OAuthSettings,
    pub endpoints: EndpointConfig,
}

impl AppConfig {
    /// Reject configurations the OAuth flow cannot work with.
    ///
    /// # Errors
    /// Returns `StreamSnapError::Config` when the client id is empty or the
    /// OAuth timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.google.client_id.trim().is_empty() {
            return Err(StreamSnapError::Config("google.client_id must be set".to_string()));
        }
        if self.oauth.timeout_secs == 0 {
            return Err(StreamSnapError::Config("oauth.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Google OAuth client credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where account documents and secrets live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the account documents; the loader fills in
    /// `~/.streamsnap` when unset
    pub data_dir: Option<PathBuf>,
    pub keychain_service: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None, keychain_service: KEYCHAIN_SERVICE.to_string() }
    }
}

/// Loopback authorization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub timeout_secs: u64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self { timeout_secs: OAUTH_TIMEOUT_SECS }
    }
}

/// Provider base URLs, overridable for tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub drive_api: String,
    pub drive_upload: String,
    pub youtube_api: String,
    pub youtube_upload: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            drive_api: DRIVE_API_BASE.to_string(),
            drive_upload: DRIVE_UPLOAD_URL.to_string(),
            youtube_api: YOUTUBE_API_BASE.to_string(),
            youtube_upload: YOUTUBE_UPLOAD_URL.to_string(),
        }
    }
}

impl EndpointConfig {
    /// Point every endpoint at one mock server.
    #[must_use]
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/o/oauth2/v2/auth"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/oauth2/v2/userinfo"),
            drive_api: format!("{base}/drive/v3"),
            drive_upload: format!("{base}/upload/drive/v3/files?uploadType=multipart"),
            youtube_api: format!("{base}/youtube/v3"),
            youtube_upload: format!(
                "{base}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status"
            ),
        }
    }
}
