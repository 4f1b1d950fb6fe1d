//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for StreamSnap
///
/// Crosses the command boundary as its `Display` string, so messages are
/// kept short and free of secrets.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StreamSnapError {
    #[error("Authorization timed out")]
    AuthTimeout,

    #[error("Authorization denied: {0}")]
    OAuthDenied(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("NotAuthenticated")]
    NotAuthenticated,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account with email {0} is already added")]
    DuplicateAccount(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Provider API error: {status} - {body}")]
    ProviderApi { status: u16, body: String },

    #[error("Secret store unavailable: {0}")]
    VaultUnavailable(String),

    #[error("No YouTube channel found for this account")]
    NoChannel,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamSnapError {
    /// A provider answered 401/403: the token was rejected despite looking
    /// valid locally.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::ProviderApi { status: 401 | 403, .. })
    }

    /// Short machine label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthTimeout => "auth_timeout",
            Self::OAuthDenied(_) => "oauth_denied",
            Self::TokenExchangeFailed(_) => "token_exchange_failed",
            Self::NotAuthenticated => "not_authenticated",
            Self::AccountNotFound(_) => "account_not_found",
            Self::DuplicateAccount(_) => "duplicate_account",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::ProviderApi { .. } => "provider_api",
            Self::VaultUnavailable(_) => "vault_unavailable",
            Self::NoChannel => "no_channel",
            Self::Network(_) => "network",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for StreamSnap operations
pub type Result<T> = std::result::Result<T, StreamSnapError>;
