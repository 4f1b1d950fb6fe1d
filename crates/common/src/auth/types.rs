//! OAuth 2.0 types and structures
//!
//! Defines the vault-resident token bundle, the raw token endpoint response,
//! and the provider configuration shared by the Drive and YouTube flows.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Access + refresh token pair for one linked account.
///
/// Serialized as `{"accessToken","refreshToken","tokenExpiry"}` so bundles
/// written by earlier releases remain readable. `expiry` is an absolute epoch
/// timestamp in milliseconds; `None` means the expiry is unknown and the
/// bundle is never considered valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    /// Bearer token presented to provider APIs
    pub access_token: String,

    /// Long-lived token used to mint new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute access-token expiry (epoch ms)
    #[serde(default, rename = "tokenExpiry")]
    pub expiry: Option<i64>,
}

impl TokenBundle {
    /// Plain constructor.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expiry: Option<i64>,
    ) -> Self {
        Self { access_token: access_token.into(), refresh_token, expiry }
    }

    /// Build a bundle from a fresh token endpoint response.
    ///
    /// `now_ms` is the reference clock used to turn `expires_in` into an
    /// absolute expiry.
    #[must_use]
    pub fn from_response(response: TokenResponse, now_ms: i64) -> Self {
        let expiry =
            response.expires_in.map(|secs| now_ms.saturating_add(secs.saturating_mul(1000)));
        Self { access_token: response.access_token, refresh_token: response.refresh_token, expiry }
    }

    /// Merge a refresh response into this bundle.
    ///
    /// The previous refresh token is kept when the provider omits one.
    #[must_use]
    pub fn refreshed_with(&self, response: TokenResponse, now_ms: i64) -> Self {
        let previous = self.refresh_token.clone();
        let mut next = Self::from_response(response, now_ms);
        if next.refresh_token.as_deref().map_or(true, str::is_empty) {
            next.refresh_token = previous;
        }
        next
    }

    /// `true` iff `expiry > now_ms + margin_ms`.
    ///
    /// Fail-closed: an expiry exactly at the margin boundary, or an unknown
    /// expiry, is invalid.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: i64, margin_ms: i64) -> bool {
        match self.expiry {
            Some(expiry) => expiry > now_ms.saturating_add(margin_ms),
            None => false,
        }
    }

    /// [`Self::is_valid_at`] against the wall clock.
    #[must_use]
    pub fn is_valid(&self, margin_ms: i64) -> bool {
        self.is_valid_at(now_millis(), margin_ms)
    }

    /// Whether a refresh can be attempted at all.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

/// Current wall clock in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749). Google omits
/// `refresh_token` on most refresh responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Provider configuration for the authorization-code + PKCE flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Full authorization endpoint URL
    pub authorization_endpoint: String,

    /// Full token endpoint URL
    pub token_endpoint: String,

    /// OAuth client ID
    pub client_id: String,

    /// Client secret (Google desktop clients still send one)
    pub client_secret: Option<String>,

    /// OAuth scopes to request
    pub scopes: Vec<String>,

    extra_authorize_params: Vec<(String, String)>,
}

impl OAuthConfig {
    /// Create a configuration with `access_type=offline` and `prompt=consent`
    /// so the provider always issues a refresh token.
    #[must_use]
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.filter(|secret| !secret.is_empty()),
            scopes,
            extra_authorize_params: vec![
                ("access_type".to_string(), "offline".to_string()),
                ("prompt".to_string(), "consent".to_string()),
            ],
        }
    }

    /// Append an authorization query parameter.
    pub fn add_authorize_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_authorize_params.push((key.into(), value.into()));
    }

    /// Extra authorization query parameters.
    #[must_use]
    pub fn extra_authorize_params(&self) -> &[(String, String)] {
        &self.extra_authorize_params
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    fn response(refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "fresh".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
            scope: None,
        }
    }

    /// Validates `TokenBundle::is_valid_at` behavior around the margin
    /// boundary.
    ///
    /// Assertions:
    /// - A bundle expiring one millisecond past `now + margin` is valid.
    /// - A bundle expiring exactly at `now + margin` is invalid.
    /// - An already expired bundle is invalid.
    #[test]
    fn test_is_valid_boundary_is_fail_closed() {
        let now = 1_700_000_000_000;
        let margin = 60_000;
        let bundle = |expiry| TokenBundle {
            access_token: "a".to_string(),
            refresh_token: None,
            expiry: Some(expiry),
        };

        assert!(bundle(now + margin + 1).is_valid_at(now, margin));
        assert!(!bundle(now + margin).is_valid_at(now, margin));
        assert!(!bundle(now - 1000).is_valid_at(now, margin));
    }

    /// Validates `TokenBundle::is_valid_at` for a bundle with unknown expiry.
    ///
    /// Assertions:
    /// - Ensures a `None` expiry is never valid.
    #[test]
    fn test_unknown_expiry_is_invalid() {
        let bundle =
            TokenBundle { access_token: "a".to_string(), refresh_token: None, expiry: None };
        assert!(!bundle.is_valid_at(0, 0));
    }

    /// Validates `TokenBundle::refreshed_with` keeps the previous refresh
    /// token.
    ///
    /// Assertions:
    /// - Confirms the refresh token survives a response without one.
    /// - Confirms the new access token and expiry are applied.
    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let old = TokenBundle {
            access_token: "t1".to_string(),
            refresh_token: Some("r1".to_string()),
            expiry: Some(0),
        };

        let next = old.refreshed_with(response(None), 1_000);

        assert_eq!(next.refresh_token.as_deref(), Some("r1"));
        assert_eq!(next.access_token, "fresh");
        assert_eq!(next.expiry, Some(1_000 + 3_600_000));
    }

    /// Validates `TokenBundle::refreshed_with` adopts a rotated refresh token.
    ///
    /// Assertions:
    /// - Confirms a provider-issued refresh token replaces the old one.
    #[test]
    fn test_refresh_adopts_rotated_refresh_token() {
        let old = TokenBundle {
            access_token: "t1".to_string(),
            refresh_token: Some("r1".to_string()),
            expiry: Some(0),
        };

        let next = old.refreshed_with(response(Some("r2")), 0);
        assert_eq!(next.refresh_token.as_deref(), Some("r2"));
    }

    /// Validates an absurd `expires_in` saturates instead of overflowing.
    ///
    /// Assertions:
    /// - Confirms the expiry clamps to `i64::MAX`.
    #[test]
    fn test_huge_expires_in_saturates() {
        let mut raw = response(None);
        raw.expires_in = Some(i64::MAX / 10);

        let bundle = TokenBundle::from_response(raw, 1_700_000_000_000);
        assert_eq!(bundle.expiry, Some(i64::MAX));
    }

    /// Validates the persisted JSON shape of `TokenBundle`.
    ///
    /// Assertions:
    /// - Confirms the bundle reads the legacy `tokenExpiry` field.
    #[test]
    fn test_bundle_reads_legacy_shape() {
        let raw = r#"{"accessToken":"t1","refreshToken":"r1","tokenExpiry":42}"#;
        let bundle: TokenBundle = serde_json::from_str(raw).expect("bundle should parse");

        assert_eq!(bundle.access_token, "t1");
        assert_eq!(bundle.refresh_token.as_deref(), Some("r1"));
        assert_eq!(bundle.expiry, Some(42));
    }

    /// Validates `OAuthConfig::new` default authorization parameters.
    ///
    /// Assertions:
    /// - Ensures offline access and forced consent are requested.
    /// - Ensures an empty client secret is dropped.
    #[test]
    fn test_oauth_config_defaults() {
        let config = OAuthConfig::new(
            "https://auth.example/auth",
            "https://auth.example/token",
            "client",
            Some(String::new()),
            vec!["a".to_string(), "b".to_string()],
        );

        assert!(config
            .extra_authorize_params()
            .contains(&("access_type".to_string(), "offline".to_string())));
        assert!(config
            .extra_authorize_params()
            .contains(&("prompt".to_string(), "consent".to_string())));
        assert!(config.client_secret.is_none());
        assert_eq!(config.scope_string(), "a b");
    }
}
