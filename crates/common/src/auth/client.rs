//! OAuth 2.0 token endpoint client with PKCE support
//!
//! Handles the two token-endpoint grants the app needs:
//! - `authorization_code` with `code_verifier` (first link of an account)
//! - `refresh_token` (proactive and reactive refresh)
//!
//! It also renders the browser authorization URL. Hosting the loopback
//! redirect listener is the caller's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::pkce::PkceChallenge;
use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse};

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed before a response arrived
    RequestFailed(reqwest::Error),

    /// Token endpoint answered with a non-2xx status
    Rejected { status: u16, body: String },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl OAuthClientError {
    /// Provider error code (`invalid_grant`, ...) when the body carried one.
    #[must_use]
    pub fn provider_error(&self) -> Option<OAuthError> {
        match self {
            Self::Rejected { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Rejected { status, body } => write!(f, "{status} - {body}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 client for one provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a client with a 30s request timeout.
    ///
    /// # Examples
    /// ```
    /// use streamsnap_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "https://accounts.google.com/o/oauth2/v2/auth",
    ///     "https://oauth2.googleapis.com/token",
    ///     "client_id",
    ///     None,
    ///     vec!["openid".to_string()],
    /// );
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { config, client }
    }

    /// Build the browser authorization URL for a loopback `redirect_uri`.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, challenge: &PkceChallenge) -> String {
        let scope = self.config.scope_string();
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", challenge.state.as_str()),
            ("code_challenge", challenge.code_challenge.as_str()),
            ("code_challenge_method", challenge.challenge_method()),
        ];

        let mut query: Vec<String> =
            params.iter().map(|(k, v)| format!("{k}={}", urlencoding::encode(v))).collect();
        query.extend(
            self.config
                .extra_authorize_params()
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v))),
        );

        format!("{}?{}", self.config.authorization_endpoint, query.join("&"))
    }

    /// Exchange an authorization code (plus PKCE verifier) for tokens.
    ///
    /// # Errors
    /// `Rejected` on non-2xx, `ParseError` on a malformed body.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        debug!(endpoint = %self.config.token_endpoint, "exchanging authorization code");
        self.post_token_form(&form).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The response may omit `refresh_token`; merging is left to
    /// [`super::TokenBundle::refreshed_with`].
    ///
    /// # Errors
    /// `NoRefreshToken` for an empty token, `Rejected` on non-2xx.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        debug!(endpoint = %self.config.token_endpoint, "refreshing access token");
        self.post_token_form(&form).await
    }

    async fn post_token_form(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        if self.config.token_endpoint.is_empty() {
            return Err(OAuthClientError::ConfigError("token endpoint not configured".into()));
        }

        let response = self.client.post(&self.config.token_endpoint).form(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthClientError::Rejected { status: status.as_u16(), body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthClientError::ParseError(e.to_string()))
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        OAuthClient::exchange_code(self, code, code_verifier, redirect_uri).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        OAuthClient::refresh_access_token(self, refresh_token).await
    }
}
