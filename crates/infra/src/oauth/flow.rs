//! Authorization-code + PKCE flow over a loopback redirect.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use streamsnap_common::auth::{now_millis, OAuthClient, OAuthConfig, PkceChallenge};
use streamsnap_common::TokenBundle;
use streamsnap_core::AuthorizationFlow;
use streamsnap_domain::constants::{DRIVE_SCOPES, YOUTUBE_SCOPES};
use streamsnap_domain::{AppConfig, Result, StreamSnapError};
use tracing::{info, warn};

use super::browser::BrowserLauncher;
use super::callback_server::{CallbackOutcome, OAuthCallbackServer};

/// One provider's interactive sign-in.
///
/// Each `authorize` call starts its own listener and tears it down before
/// returning, whatever the outcome.
pub struct LoopbackAuthorizationFlow {
    client: OAuthClient,
    launcher: Arc<dyn BrowserLauncher>,
    timeout: Duration,
}

impl LoopbackAuthorizationFlow {
    pub fn new(config: OAuthConfig, launcher: Arc<dyn BrowserLauncher>, timeout: Duration) -> Self {
        Self { client: OAuthClient::new(config), launcher, timeout }
    }

    /// Flow requesting the Drive scopes.
    pub fn drive(config: &AppConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self::for_scopes(config, &DRIVE_SCOPES, launcher)
    }

    /// Flow requesting the YouTube scopes.
    pub fn youtube(config: &AppConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self::for_scopes(config, &YOUTUBE_SCOPES, launcher)
    }

    fn for_scopes(config: &AppConfig, scopes: &[&str], launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self::new(
            google_oauth_config(config, scopes),
            launcher,
            Duration::from_secs(config.oauth.timeout_secs),
        )
    }

    async fn exchange(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenBundle> {
        let response = self
            .client
            .exchange_code(code, verifier, redirect_uri)
            .await
            .map_err(|err| StreamSnapError::TokenExchangeFailed(err.to_string()))?;
        Ok(TokenBundle::from_response(response, now_millis()))
    }
}

/// Token-endpoint configuration for the given scopes.
pub fn google_oauth_config(config: &AppConfig, scopes: &[&str]) -> OAuthConfig {
    OAuthConfig::new(
        config.endpoints.auth_url.clone(),
        config.endpoints.token_url.clone(),
        config.google.client_id.clone(),
        config.google.client_secret.clone(),
        scopes.iter().map(|scope| (*scope).to_string()).collect(),
    )
}

#[async_trait]
impl AuthorizationFlow for LoopbackAuthorizationFlow {
    async fn authorize(&self) -> Result<TokenBundle> {
        let challenge = PkceChallenge::generate();
        let mut server = OAuthCallbackServer::start(challenge.state.clone()).await?;
        let redirect_uri = server.redirect_uri();
        let url = self.client.authorization_url(&redirect_uri, &challenge);

        if let Err(err) = self.launcher.open(&url) {
            warn!(error = %err, url = %url, "could not open browser, open the URL manually");
        }

        let outcome = server.wait_for_callback(self.timeout).await;
        if let Err(err) = server.shutdown().await {
            warn!(error = %err, "OAuth callback server did not stop cleanly");
        }

        let code = match outcome? {
            CallbackOutcome::Code(code) => code,
            CallbackOutcome::Denied(reason) => {
                warn!(reason = %reason, "authorization denied");
                return Err(StreamSnapError::OAuthDenied(reason));
            }
        };

        let bundle = self.exchange(&code, &challenge.code_verifier, &redirect_uri).await?;
        info!(has_refresh_token = bundle.has_refresh_token(), "authorization completed");
        Ok(bundle)
    }
}
