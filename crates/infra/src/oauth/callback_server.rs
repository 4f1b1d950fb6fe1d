//! Loopback HTTP server that receives the OAuth redirect.
//!
//! Bound to `127.0.0.1` on an OS-assigned port. The first acceptable
//! callback is delivered once over a oneshot channel; later hits only get a
//! page. The server stops on [`OAuthCallbackServer::shutdown`] or, as a
//! backstop, when dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use streamsnap_domain::constants::OAUTH_CALLBACK_PATH;
use streamsnap_domain::{Result, StreamSnapError};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Successful</h1><p>You can close this window and return to StreamSnap.</p></body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>Invalid or unexpected callback parameters.</p></body>
</html>"#;

/// What the provider redirected back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    /// Provider `error` value, or `missing_code` when neither was sent
    Denied(String),
}

struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

pub struct OAuthCallbackServer {
    port: u16,
    receiver: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OAuthCallbackServer {
    /// Start the loopback server on an ephemeral port.
    ///
    /// # Errors
    /// `Network` when the socket cannot be bound.
    pub async fn start(expected_state: impl Into<String>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|err| {
            StreamSnapError::Network(format!("failed to bind OAuth loopback server: {err}"))
        })?;

        let port = listener
            .local_addr()
            .map_err(|err| StreamSnapError::Network(format!("failed to determine port: {err}")))?
            .port();

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let state = Arc::new(CallbackState {
            expected_state: expected_state.into(),
            sender: Mutex::new(Some(outcome_tx)),
        });

        let app =
            Router::new().route(OAUTH_CALLBACK_PATH, get(handle_oauth_callback)).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "OAuth callback server error");
            }
        });

        debug!(port, "OAuth callback server listening");
        Ok(Self {
            port,
            receiver: Some(outcome_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI used in the authorization request.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, OAUTH_CALLBACK_PATH)
    }

    /// Await the callback.
    ///
    /// # Errors
    /// `AuthTimeout` when nothing acceptable arrives within `timeout`.
    pub async fn wait_for_callback(&mut self, timeout: Duration) -> Result<CallbackOutcome> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| StreamSnapError::Internal("OAuth callback already awaited".into()))?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(StreamSnapError::Internal("OAuth callback server stopped".into())),
            Err(_) => Err(StreamSnapError::AuthTimeout),
        }
    }

    /// Shut down the loopback server gracefully.
    ///
    /// # Errors
    /// `Internal` if the server task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(StreamSnapError::Internal(format!(
                        "OAuth callback server panicked: {err}"
                    )));
                }
            }
        }

        debug!(port = self.port, "OAuth callback server stopped");
        Ok(())
    }
}

impl Drop for OAuthCallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_oauth_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    if let Some(received) = params.get("state") {
        if *received != state.expected_state {
            warn!("ignoring OAuth callback with mismatched state");
            return Html(FAILURE_PAGE);
        }
    }

    let (outcome, page) = match (params.get("code"), params.get("error")) {
        (_, Some(error)) => (CallbackOutcome::Denied(error.clone()), FAILURE_PAGE),
        (Some(code), None) if !code.is_empty() => {
            (CallbackOutcome::Code(code.clone()), SUCCESS_PAGE)
        }
        _ => (CallbackOutcome::Denied("missing_code".to_string()), FAILURE_PAGE),
    };

    if let Some(sender) = state.sender.lock().take() {
        let _ = sender.send(outcome);
    }
    Html(page)
}
