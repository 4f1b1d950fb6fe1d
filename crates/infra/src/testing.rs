//! Test doubles for driving the loopback flow without a real browser.

use streamsnap_domain::{Result, StreamSnapError};
use tracing::debug;
use url::Url;

use crate::oauth::BrowserLauncher;

/// Launcher that plays the provider: it reads `redirect_uri` and `state`
/// from the authorization URL and calls the loopback listener itself.
#[derive(Debug, Clone, Default)]
pub struct RedirectingBrowser {
    params: Vec<(String, String)>,
    redirect: bool,
}

impl RedirectingBrowser {
    /// Redirect back with `code`.
    pub fn granting(code: &str) -> Self {
        Self { params: vec![("code".into(), code.into())], redirect: true }
    }

    /// Redirect back with `error`.
    pub fn denying(error: &str) -> Self {
        Self { params: vec![("error".into(), error.into())], redirect: true }
    }

    /// Never redirect; the user walked away.
    pub fn silent() -> Self {
        Self::default()
    }
}

impl BrowserLauncher for RedirectingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        if !self.redirect {
            return Ok(());
        }

        let parsed = Url::parse(url).map_err(|err| StreamSnapError::Internal(err.to_string()))?;
        let query = |key: &str| {
            parsed.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
        };
        let redirect_uri = query("redirect_uri").ok_or_else(|| {
            StreamSnapError::Internal("authorization URL has no redirect_uri".into())
        })?;

        let mut callback =
            Url::parse(&redirect_uri).map_err(|err| StreamSnapError::Internal(err.to_string()))?;
        {
            let mut pairs = callback.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
            if let Some(state) = query("state") {
                pairs.append_pair("state", &state);
            }
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|err| StreamSnapError::Internal(err.to_string()))?;
        handle.spawn(async move {
            let client = reqwest::Client::builder().no_proxy().build();
            if let Ok(client) = client {
                let result = client.get(callback.as_str()).send().await;
                debug!(ok = result.is_ok(), "simulated OAuth redirect sent");
            }
        });
        Ok(())
    }
}
