//! Opening the authorization URL.

use streamsnap_domain::{Result, StreamSnapError};

/// Hands the authorization URL to the user.
pub trait BrowserLauncher: Send + Sync {
    /// # Errors
    /// Returns an error when the URL could not be handed off; the flow then
    /// logs it for manual opening.
    fn open(&self, url: &str) -> Result<()>;
}

/// The platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        spawn_opener(url).map(|_| ()).map_err(|err| {
            StreamSnapError::Internal(format!("failed to launch browser: {err}"))
        })
    }
}

#[cfg(target_os = "macos")]
fn spawn_opener(url: &str) -> std::io::Result<std::process::Child> {
    std::process::Command::new("open").arg(url).spawn()
}

#[cfg(target_os = "windows")]
fn spawn_opener(url: &str) -> std::io::Result<std::process::Child> {
    std::process::Command::new("cmd").args(["/C", "start", "", url]).spawn()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn spawn_opener(url: &str) -> std::io::Result<std::process::Child> {
    std::process::Command::new("xdg-open").arg(url).spawn()
}
