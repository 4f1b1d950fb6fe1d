//! Interactive OAuth sign-in
//!
//! - [`callback_server`]: loopback redirect listener
//! - [`browser`]: how the authorization URL reaches the user
//! - [`flow`]: the `AuthorizationFlow` adapter tying them together

pub mod browser;
pub mod callback_server;
pub mod flow;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use callback_server::{CallbackOutcome, OAuthCallbackServer};
pub use flow::{google_oauth_config, LoopbackAuthorizationFlow};
