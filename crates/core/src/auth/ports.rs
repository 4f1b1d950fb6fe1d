//! Port interface for interactive authorization

use async_trait::async_trait;
use streamsnap_common::TokenBundle;
use streamsnap_domain::Result;

/// One interactive authorization-code grant.
///
/// Each provider gets its own instance carrying its scopes.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Run the flow to completion and return the granted bundle.
    ///
    /// # Errors
    /// `AuthTimeout`, `OAuthDenied` or `TokenExchangeFailed`.
    async fn authorize(&self) -> Result<TokenBundle>;
}
