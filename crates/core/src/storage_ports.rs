//! Port interface for the registry documents
//!
//! Each registry owns exactly one document and rewrites it whole on every
//! mutation.

use async_trait::async_trait;
use streamsnap_domain::Result;

/// Whole-document persistence.
#[async_trait]
pub trait DocumentStore<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Read the document; `None` when it does not exist yet.
    async fn load(&self) -> Result<Option<T>>;

    /// Replace the document.
    async fn save(&self, document: &T) -> Result<()>;
}
