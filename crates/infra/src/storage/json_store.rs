//! JSON document persistence.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash never leaves a half-written registry. A document that no longer
//! parses is moved aside to `<name>.corrupt` and treated as missing.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use streamsnap_core::DocumentStore;
use streamsnap_domain::{Result, StreamSnapError};
use tracing::{debug, warn};

use crate::errors::InfraError;

pub struct JsonFileStore<T> {
    path: PathBuf,
    _document: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _document: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

fn storage_error(err: impl Into<InfraError>) -> StreamSnapError {
    err.into().into()
}

#[async_trait]
impl<T> DocumentStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> Result<Option<T>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage_error(err)),
        };

        match serde_json::from_slice::<T>(&raw) {
            Ok(document) => Ok(Some(document)),
            Err(err) => {
                let aside = self.sibling(".corrupt");
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %err,
                    "unreadable document moved aside"
                );
                tokio::fs::rename(&self.path, &aside).await.map_err(storage_error)?;
                Ok(None)
            }
        }
    }

    async fn save(&self, document: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }

        let payload = serde_json::to_vec_pretty(document).map_err(storage_error)?;
        let temp = self.sibling(".tmp");
        tokio::fs::write(&temp, &payload).await.map_err(storage_error)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(storage_error)?;

        debug!(path = %self.path.display(), bytes = payload.len(), "document saved");
        Ok(())
    }
}
