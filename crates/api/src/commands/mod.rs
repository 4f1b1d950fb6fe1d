//! Boundary commands
//!
//! The surface a UI (or the CLI) calls. Every command returns a
//! [`CommandResponse`] and never panics or propagates an error.

mod drive;
mod youtube;

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use streamsnap_domain::{Result, StreamSnapError};

pub use drive::*;
pub use youtube::*;

pub use crate::utils::command_helpers::CommandResponse;

/// Where an upload's bytes come from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// A finished recording already in memory
    Bytes(Bytes),
    /// A file chosen by the user
    Path(PathBuf),
}

impl VideoSource {
    async fn load(self) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Path(path) => tokio::fs::read(&path).await.map(Bytes::from).map_err(|err| {
                StreamSnapError::InvalidInput(format!("cannot read {}: {err}", path.display()))
            }),
        }
    }

    /// File name of a path source.
    fn file_name(&self) -> Option<String> {
        match self {
            Self::Bytes(_) => None,
            Self::Path(path) => path.file_name().map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsPayload<A> {
    pub accounts: Vec<A>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPayload<A> {
    pub account: A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedPayload {
    pub removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedPayload {
    pub refreshed: usize,
}
