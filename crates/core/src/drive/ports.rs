//! Port interface for the Google Drive REST API
//!
//! Gateways work at the access-token level and know nothing about accounts.
//! Non-2xx responses surface as `StreamSnapError::ProviderApi`.

use async_trait::async_trait;
use bytes::Bytes;
use streamsnap_domain::{
    DomainInfo, DriveFolder, DriveUpload, FolderPage, FolderPageRequest, PermissionGrant, Result,
};

/// File created by an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub web_view_link: Option<String>,
}

#[async_trait]
pub trait DriveGateway: Send + Sync {
    /// Resolve the signed-in user's email and domain.
    async fn about_user(&self, access_token: &str) -> Result<DomainInfo>;

    /// One page of folders matching `request`.
    async fn list_folders(&self, access_token: &str, request: &FolderPageRequest)
        -> Result<FolderPage>;

    async fn create_folder(
        &self,
        access_token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder>;

    /// Multipart upload of `data` with `upload` as metadata.
    async fn upload_file(
        &self,
        access_token: &str,
        upload: &DriveUpload,
        data: Bytes,
    ) -> Result<UploadedFile>;

    async fn create_permission(
        &self,
        access_token: &str,
        file_id: &str,
        grant: &PermissionGrant,
    ) -> Result<()>;
}
