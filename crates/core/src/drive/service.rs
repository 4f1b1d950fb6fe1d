//! Authenticated Drive operations
//!
//! Every call resolves the account, obtains a valid token through the
//! refresh engine and retries once on a 401/403 before surfacing failure.

use std::sync::Arc;

use bytes::Bytes;
use streamsnap_domain::constants::{drive_file_link, DRIVE_FOLDER_LIST_LIMIT};
use streamsnap_domain::{
    DomainInfo, DriveFolder, DriveUpload, DriveUploadResult, FolderPage, FolderPageRequest,
    PrivacyOption, Result, StreamSnapError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ports::DriveGateway;
use super::registry::DriveAccountRegistry;
use crate::auth::{with_access_token, TokenRefreshEngine};

pub struct DriveService {
    registry: Arc<DriveAccountRegistry>,
    refresher: Arc<TokenRefreshEngine>,
    gateway: Arc<dyn DriveGateway>,
}

impl DriveService {
    pub fn new(
        registry: Arc<DriveAccountRegistry>,
        refresher: Arc<TokenRefreshEngine>,
        gateway: Arc<dyn DriveGateway>,
    ) -> Self {
        Self { registry, refresher, gateway }
    }

    pub fn registry(&self) -> &Arc<DriveAccountRegistry> {
        &self.registry
    }

    async fn vault_key(&self, account_id: &str) -> Result<String> {
        Ok(self.registry.require(account_id).await?.vault_key)
    }

    /// Root entry followed by up to 100 folders.
    ///
    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated` or the provider error.
    pub async fn list_folders(&self, account_id: &str) -> Result<Vec<DriveFolder>> {
        let request = FolderPageRequest {
            page_size: DRIVE_FOLDER_LIST_LIMIT,
            ..FolderPageRequest::default()
        };
        let page = self.list_folders_paged(account_id, &request).await?;

        let mut folders = Vec::with_capacity(page.files.len() + 1);
        folders.push(DriveFolder::root());
        folders.extend(page.files);
        Ok(folders)
    }

    /// One page of folders. Page size and continuation token pass through
    /// untouched.
    ///
    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated` or the provider error.
    pub async fn list_folders_paged(
        &self,
        account_id: &str,
        request: &FolderPageRequest,
    ) -> Result<FolderPage> {
        let vault_key = self.vault_key(account_id).await?;
        let gateway = &self.gateway;

        let page = with_access_token(&self.refresher, &vault_key, |token| async move {
            gateway.list_folders(&token, request).await
        })
        .await?;

        debug!(
            account_id = %account_id,
            count = page.files.len(),
            has_more = page.next_page_token.is_some(),
            "listed drive folders"
        );
        Ok(page)
    }

    /// Follow continuation tokens until exhausted.
    ///
    /// `cancel` is checked between pages; a cancelled walk returns what it
    /// gathered so far.
    ///
    /// # Errors
    /// Any page failure aborts the walk.
    pub async fn list_all_folders(
        &self,
        account_id: &str,
        request: &FolderPageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<DriveFolder>> {
        let mut request = request.clone();
        request.page_token = None;
        let mut folders = Vec::new();

        loop {
            let page = self.list_folders_paged(account_id, &request).await?;
            folders.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => request.page_token = Some(token),
                _ => break,
            }
            if cancel.is_cancelled() {
                info!(account_id = %account_id, gathered = folders.len(), "folder walk cancelled");
                break;
            }
        }
        Ok(folders)
    }

    /// # Errors
    /// `InvalidInput` for a blank name, otherwise as
    /// [`Self::list_folders_paged`].
    pub async fn create_folder(
        &self,
        account_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StreamSnapError::InvalidInput("folder name is empty".into()));
        }
        let vault_key = self.vault_key(account_id).await?;
        let gateway = &self.gateway;

        let folder = with_access_token(&self.refresher, &vault_key, |token| async move {
            gateway.create_folder(&token, name, parent_id).await
        })
        .await?;

        info!(account_id = %account_id, folder_id = %folder.id, "drive folder created");
        Ok(folder)
    }

    /// Upload a video, then apply the requested sharing.
    ///
    /// The upload is committed once the file exists; a failing permission
    /// call is logged and does not fail the result.
    ///
    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated` or the upload's provider error.
    pub async fn upload_video(
        &self,
        account_id: &str,
        upload: &DriveUpload,
        data: Bytes,
    ) -> Result<DriveUploadResult> {
        let account = self.registry.require(account_id).await?;
        let gateway = &self.gateway;
        let size = data.len();

        let uploaded = with_access_token(&self.refresher, &account.vault_key, |token| {
            let data = data.clone();
            async move { gateway.upload_file(&token, upload, data).await }
        })
        .await?;
        info!(
            account_id = %account_id,
            file_id = %uploaded.id,
            bytes = size,
            "drive upload finished"
        );

        if let Some(grant) = upload.privacy.permission(account.domain_info().as_ref()) {
            let file_id = uploaded.id.as_str();
            let grant = &grant;
            let applied =
                with_access_token(&self.refresher, &account.vault_key, |token| async move {
                    gateway.create_permission(&token, file_id, grant).await
                })
                .await;
            if let Err(err) = applied {
                warn!(
                    account_id = %account_id,
                    file_id = %uploaded.id,
                    error = %err,
                    "failed to apply sharing permission"
                );
            }
        }

        let web_view_link = uploaded
            .web_view_link
            .filter(|link| !link.is_empty())
            .unwrap_or_else(|| drive_file_link(&uploaded.id));
        Ok(DriveUploadResult {
            file_id: uploaded.id,
            file_name: upload.file_name.clone(),
            web_view_link,
            privacy: upload.privacy,
        })
    }

    /// Account's email domain; looked up through Drive when not recorded.
    ///
    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated` or the provider error.
    pub async fn user_domain(&self, account_id: &str) -> Result<DomainInfo> {
        let account = self.registry.require(account_id).await?;
        if let Some(info) = account.domain_info() {
            return Ok(info);
        }

        let gateway = &self.gateway;
        with_access_token(&self.refresher, &account.vault_key, |token| async move {
            gateway.about_user(&token).await
        })
        .await
    }

    /// Sharing levels offered for this account.
    ///
    /// Falls back to the consumer set when the domain cannot be resolved.
    ///
    /// # Errors
    /// `AccountNotFound`.
    pub async fn privacy_options(&self, account_id: &str) -> Result<Vec<PrivacyOption>> {
        self.registry.require(account_id).await?;
        let domain = match self.user_domain(account_id).await {
            Ok(domain) => Some(domain),
            Err(err) => {
                debug!(account_id = %account_id, error = %err, "domain unknown, consumer options");
                None
            }
        };
        Ok(PrivacyOption::for_account(domain.as_ref()))
    }
}
