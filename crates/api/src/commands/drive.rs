//! Google Drive commands

use serde::{Deserialize, Serialize};
use streamsnap_common::auth::now_millis;
use streamsnap_domain::{
    AuthRecovery, DriveAccount, DriveAccountPatch, DriveFolder, DriveUpload, DriveUploadResult,
    FolderPage, FolderPageRequest, PrivacyOption,
};
use tokio_util::sync::CancellationToken;

use super::{AccountPayload, AccountsPayload, RefreshedPayload, RemovedPayload, VideoSource};
use crate::utils::command_helpers::{execute_command, CommandResponse};
use crate::AppContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldersPayload {
    pub folders: Vec<DriveFolder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderPayload {
    pub folder: DriveFolder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyOptionsPayload {
    pub options: Vec<PrivacyOption>,
}

pub async fn drive_list_accounts(
    ctx: &AppContext,
) -> CommandResponse<AccountsPayload<DriveAccount>> {
    execute_command("drive::list_accounts", || async move {
        Ok(AccountsPayload { accounts: ctx.drive.registry().list().await })
    })
    .await
}

pub async fn drive_get_active_accounts(
    ctx: &AppContext,
) -> CommandResponse<AccountsPayload<DriveAccount>> {
    execute_command("drive::get_active_accounts", || async move {
        Ok(AccountsPayload { accounts: ctx.drive.registry().get_active().await })
    })
    .await
}

/// Run the sign-in flow and register the account.
pub async fn drive_create_account(
    ctx: &AppContext,
    display_name: Option<String>,
) -> CommandResponse<AccountPayload<DriveAccount>> {
    execute_command("drive::create_account", || async move {
        let account = ctx.drive.registry().create(display_name).await?;
        Ok(AccountPayload { account })
    })
    .await
}

pub async fn drive_remove_account(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<RemovedPayload> {
    execute_command("drive::remove_account", || async move {
        Ok(RemovedPayload { removed: ctx.drive.registry().remove(account_id).await? })
    })
    .await
}

pub async fn drive_update_account(
    ctx: &AppContext,
    account_id: &str,
    patch: DriveAccountPatch,
) -> CommandResponse<AccountPayload<DriveAccount>> {
    execute_command("drive::update_account", || async move {
        let account = ctx.drive.registry().update(account_id, &patch).await?;
        Ok(AccountPayload { account })
    })
    .await
}

pub async fn drive_list_folders(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<FoldersPayload> {
    execute_command("drive::list_folders", || async move {
        Ok(FoldersPayload { folders: ctx.drive.list_folders(account_id).await? })
    })
    .await
}

pub async fn drive_list_folders_paged(
    ctx: &AppContext,
    account_id: &str,
    request: FolderPageRequest,
) -> CommandResponse<FolderPage> {
    execute_command("drive::list_folders_paged", || async move {
        ctx.drive.list_folders_paged(account_id, &request).await
    })
    .await
}

/// Every folder matching `request`, page by page until exhausted or
/// cancelled.
pub async fn drive_list_all_folders(
    ctx: &AppContext,
    account_id: &str,
    request: FolderPageRequest,
    cancel: CancellationToken,
) -> CommandResponse<FoldersPayload> {
    execute_command("drive::list_all_folders", || async move {
        let folders = ctx.drive.list_all_folders(account_id, &request, &cancel).await?;
        Ok(FoldersPayload { folders })
    })
    .await
}

pub async fn drive_create_folder(
    ctx: &AppContext,
    account_id: &str,
    name: &str,
    parent_id: Option<String>,
) -> CommandResponse<FolderPayload> {
    execute_command("drive::create_folder", || async move {
        let folder = ctx.drive.create_folder(account_id, name, parent_id.as_deref()).await?;
        Ok(FolderPayload { folder })
    })
    .await
}

/// Upload a recording. A blank file name falls back to the source file's
/// name, then to `Recording-<epoch ms>.webm`.
pub async fn drive_upload_video(
    ctx: &AppContext,
    account_id: &str,
    mut upload: DriveUpload,
    source: VideoSource,
) -> CommandResponse<DriveUploadResult> {
    execute_command("drive::upload_video", || async move {
        if upload.file_name.trim().is_empty() {
            upload.file_name = source
                .file_name()
                .unwrap_or_else(|| format!("Recording-{}.webm", now_millis()));
        }
        let data = source.load().await?;
        ctx.drive.upload_video(account_id, &upload, data).await
    })
    .await
}

pub async fn drive_privacy_options(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<PrivacyOptionsPayload> {
    execute_command("drive::privacy_options", || async move {
        Ok(PrivacyOptionsPayload { options: ctx.drive.privacy_options(account_id).await? })
    })
    .await
}

/// Reactive recovery after a provider rejected a token. The caller decides
/// what to do with `shouldRemove`.
pub async fn drive_handle_auth_error(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<AuthRecovery> {
    execute_command("drive::handle_auth_error", || async move {
        Ok(ctx.drive.registry().handle_auth_error(account_id).await)
    })
    .await
}

pub async fn drive_refresh_all_tokens(ctx: &AppContext) -> CommandResponse<RefreshedPayload> {
    execute_command("drive::refresh_all_tokens", || async move {
        Ok(RefreshedPayload { refreshed: ctx.drive.registry().refresh_all_tokens().await })
    })
    .await
}
