//! YouTube commands

use serde::{Deserialize, Serialize};
use streamsnap_domain::{
    AuthRecovery, ChannelInfo, Playlist, YouTubeAccount, YouTubeAccountPatch, YouTubeUpload,
    YouTubeUploadResult,
};

use super::{AccountPayload, AccountsPayload, RefreshedPayload, RemovedPayload, VideoSource};
use crate::utils::command_helpers::{execute_command, CommandResponse};
use crate::AppContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistsPayload {
    pub playlists: Vec<Playlist>,
}

pub async fn youtube_list_accounts(
    ctx: &AppContext,
) -> CommandResponse<AccountsPayload<YouTubeAccount>> {
    execute_command("youtube::list_accounts", || async move {
        Ok(AccountsPayload { accounts: ctx.youtube.registry().list().await })
    })
    .await
}

pub async fn youtube_get_active_accounts(
    ctx: &AppContext,
) -> CommandResponse<AccountsPayload<YouTubeAccount>> {
    execute_command("youtube::get_active_accounts", || async move {
        Ok(AccountsPayload { accounts: ctx.youtube.registry().get_active().await })
    })
    .await
}

/// Sign in and upsert the account for the resolved channel.
pub async fn youtube_sign_in(ctx: &AppContext) -> CommandResponse<AccountPayload<YouTubeAccount>> {
    execute_command("youtube::sign_in", || async move {
        Ok(AccountPayload { account: ctx.youtube.sign_in().await? })
    })
    .await
}

pub async fn youtube_remove_account(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<RemovedPayload> {
    execute_command("youtube::remove_account", || async move {
        Ok(RemovedPayload { removed: ctx.youtube.registry().remove(account_id).await? })
    })
    .await
}

pub async fn youtube_update_account(
    ctx: &AppContext,
    account_id: &str,
    patch: YouTubeAccountPatch,
) -> CommandResponse<AccountPayload<YouTubeAccount>> {
    execute_command("youtube::update_account", || async move {
        let account = ctx.youtube.registry().update(account_id, &patch).await?;
        Ok(AccountPayload { account })
    })
    .await
}

pub async fn youtube_get_channel_info(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<ChannelInfo> {
    execute_command("youtube::get_channel_info", || async move {
        ctx.youtube.channel_info(account_id).await
    })
    .await
}

pub async fn youtube_get_playlists(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<PlaylistsPayload> {
    execute_command("youtube::get_playlists", || async move {
        Ok(PlaylistsPayload { playlists: ctx.youtube.playlists(account_id).await? })
    })
    .await
}

pub async fn youtube_upload_video(
    ctx: &AppContext,
    account_id: &str,
    upload: YouTubeUpload,
    source: VideoSource,
) -> CommandResponse<YouTubeUploadResult> {
    execute_command("youtube::upload_video", || async move {
        let data = source.load().await?;
        ctx.youtube.upload_video(account_id, &upload, data).await
    })
    .await
}

pub async fn youtube_handle_auth_error(
    ctx: &AppContext,
    account_id: &str,
) -> CommandResponse<AuthRecovery> {
    execute_command("youtube::handle_auth_error", || async move {
        Ok(ctx.youtube.registry().handle_auth_error(account_id).await)
    })
    .await
}

pub async fn youtube_refresh_all_tokens(ctx: &AppContext) -> CommandResponse<RefreshedPayload> {
    execute_command("youtube::refresh_all_tokens", || async move {
        Ok(RefreshedPayload { refreshed: ctx.youtube.registry().refresh_all_tokens().await })
    })
    .await
}
