//! Port interface for the YouTube Data API

use async_trait::async_trait;
use bytes::Bytes;
use streamsnap_domain::{ChannelInfo, Playlist, Result, YouTubeUpload};

#[async_trait]
pub trait YouTubeGateway: Send + Sync {
    /// The caller's own channel, `None` if the account has none.
    async fn channel_info(&self, access_token: &str) -> Result<Option<ChannelInfo>>;

    /// Email of the Google account behind the token.
    async fn user_email(&self, access_token: &str) -> Result<Option<String>>;

    async fn list_playlists(&self, access_token: &str, max_results: u32) -> Result<Vec<Playlist>>;

    /// Resumable upload; returns the new video id.
    async fn upload_video(
        &self,
        access_token: &str,
        upload: &YouTubeUpload,
        data: Bytes,
    ) -> Result<String>;

    async fn add_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<()>;
}
