//! Authenticated YouTube operations

use std::sync::Arc;

use bytes::Bytes;
use streamsnap_domain::constants::{youtube_watch_url, YOUTUBE_PLAYLIST_PAGE_SIZE};
use streamsnap_domain::{
    ChannelInfo, Playlist, Result, StreamSnapError, YouTubeAccount, YouTubeProfile,
    YouTubeUpload, YouTubeUploadResult,
};
use tracing::{info, warn};

use super::ports::YouTubeGateway;
use super::registry::YouTubeAccountRegistry;
use crate::auth::ports::AuthorizationFlow;
use crate::auth::{with_access_token, TokenRefreshEngine};

pub struct YouTubeService {
    registry: Arc<YouTubeAccountRegistry>,
    refresher: Arc<TokenRefreshEngine>,
    gateway: Arc<dyn YouTubeGateway>,
    flow: Arc<dyn AuthorizationFlow>,
}

impl YouTubeService {
    pub fn new(
        registry: Arc<YouTubeAccountRegistry>,
        refresher: Arc<TokenRefreshEngine>,
        gateway: Arc<dyn YouTubeGateway>,
        flow: Arc<dyn AuthorizationFlow>,
    ) -> Self {
        Self { registry, refresher, gateway, flow }
    }

    pub fn registry(&self) -> &Arc<YouTubeAccountRegistry> {
        &self.registry
    }

    /// Authorize, resolve the channel, then upsert the account.
    ///
    /// Nothing is persisted when the Google account has no channel. The
    /// email lookup is best effort.
    ///
    /// # Errors
    /// Flow errors, `NoChannel`, the channel lookup's provider error, or the
    /// registry error.
    pub async fn sign_in(&self) -> Result<YouTubeAccount> {
        let bundle = self.flow.authorize().await?;
        let token = bundle.access_token.as_str();

        let channel = self.gateway.channel_info(token).await?.ok_or(StreamSnapError::NoChannel)?;
        let email = match self.gateway.user_email(token).await {
            Ok(email) => email,
            Err(err) => {
                warn!(channel_id = %channel.channel_id, error = %err, "email lookup failed");
                None
            }
        };

        self.registry.upsert(&YouTubeProfile { email, channel }, &bundle).await
    }

    async fn vault_key(&self, account_id: &str) -> Result<String> {
        Ok(self.registry.require(account_id).await?.vault_key)
    }

    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated`, `NoChannel` or the provider
    /// error.
    pub async fn channel_info(&self, account_id: &str) -> Result<ChannelInfo> {
        let vault_key = self.vault_key(account_id).await?;
        let gateway = &self.gateway;

        with_access_token(&self.refresher, &vault_key, |token| async move {
            gateway.channel_info(&token).await
        })
        .await?
        .ok_or(StreamSnapError::NoChannel)
    }

    /// Up to 50 of the channel's playlists.
    ///
    /// # Errors
    /// `AccountNotFound`, `NotAuthenticated` or the provider error.
    pub async fn playlists(&self, account_id: &str) -> Result<Vec<Playlist>> {
        let vault_key = self.vault_key(account_id).await?;
        let gateway = &self.gateway;

        with_access_token(&self.refresher, &vault_key, |token| async move {
            gateway.list_playlists(&token, YOUTUBE_PLAYLIST_PAGE_SIZE).await
        })
        .await
    }

    /// Upload a video and optionally file it into a playlist.
    ///
    /// The playlist insert is best effort once the video exists.
    ///
    /// # Errors
    /// `InvalidInput` for a blank title, `AccountNotFound`,
    /// `NotAuthenticated` or the upload's provider error.
    pub async fn upload_video(
        &self,
        account_id: &str,
        upload: &YouTubeUpload,
        data: Bytes,
    ) -> Result<YouTubeUploadResult> {
        if upload.title.trim().is_empty() {
            return Err(StreamSnapError::InvalidInput("video title is empty".into()));
        }
        let vault_key = self.vault_key(account_id).await?;
        let gateway = &self.gateway;
        let size = data.len();

        let video_id = with_access_token(&self.refresher, &vault_key, |token| {
            let data = data.clone();
            async move { gateway.upload_video(&token, upload, data).await }
        })
        .await?;
        info!(
            account_id = %account_id,
            video_id = %video_id,
            bytes = size,
            "youtube upload finished"
        );

        if let Some(playlist_id) = upload.playlist_id.as_deref().filter(|p| !p.is_empty()) {
            let video = video_id.as_str();
            let added = with_access_token(&self.refresher, &vault_key, |token| async move {
                gateway.add_to_playlist(&token, playlist_id, video).await
            })
            .await;
            if let Err(err) = added {
                warn!(
                    account_id = %account_id,
                    playlist_id = %playlist_id,
                    error = %err,
                    "failed to add video to playlist"
                );
            }
        }

        Ok(YouTubeUploadResult { video_url: youtube_watch_url(&video_id), video_id })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for youtube::service.
    use std::sync::atomic::Ordering;

    use streamsnap_common::testing::{MockOAuthClient, MockVault};
    use streamsnap_domain::{Playlist, YouTubeAccountRecord};

    use super::*;
    use crate::test_support::{fresh_bundle, FakeYouTube, MemoryStore, ScriptedFlow};

    struct Harness {
        service: YouTubeService,
        gateway: Arc<FakeYouTube>,
        store: Arc<MemoryStore<Vec<YouTubeAccountRecord>>>,
        vault: MockVault,
    }

    async fn harness(gateway: Arc<FakeYouTube>, flow: Arc<ScriptedFlow>) -> Harness {
        let store = MemoryStore::new(None);
        let vault = MockVault::new();
        let refresher = Arc::new(TokenRefreshEngine::new(
            Arc::new(vault.clone()),
            Arc::new(MockOAuthClient::new()),
        ));
        let registry = YouTubeAccountRegistry::load(store.clone(), refresher.clone())
            .await
            .expect("load should succeed");
        let service = YouTubeService::new(Arc::new(registry), refresher, gateway.clone(), flow);
        Harness { service, gateway, store, vault }
    }

    /// Validates sign-in links a channel and stores its bundle.
    ///
    /// Assertions:
    /// - Confirms the account carries channel and email.
    /// - Confirms the bundle is stored under the account's key.
    #[tokio::test]
    async fn test_sign_in_links_channel() {
        let gateway = FakeYouTube::with_channel("UC1", "Clips");
        *gateway.email.lock() = Some("me@gmail.com".into());
        let h = harness(gateway, ScriptedFlow::granting(vec![fresh_bundle("t1")])).await;

        let account = h.service.sign_in().await.unwrap();

        assert_eq!(account.channel_name, "Clips");
        assert_eq!(account.email.as_deref(), Some("me@gmail.com"));
        assert_eq!(h.vault.peek(&account.vault_key).unwrap().access_token, "t1");
    }

    /// Validates a Google account without a channel is not persisted.
    ///
    /// Assertions:
    /// - Ensures `NoChannel` and no registry write.
    #[tokio::test]
    async fn test_sign_in_without_channel() {
        let h = harness(
            Arc::new(FakeYouTube::default()),
            ScriptedFlow::granting(vec![fresh_bundle("t1")]),
        )
        .await;

        assert_eq!(h.service.sign_in().await.unwrap_err(), StreamSnapError::NoChannel);
        assert_eq!(h.store.save_count(), 0);
        assert!(h.vault.keys().is_empty());
    }

    /// Validates a failing playlist insert does not fail the upload.
    ///
    /// Assertions:
    /// - Confirms the watch URL is built from the video id.
    /// - Confirms a working insert files the video.
    #[tokio::test]
    async fn test_upload_with_playlist() {
        let gateway = FakeYouTube::with_channel("UC1", "Clips");
        let h = harness(gateway, ScriptedFlow::granting(vec![fresh_bundle("t1")])).await;
        let account = h.service.sign_in().await.unwrap();
        let upload = YouTubeUpload {
            title: "Run".into(),
            playlist_id: Some("PL1".into()),
            ..YouTubeUpload::default()
        };

        h.gateway.fail_playlist_insert.store(true, Ordering::SeqCst);
        let result =
            h.service.upload_video(&account.id, &upload, Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(result.video_url, "https://www.youtube.com/watch?v=vid0");
        assert!(h.gateway.playlist_inserts.lock().is_empty());

        h.gateway.fail_playlist_insert.store(false, Ordering::SeqCst);
        let result = h.service.upload_video(&account.id, &upload, Bytes::new()).await.unwrap();
        assert_eq!(h.gateway.playlist_inserts.lock()[0], ("PL1".to_string(), result.video_id));
    }

    /// Validates playlist and channel lookups for a linked account.
    ///
    /// Assertions:
    /// - Confirms playlists come back as listed.
    /// - Ensures unknown accounts yield `AccountNotFound`.
    /// - Ensures a blank title is rejected.
    #[tokio::test]
    async fn test_lookups_and_validation() {
        let gateway = FakeYouTube::with_channel("UC1", "Clips");
        let runs = Playlist { id: "PL1".into(), title: "Runs".into(), thumbnail: None };
        gateway.playlists.lock().push(runs);
        let h = harness(gateway, ScriptedFlow::granting(vec![fresh_bundle("t1")])).await;
        let account = h.service.sign_in().await.unwrap();

        assert_eq!(h.service.playlists(&account.id).await.unwrap().len(), 1);
        assert_eq!(h.service.channel_info(&account.id).await.unwrap().channel_id, "UC1");
        assert_eq!(
            h.service.playlists("yt_missing").await.unwrap_err(),
            StreamSnapError::AccountNotFound("yt_missing".into())
        );
        let untitled = YouTubeUpload::default();
        let err = h.service.upload_video(&account.id, &untitled, Bytes::new()).await;
        assert!(matches!(err, Err(StreamSnapError::InvalidInput(_))));
    }
}
