//! In-memory fakes for the core ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use streamsnap_common::TokenBundle;
use streamsnap_domain::{
    ChannelInfo, DomainInfo, DriveFolder, DriveUpload, FolderPage, FolderPageRequest,
    PermissionGrant, Playlist, Result, StreamSnapError, YouTubeUpload,
};

use crate::auth::ports::AuthorizationFlow;
use crate::drive::ports::{DriveGateway, UploadedFile};
use crate::storage_ports::DocumentStore;
use crate::youtube::ports::YouTubeGateway;

/// Document store kept in memory.
pub struct MemoryStore<T> {
    pub document: Mutex<Option<T>>,
    pub saves: AtomicUsize,
    pub fail_save: AtomicBool,
}

impl<T> MemoryStore<T> {
    pub fn new(document: Option<T>) -> Arc<Self> {
        Arc::new(Self {
            document: Mutex::new(document),
            saves: AtomicUsize::new(0),
            fail_save: AtomicBool::new(false),
        })
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn snapshot(&self) -> Option<T> {
        self.document.lock().clone()
    }
}

#[async_trait]
impl<T> DocumentStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn load(&self) -> Result<Option<T>> {
        Ok(self.document.lock().clone())
    }

    async fn save(&self, document: &T) -> Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StreamSnapError::Storage("disk full".into()));
        }
        *self.document.lock() = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Authorization flow answering from a script.
#[derive(Default)]
pub struct ScriptedFlow {
    pub outcomes: Mutex<VecDeque<Result<TokenBundle>>>,
}

impl ScriptedFlow {
    pub fn granting(bundles: Vec<TokenBundle>) -> Arc<Self> {
        Arc::new(Self { outcomes: Mutex::new(bundles.into_iter().map(Ok).collect()) })
    }
}

#[async_trait]
impl AuthorizationFlow for ScriptedFlow {
    async fn authorize(&self) -> Result<TokenBundle> {
        self.outcomes.lock().pop_front().unwrap_or(Err(StreamSnapError::AuthTimeout))
    }
}

/// A bundle valid for an hour.
pub fn fresh_bundle(access_token: &str) -> TokenBundle {
    TokenBundle::new(
        access_token,
        Some(format!("{access_token}-refresh")),
        Some(streamsnap_common::auth::now_millis() + 3_600_000),
    )
}

/// Drive gateway backed by fixed data.
#[derive(Default)]
pub struct FakeDrive {
    /// Access token to email
    pub users: Mutex<Vec<(String, String)>>,
    pub folders: Mutex<Vec<DriveFolder>>,
    /// Access tokens answered with 401
    pub rejected_tokens: Mutex<Vec<String>>,
    pub fail_permissions: AtomicBool,
    pub permissions: Mutex<Vec<(String, PermissionGrant)>>,
    pub calls: AtomicUsize,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn with_user(token: &str, email: &str) -> Arc<Self> {
        let fake = Self::default();
        fake.users.lock().push((token.to_string(), email.to_string()));
        Arc::new(fake)
    }

    pub fn add_user(&self, token: &str, email: &str) {
        self.users.lock().push((token.to_string(), email.to_string()));
    }

    fn check(&self, token: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().push(token.to_string());
        if self.rejected_tokens.lock().iter().any(|t| t == token) {
            return Err(StreamSnapError::ProviderApi { status: 401, body: "expired".into() });
        }
        Ok(())
    }
}

pub fn folder(id: &str) -> DriveFolder {
    DriveFolder {
        id: id.to_string(),
        name: format!("Folder {id}"),
        web_view_link: None,
        parents: None,
    }
}

#[async_trait]
impl DriveGateway for FakeDrive {
    async fn about_user(&self, access_token: &str) -> Result<DomainInfo> {
        // Let concurrent links reach this point before either takes the registry lock.
        tokio::task::yield_now().await;
        self.check(access_token)?;
        let users = self.users.lock();
        let email = users
            .iter()
            .find(|(token, _)| token == access_token)
            .map(|(_, email)| email.clone())
            .ok_or(StreamSnapError::ProviderApi { status: 401, body: "unknown".into() })?;
        DomainInfo::from_email(&email).ok_or(StreamSnapError::Internal("bad email".into()))
    }

    async fn list_folders(
        &self,
        access_token: &str,
        request: &FolderPageRequest,
    ) -> Result<FolderPage> {
        self.check(access_token)?;
        let folders = self.folders.lock();
        let start: usize = request.page_token.as_deref().and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + request.page_size as usize).min(folders.len());
        let next_page_token = (end < folders.len()).then(|| end.to_string());
        Ok(FolderPage { files: folders[start..end].to_vec(), next_page_token })
    }

    async fn create_folder(
        &self,
        access_token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder> {
        self.check(access_token)?;
        Ok(DriveFolder {
            id: format!("new-{name}"),
            name: name.to_string(),
            web_view_link: None,
            parents: parent_id.map(|p| vec![p.to_string()]),
        })
    }

    async fn upload_file(
        &self,
        access_token: &str,
        upload: &DriveUpload,
        _data: Bytes,
    ) -> Result<UploadedFile> {
        self.check(access_token)?;
        Ok(UploadedFile { id: format!("file-{}", upload.file_name), web_view_link: None })
    }

    async fn create_permission(
        &self,
        access_token: &str,
        file_id: &str,
        grant: &PermissionGrant,
    ) -> Result<()> {
        self.check(access_token)?;
        if self.fail_permissions.load(Ordering::SeqCst) {
            return Err(StreamSnapError::ProviderApi { status: 500, body: "boom".into() });
        }
        self.permissions.lock().push((file_id.to_string(), grant.clone()));
        Ok(())
    }
}

/// YouTube gateway backed by fixed data.
#[derive(Default)]
pub struct FakeYouTube {
    pub channel: Mutex<Option<ChannelInfo>>,
    pub email: Mutex<Option<String>>,
    pub playlists: Mutex<Vec<Playlist>>,
    pub fail_playlist_insert: AtomicBool,
    pub playlist_inserts: Mutex<Vec<(String, String)>>,
    pub uploads: AtomicUsize,
}

impl FakeYouTube {
    pub fn with_channel(channel_id: &str, name: &str) -> Arc<Self> {
        let fake = Self::default();
        *fake.channel.lock() = Some(ChannelInfo {
            channel_id: channel_id.to_string(),
            channel_name: name.to_string(),
            thumbnail: None,
        });
        Arc::new(fake)
    }
}

#[async_trait]
impl YouTubeGateway for FakeYouTube {
    async fn channel_info(&self, _access_token: &str) -> Result<Option<ChannelInfo>> {
        Ok(self.channel.lock().clone())
    }

    async fn user_email(&self, _access_token: &str) -> Result<Option<String>> {
        Ok(self.email.lock().clone())
    }

    async fn list_playlists(&self, _access_token: &str, max_results: u32) -> Result<Vec<Playlist>> {
        Ok(self.playlists.lock().iter().take(max_results as usize).cloned().collect())
    }

    async fn upload_video(
        &self,
        _access_token: &str,
        _upload: &YouTubeUpload,
        _data: Bytes,
    ) -> Result<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("vid{n}"))
    }

    async fn add_to_playlist(
        &self,
        _access_token: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<()> {
        if self.fail_playlist_insert.load(Ordering::SeqCst) {
            return Err(StreamSnapError::ProviderApi { status: 500, body: "backend".into() });
        }
        self.playlist_inserts.lock().push((playlist_id.to_string(), video_id.to_string()));
        Ok(())
    }
}
