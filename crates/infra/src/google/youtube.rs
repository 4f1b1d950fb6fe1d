//! YouTube Data v3 gateway
//!
//! Uploads use the resumable protocol: an init POST carrying the video
//! resource returns a session URI in `Location`, and the payload goes to
//! that URI in a single PUT.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use streamsnap_core::YouTubeGateway;
use streamsnap_domain::constants::DEFAULT_VIDEO_MIME;
use streamsnap_domain::{
    ChannelInfo, EndpointConfig, Playlist, Result, StreamSnapError, YouTubeUpload,
};
use tracing::debug;

use crate::http::{ensure_success, read_json, HttpClient};

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Snippet {
    fn thumbnail(self) -> (String, Option<String>) {
        let url = self.thumbnails.and_then(|t| t.default).map(|t| t.url);
        (self.title, url)
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsertedVideo {
    id: String,
}

/// YouTube gateway over [`HttpClient`].
#[derive(Clone)]
pub struct GoogleYouTubeGateway {
    http: HttpClient,
    api_base: String,
    upload_url: String,
    userinfo_url: String,
}

impl GoogleYouTubeGateway {
    pub fn new(http: HttpClient, endpoints: &EndpointConfig) -> Self {
        Self {
            http,
            api_base: endpoints.youtube_api.trim_end_matches('/').to_string(),
            upload_url: endpoints.youtube_upload.clone(),
            userinfo_url: endpoints.userinfo_url.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn start_session(
        &self,
        access_token: &str,
        upload: &YouTubeUpload,
        len: usize,
    ) -> Result<String> {
        let builder = self
            .http
            .request(Method::POST, self.upload_url.as_str())
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", DEFAULT_VIDEO_MIME)
            .header("X-Upload-Content-Length", len.to_string())
            .json(&upload.resource());
        let response = ensure_success(self.http.send_once(builder).await?).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                StreamSnapError::Internal("upload session has no Location header".into())
            })
    }
}

#[async_trait]
impl YouTubeGateway for GoogleYouTubeGateway {
    async fn channel_info(&self, access_token: &str) -> Result<Option<ChannelInfo>> {
        let builder = self
            .http
            .request(Method::GET, self.url("channels"))
            .bearer_auth(access_token)
            .query(&[("part", "snippet"), ("mine", "true")]);
        let list: ListResponse<Resource> = read_json(self.http.send(builder).await?).await?;

        Ok(list.items.into_iter().next().map(|channel| {
            let (channel_name, thumbnail) = channel.snippet.thumbnail();
            ChannelInfo { channel_id: channel.id, channel_name, thumbnail }
        }))
    }

    async fn user_email(&self, access_token: &str) -> Result<Option<String>> {
        let builder =
            self.http.request(Method::GET, self.userinfo_url.as_str()).bearer_auth(access_token);
        let info: UserInfo = read_json(self.http.send(builder).await?).await?;
        Ok(info.email.filter(|email| !email.is_empty()))
    }

    async fn list_playlists(&self, access_token: &str, max_results: u32) -> Result<Vec<Playlist>> {
        let builder = self
            .http
            .request(Method::GET, self.url("playlists"))
            .bearer_auth(access_token)
            .query(&[
                ("part", "snippet".to_string()),
                ("mine", "true".to_string()),
                ("maxResults", max_results.to_string()),
            ]);
        let list: ListResponse<Resource> = read_json(self.http.send(builder).await?).await?;

        Ok(list
            .items
            .into_iter()
            .map(|item| {
                let (title, thumbnail) = item.snippet.thumbnail();
                Playlist { id: item.id, title, thumbnail }
            })
            .collect())
    }

    async fn upload_video(
        &self,
        access_token: &str,
        upload: &YouTubeUpload,
        data: Bytes,
    ) -> Result<String> {
        let bytes = data.len();
        let session = self.start_session(access_token, upload, bytes).await?;
        debug!(bytes, "resumable upload session opened");

        let builder = self
            .http
            .request(Method::PUT, session.as_str())
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, DEFAULT_VIDEO_MIME)
            .body(data);
        let video: InsertedVideo = read_json(self.http.send_transfer(builder, bytes).await?).await?;
        Ok(video.id)
    }

    async fn add_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<()> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id }
            }
        });
        let builder = self
            .http
            .request(Method::POST, self.url("playlistItems"))
            .bearer_auth(access_token)
            .query(&[("part", "snippet")])
            .json(&body);
        ensure_success(self.http.send_once(builder).await?).await?;
        Ok(())
    }
}
