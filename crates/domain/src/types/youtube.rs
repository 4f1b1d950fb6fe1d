//! YouTube value types

use serde::{Deserialize, Serialize};

use crate::constants::{YOUTUBE_DEFAULT_CATEGORY, YOUTUBE_DEFAULT_DESCRIPTION};

/// `status.privacyStatus` of an uploaded video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YouTubePrivacy {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl YouTubePrivacy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Unlisted => "unlisted",
            Self::Public => "public",
        }
    }
}

/// Channel owned by the authorized Google account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub channel_name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Upload metadata; the payload travels separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YouTubeUpload {
    pub title: String,
    pub description: Option<String>,
    pub privacy: Option<YouTubePrivacy>,
    pub playlist_id: Option<String>,
}

impl YouTubeUpload {
    /// `videos.insert` body (`snippet` + `status`).
    #[must_use]
    pub fn resource(&self) -> serde_json::Value {
        let description = self
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(YOUTUBE_DEFAULT_DESCRIPTION);
        serde_json::json!({
            "snippet": {
                "title": self.title,
                "description": description,
                "categoryId": YOUTUBE_DEFAULT_CATEGORY,
            },
            "status": {
                "privacyStatus": self.privacy.unwrap_or_default().as_str(),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeUploadResult {
    pub video_id: String,
    pub video_url: String,
}
