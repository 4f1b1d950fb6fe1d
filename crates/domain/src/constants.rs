//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Google endpoints
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const YOUTUBE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

// OAuth scopes
pub const DRIVE_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
];
pub const YOUTUBE_SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

// OAuth loopback flow
pub const OAUTH_CALLBACK_PATH: &str = "/oauth2callback";
pub const OAUTH_TIMEOUT_SECS: u64 = 60;

// Token freshness margins (ms)
pub const PROACTIVE_REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;
pub const REACTIVE_REFRESH_MARGIN_MS: i64 = 60 * 1000;

// Secret store
pub const KEYCHAIN_SERVICE: &str = "StreamSnap";
pub const LEGACY_DRIVE_VAULT_KEY: &str = "drive_tokens";
pub const DRIVE_VAULT_PREFIX: &str = "drive_tokens";
pub const YOUTUBE_VAULT_PREFIX: &str = "youtube_tokens";

// Local documents
pub const DATA_DIR_NAME: &str = ".streamsnap";
pub const DRIVE_ACCOUNTS_FILE: &str = "drive_accounts.json";
pub const YOUTUBE_ACCOUNTS_FILE: &str = "youtube-accounts.json";
pub const DRIVE_FALLBACK_TOKEN_FILE: &str = "drive_tokens.json";

// Drive
pub const DRIVE_FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const DRIVE_ROOT_FOLDER_ID: &str = "root";
pub const DRIVE_ROOT_FOLDER_NAME: &str = "My Drive (Root)";
pub const DRIVE_ROOT_FOLDER_LINK: &str = "https://drive.google.com/drive/my-drive";
pub const DRIVE_FOLDER_PAGE_SIZE: u32 = 40;
pub const DRIVE_FOLDER_LIST_LIMIT: u32 = 100;
pub const DRIVE_MULTIPART_BOUNDARY: &str = "-------314159265358979323846";
pub const DEFAULT_VIDEO_MIME: &str = "video/webm";
pub const CONSUMER_EMAIL_DOMAINS: [&str; 2] = ["gmail.com", "googlemail.com"];

// YouTube
pub const YOUTUBE_DEFAULT_DESCRIPTION: &str = "Uploaded with StreamSnap";
pub const YOUTUBE_DEFAULT_CATEGORY: &str = "22";
pub const YOUTUBE_PLAYLIST_PAGE_SIZE: u32 = 50;
pub const YOUTUBE_ACCOUNT_ID_PREFIX: &str = "yt_";

/// Vault key for a Drive account.
#[must_use]
pub fn drive_vault_key(account_id: &str) -> String {
    format!("{DRIVE_VAULT_PREFIX}:{account_id}")
}

/// Vault key for a YouTube account.
#[must_use]
pub fn youtube_vault_key(account_id: &str) -> String {
    format!("{YOUTUBE_VAULT_PREFIX}:{account_id}")
}

/// Public link for a Drive file when the API omits `webViewLink`.
#[must_use]
pub fn drive_file_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

/// Public watch URL for an uploaded video.
#[must_use]
pub fn youtube_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
