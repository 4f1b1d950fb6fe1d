//! Domain types and models
//!
//! - [`accounts`]: linked account records and registry documents
//! - [`drive`]: Drive folders, privacy and upload values
//! - [`youtube`]: channel, playlist and upload values

pub mod accounts;
pub mod drive;
pub mod youtube;

pub use accounts::{
    AuthRecovery, DriveAccount, DriveAccountPatch, DriveAccountsDocument, YouTubeAccount,
    YouTubeAccountPatch, YouTubeAccountRecord, YouTubeProfile,
};
pub use drive::{
    escape_query_literal, DomainInfo, DriveFolder, DrivePrivacy, DriveUpload, DriveUploadResult,
    FolderPage, FolderPageRequest, PermissionGrant, PrivacyOption,
};
pub use youtube::{ChannelInfo, Playlist, YouTubePrivacy, YouTubeUpload, YouTubeUploadResult};
