//! Google Drive value types

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONSUMER_EMAIL_DOMAINS, DEFAULT_VIDEO_MIME, DRIVE_FOLDER_PAGE_SIZE, DRIVE_ROOT_FOLDER_ID,
    DRIVE_ROOT_FOLDER_LINK, DRIVE_ROOT_FOLDER_NAME,
};

/// A Drive folder as returned by `files.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

impl DriveFolder {
    /// Synthetic entry standing for the user's My Drive root.
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: DRIVE_ROOT_FOLDER_ID.to_string(),
            name: DRIVE_ROOT_FOLDER_NAME.to_string(),
            web_view_link: Some(DRIVE_ROOT_FOLDER_LINK.to_string()),
            parents: None,
        }
    }
}

/// One page of folders plus the provider's continuation token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPage {
    #[serde(default)]
    pub files: Vec<DriveFolder>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Paged listing options. The continuation token is opaque and passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolderPageRequest {
    pub page_size: u32,
    pub page_token: Option<String>,
    pub name_query: Option<String>,
    pub shared_with_me: bool,
}

impl Default for FolderPageRequest {
    fn default() -> Self {
        Self {
            page_size: DRIVE_FOLDER_PAGE_SIZE,
            page_token: None,
            name_query: None,
            shared_with_me: false,
        }
    }
}

/// Escape a user string for a single-quoted Drive query literal.
#[must_use]
pub fn escape_query_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

impl FolderPageRequest {
    /// Drive `q` expression for this request.
    #[must_use]
    pub fn query(&self) -> String {
        let mut parts = vec![
            format!("mimeType='{}'", crate::constants::DRIVE_FOLDER_MIME),
            "trashed=false".to_string(),
        ];
        if self.shared_with_me {
            parts.push("sharedWithMe = true".to_string());
        }
        if let Some(name) = self.name_query.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            parts.push(format!("name contains '{}'", escape_query_literal(name)));
        }
        parts.join(" and ")
    }
}

/// Sharing level applied to an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrivePrivacy {
    #[default]
    Restricted,
    AnyoneWithLink,
    Anyone,
    Domain,
}

impl DrivePrivacy {
    /// Permission to create after upload, if any.
    ///
    /// `Domain` only applies to organizational accounts; for consumer
    /// accounts it degrades to no permission.
    #[must_use]
    pub fn permission(self, domain: Option<&DomainInfo>) -> Option<PermissionGrant> {
        match self {
            Self::Restricted => None,
            Self::Anyone => Some(PermissionGrant::anyone(None)),
            Self::AnyoneWithLink => Some(PermissionGrant::anyone(Some(false))),
            Self::Domain => domain
                .filter(|info| info.is_organizational)
                .map(|info| PermissionGrant::domain(&info.domain)),
        }
    }
}

/// Body of a Drive `permissions.create` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_file_discovery: Option<bool>,
}

impl PermissionGrant {
    fn anyone(allow_file_discovery: Option<bool>) -> Self {
        Self { role: "reader".into(), kind: "anyone".into(), domain: None, allow_file_discovery }
    }

    fn domain(domain: &str) -> Self {
        Self {
            role: "reader".into(),
            kind: "domain".into(),
            domain: Some(domain.to_string()),
            allow_file_discovery: None,
        }
    }
}

/// One entry of the privacy picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyOption {
    pub value: DrivePrivacy,
    pub label: String,
    pub description: String,
}

impl PrivacyOption {
    fn new(value: DrivePrivacy, label: &str, description: &str) -> Self {
        Self { value, label: label.to_string(), description: description.to_string() }
    }

    /// Options for an account; organizational accounts get a domain entry
    /// ahead of `Public`.
    #[must_use]
    pub fn for_account(domain: Option<&DomainInfo>) -> Vec<Self> {
        let mut options = vec![
            Self::new(
                DrivePrivacy::Restricted,
                "Private (only me)",
                "Only you can access this video",
            ),
            Self::new(
                DrivePrivacy::AnyoneWithLink,
                "Anyone with the link",
                "Anyone with the link can view",
            ),
            Self::new(DrivePrivacy::Anyone, "Public", "Anyone can find and view this video"),
        ];
        if let Some(info) = domain.filter(|info| info.is_organizational) {
            options.insert(
                2,
                Self {
                    value: DrivePrivacy::Domain,
                    label: format!("Organization ({})", info.domain),
                    description: "Anyone in your organization can view".to_string(),
                },
            );
        }
        options
    }
}

/// Who the account belongs to, derived from its email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    pub email: String,
    pub domain: String,
    pub is_organizational: bool,
}

impl DomainInfo {
    /// `None` when the address has no domain part.
    #[must_use]
    pub fn from_email(email: &str) -> Option<Self> {
        let (_, domain) = email.rsplit_once('@')?;
        if domain.is_empty() {
            return None;
        }
        let lowered = domain.to_ascii_lowercase();
        let is_organizational = !CONSUMER_EMAIL_DOMAINS.contains(&lowered.as_str());
        Some(Self { email: email.to_string(), domain: domain.to_string(), is_organizational })
    }
}

/// Upload metadata; the payload travels separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUpload {
    #[serde(default)]
    pub folder_id: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub privacy: DrivePrivacy,
    #[serde(default = "default_video_mime")]
    pub mime_type: String,
}

fn default_video_mime() -> String {
    DEFAULT_VIDEO_MIME.to_string()
}

impl DriveUpload {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        folder_id: Option<String>,
        privacy: DrivePrivacy,
    ) -> Self {
        Self { folder_id, file_name: file_name.into(), privacy, mime_type: default_video_mime() }
    }
}

/// Uniform upload result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUploadResult {
    pub file_id: String,
    pub file_name: String,
    pub web_view_link: String,
    pub privacy: DrivePrivacy,
}
