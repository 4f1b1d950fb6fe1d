//! Linked account records
//!
//! Records hold metadata only. Tokens live in the credential vault under
//! `vault_key`; nothing in this module ever carries a secret.

use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use super::drive::DomainInfo;
use super::youtube::{ChannelInfo, YouTubePrivacy};

fn default_true() -> bool {
    true
}

/// Placeholder name used until an email is known.
#[must_use]
pub fn placeholder_display_name(account_id: &str) -> String {
    let prefix: String = account_id.chars().take(6).collect();
    format!("Account {prefix}")
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// A linked Google Drive account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveAccount {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub is_organizational: bool,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Older documents call this `keytarAccount`
    #[serde(alias = "keytarAccount")]
    pub vault_key: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub default_folder_id: Option<String>,
    #[serde(default)]
    pub default_folder_name: Option<String>,
    #[serde(default)]
    pub needs_reauth: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl DriveAccount {
    /// Fresh active account. `display_name` wins over the derived name.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        vault_key: impl Into<String>,
        profile: Option<&DomainInfo>,
        display_name: Option<String>,
        now_ms: i64,
    ) -> Self {
        let id = id.into();
        let email = profile.map(|p| p.email.clone());
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| match email.as_deref() {
                Some(email) => email_local_part(email).to_string(),
                None => placeholder_display_name(&id),
            });

        Self {
            email,
            domain: profile.map(|p| p.domain.clone()),
            is_organizational: profile.is_some_and(|p| p.is_organizational),
            display_name,
            avatar_url: None,
            vault_key: vault_key.into(),
            is_active: true,
            default_folder_id: None,
            default_folder_name: None,
            needs_reauth: false,
            created_at: now_ms,
            updated_at: now_ms,
            id,
        }
    }

    /// Whether the display name is still a placeholder.
    #[must_use]
    pub fn has_placeholder_name(&self) -> bool {
        self.display_name.is_empty() || self.display_name.starts_with("Account ")
    }

    /// Copy with the placeholder name replaced by the email local part.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut account = self.clone();
        if let Some(email) = account.email.as_deref().filter(|e| !e.is_empty()) {
            if account.has_placeholder_name() {
                account.display_name = email_local_part(email).to_string();
            }
        }
        account
    }

    /// Fill identity fields from a resolved profile.
    pub fn apply_profile(&mut self, profile: &DomainInfo) {
        self.email = Some(profile.email.clone());
        self.domain = Some(profile.domain.clone());
        self.is_organizational = profile.is_organizational;
        if self.has_placeholder_name() {
            self.display_name = email_local_part(&profile.email).to_string();
        }
    }

    /// Profile view, if the email has been resolved.
    #[must_use]
    pub fn domain_info(&self) -> Option<DomainInfo> {
        let email = self.email.as_deref()?;
        Some(DomainInfo {
            email: email.to_string(),
            domain: self.domain.clone().unwrap_or_default(),
            is_organizational: self.is_organizational,
        })
    }
}

/// On-disk Drive registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveAccountsDocument {
    #[serde(default)]
    pub accounts: Vec<DriveAccount>,
    #[serde(default)]
    pub default_account_id: Option<String>,
}

/// Partial update for a Drive account.
///
/// Nullable fields use a double option: absent leaves the field alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveAccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub default_folder_id: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub default_folder_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_reauth: Option<bool>,
}

impl DriveAccountPatch {
    pub fn apply(&self, account: &mut DriveAccount, now_ms: i64) {
        if let Some(name) = &self.display_name {
            account.display_name = name.clone();
        }
        if let Some(avatar) = &self.avatar_url {
            account.avatar_url = avatar.clone();
        }
        if let Some(active) = self.is_active {
            account.is_active = active;
        }
        if let Some(folder_id) = &self.default_folder_id {
            account.default_folder_id = folder_id.clone();
        }
        if let Some(folder_name) = &self.default_folder_name {
            account.default_folder_name = folder_name.clone();
        }
        if let Some(flag) = self.needs_reauth {
            account.needs_reauth = flag;
        }
        account.updated_at = now_ms.max(account.updated_at);
    }
}

/// A linked YouTube channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeAccount {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub vault_key: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub default_privacy: Option<YouTubePrivacy>,
    #[serde(default)]
    pub selected_playlist_id: Option<String>,
    #[serde(default)]
    pub needs_reauth: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl YouTubeAccount {
    /// Same identity: matching channel, or matching non-empty email.
    #[must_use]
    pub fn matches(&self, profile: &YouTubeProfile) -> bool {
        if !profile.channel.channel_id.is_empty() && self.channel_id == profile.channel.channel_id {
            return true;
        }
        match (self.email.as_deref(), profile.email.as_deref()) {
            (Some(mine), Some(theirs)) => !mine.is_empty() && mine == theirs,
            _ => false,
        }
    }
}

/// Row of `youtube-accounts.json`.
///
/// Releases before the vault kept tokens inline; those fields are read so
/// they can be moved into the vault, and are only written back while that
/// move has not succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeAccountRecord {
    #[serde(flatten)]
    pub account: YouTubeAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<i64>,
}

impl YouTubeAccountRecord {
    #[must_use]
    pub fn has_inline_tokens(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            || self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn strip_inline_tokens(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.token_expiry = None;
    }
}

impl From<YouTubeAccount> for YouTubeAccountRecord {
    fn from(account: YouTubeAccount) -> Self {
        Self { account, access_token: None, refresh_token: None, token_expiry: None }
    }
}

/// Identity resolved for a YouTube sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub channel: ChannelInfo,
}

/// Partial update for a YouTube account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeAccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub default_privacy: Option<Option<YouTubePrivacy>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub selected_playlist_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_reauth: Option<bool>,
}

impl YouTubeAccountPatch {
    pub fn apply(&self, account: &mut YouTubeAccount) {
        if let Some(active) = self.active {
            account.active = active;
        }
        if let Some(privacy) = &self.default_privacy {
            account.default_privacy = *privacy;
        }
        if let Some(playlist) = &self.selected_playlist_id {
            account.selected_playlist_id = playlist.clone();
        }
        if let Some(flag) = self.needs_reauth {
            account.needs_reauth = flag;
        }
    }
}

/// Outcome of reactive recovery after an auth failure.
///
/// The caller decides whether `should_remove` leads to deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecovery {
    pub refreshed: bool,
    pub should_remove: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthRecovery {
    #[must_use]
    pub fn refreshed() -> Self {
        Self { refreshed: true, should_remove: false, reason: None }
    }

    #[must_use]
    pub fn remove(reason: impl Into<String>) -> Self {
        Self { refreshed: false, should_remove: true, reason: Some(reason.into()) }
    }
}
