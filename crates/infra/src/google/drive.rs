//! Google Drive v3 gateway

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use streamsnap_core::{DriveGateway, UploadedFile};
use streamsnap_domain::constants::{DRIVE_FOLDER_MIME, DRIVE_MULTIPART_BOUNDARY};
use streamsnap_domain::{
    DomainInfo, DriveFolder, DriveUpload, EndpointConfig, FolderPage, FolderPageRequest,
    PermissionGrant, Result, StreamSnapError,
};
use tracing::debug;

use crate::http::{ensure_success, read_json, HttpClient};

const FOLDER_FIELDS: &str = "nextPageToken,files(id,name,webViewLink,parents)";

#[derive(Debug, Deserialize)]
struct AboutResponse {
    user: AboutUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutUser {
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Drive gateway over [`HttpClient`].
#[derive(Clone)]
pub struct GoogleDriveGateway {
    http: HttpClient,
    api_base: String,
    upload_url: String,
}

impl GoogleDriveGateway {
    pub fn new(http: HttpClient, endpoints: &EndpointConfig) -> Self {
        Self {
            http,
            api_base: endpoints.drive_api.trim_end_matches('/').to_string(),
            upload_url: endpoints.drive_upload.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }
}

/// `multipart/related` body: JSON metadata part, then the raw payload.
fn multipart_body(metadata: &serde_json::Value, mime_type: &str, data: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(data.len() + 512);
    body.put_slice(
        format!(
            "--{DRIVE_MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.put_slice(
        format!("--{DRIVE_MULTIPART_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
    );
    body.put_slice(data);
    body.put_slice(format!("\r\n--{DRIVE_MULTIPART_BOUNDARY}--").as_bytes());
    body.freeze()
}

#[async_trait]
impl DriveGateway for GoogleDriveGateway {
    async fn about_user(&self, access_token: &str) -> Result<DomainInfo> {
        let request = self
            .http
            .request(Method::GET, self.url("about"))
            .bearer_auth(access_token)
            .query(&[("fields", "user(emailAddress,displayName,photoLink)")]);
        let about: AboutResponse = read_json(self.http.send(request).await?).await?;

        about
            .user
            .email_address
            .as_deref()
            .and_then(DomainInfo::from_email)
            .ok_or_else(|| StreamSnapError::Internal("Drive profile has no email address".into()))
    }

    async fn list_folders(
        &self,
        access_token: &str,
        request: &FolderPageRequest,
    ) -> Result<FolderPage> {
        let mut params = vec![
            ("q", request.query()),
            ("fields", FOLDER_FIELDS.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(token) = &request.page_token {
            params.push(("pageToken", token.clone()));
        }

        let builder = self
            .http
            .request(Method::GET, self.url("files"))
            .bearer_auth(access_token)
            .query(&params);
        let page: FolderPage = read_json(self.http.send(builder).await?).await?;
        let more = page.next_page_token.is_some();
        debug!(count = page.files.len(), more, "folder page listed");
        Ok(page)
    }

    async fn create_folder(
        &self,
        access_token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder> {
        let mut metadata = json!({ "name": name, "mimeType": DRIVE_FOLDER_MIME });
        if let Some(parent) = parent_id {
            metadata["parents"] = json!([parent]);
        }

        let builder = self
            .http
            .request(Method::POST, self.url("files"))
            .bearer_auth(access_token)
            .query(&[("fields", "id,name,webViewLink,parents"), ("supportsAllDrives", "true")])
            .json(&metadata);
        read_json(self.http.send_once(builder).await?).await
    }

    async fn upload_file(
        &self,
        access_token: &str,
        upload: &DriveUpload,
        data: Bytes,
    ) -> Result<UploadedFile> {
        let mut metadata = json!({ "name": upload.file_name, "mimeType": upload.mime_type });
        if let Some(folder) = upload.folder_id.as_deref().filter(|f| !f.is_empty()) {
            metadata["parents"] = json!([folder]);
        }
        let body = multipart_body(&metadata, &upload.mime_type, &data);
        let body_len = body.len();
        debug!(file_name = %upload.file_name, bytes = data.len(), "uploading file to Drive");

        let builder = self
            .http
            .request(Method::POST, self.upload_url.as_str())
            .bearer_auth(access_token)
            .query(&[("fields", "id,webViewLink"), ("supportsAllDrives", "true")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={DRIVE_MULTIPART_BOUNDARY}"),
            )
            .body(body);
        let created: CreatedFile =
            read_json(self.http.send_transfer(builder, body_len).await?).await?;
        Ok(UploadedFile { id: created.id, web_view_link: created.web_view_link })
    }

    async fn create_permission(
        &self,
        access_token: &str,
        file_id: &str,
        grant: &PermissionGrant,
    ) -> Result<()> {
        let builder = self
            .http
            .request(Method::POST, self.url(&format!("files/{file_id}/permissions")))
            .bearer_auth(access_token)
            .query(&[("supportsAllDrives", "true")])
            .json(grant);
        ensure_success(self.http.send_once(builder).await?).await?;
        Ok(())
    }
}
