use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::auth::TokenProvider;
use crate::blob_store::{BlobStore, FOLDER_MIME};
use crate::error::{Result, StorageError};
use crate::models::StoredFile;

/// Blob store adapter over a drive-style REST API. All failures are
/// classified at this boundary; nothing propagates unmapped.
pub struct DriveBlobStore {
    base_url: String,
    client: reqwest::Client,
    auth: Arc<TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
}

impl DriveBlobStore {
    pub fn new(base_url: String, auth: Arc<TokenProvider>) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            auth,
        }
    }

    fn files_url(&self) -> String {
        format!("{}/v1/files", self.base_url)
    }

    fn upload_url(&self) -> String {
        format!("{}/v1/upload/files", self.base_url)
    }

    async fn classify(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::from_status(status, &body))
    }
}

#[async_trait]
impl BlobStore for DriveBlobStore {
    async fn find_folder(&self, name: &str, parent: &str) -> Result<Option<String>> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .get(self.files_url())
            .bearer_auth(token)
            .query(&[
                ("name", name),
                ("parent", parent),
                ("mime_type", FOLDER_MIME),
                ("trashed", "false"),
            ])
            .send()
            .await?;

        let response = Self::classify(response).await?;
        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, name: &str, parent: &str) -> Result<String> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .post(self.files_url())
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "parent": parent,
                "mime_type": FOLDER_MIME,
            }))
            .send()
            .await?;

        let response = Self::classify(response).await?;
        let entry: FileEntry = response.json().await?;
        tracing::debug!(folder = name, id = %entry.id, "folder created");
        Ok(entry.id)
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        content: Bytes,
        mime_type: &str,
    ) -> Result<StoredFile> {
        let token = self.auth.bearer().await?;

        let metadata = json!({
            "name": name,
            "parent": parent,
            "mime_type": mime_type,
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| StorageError::Unknown(e.to_string()))?,
            )
            .part(
                "media",
                reqwest::multipart::Part::stream(reqwest::Body::from(content))
                    .mime_str(mime_type)
                    .map_err(|e| StorageError::Unknown(e.to_string()))?,
            );

        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(token)
            .query(&[("upload_type", "multipart")])
            .multipart(form)
            .send()
            .await?;

        let response = Self::classify(response).await?;
        Ok(response.json().await?)
    }

    async fn create_resumable(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        size: u64,
    ) -> Result<(String, String)> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(token)
            .query(&[("upload_type", "resumable")])
            .json(&json!({
                "name": name,
                "parent": parent,
                "mime_type": mime_type,
                "size": size,
            }))
            .send()
            .await?;

        let response = Self::classify(response).await?;
        let session_url = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                StorageError::Unknown("resumable init returned no session URL".to_string())
            })?;

        let entry: FileEntry = response.json().await?;
        Ok((entry.id, session_url))
    }

    async fn get_file(&self, id: &str) -> Result<StoredFile> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .get(format!("{}/{}", self.files_url(), id))
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::classify(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .delete(format!("{}/{}", self.files_url(), id))
            .bearer_auth(token)
            .send()
            .await?;

        Self::classify(response).await?;
        Ok(())
    }
}
