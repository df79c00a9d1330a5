use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::blob_store::BlobStore;
use crate::error::{Result, StorageError};
use crate::models::{StoredFile, UploadMetadata, UploadReceipt, UploadSession};

pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

pub const ALLOWED_VIDEO_MIMES: [&str; 4] = [
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/avi",
];

const SESSION_TTL_MINUTES: i64 = 60;

/// Result of opening a two-phase upload. The client streams the bytes to
/// `upload_url` itself, then calls finalize with the session id.
#[derive(Debug, Clone)]
pub struct InitiatedUpload {
    pub session_id: Uuid,
    pub upload_url: String,
    pub file_id: String,
    pub file_name: String,
}

/// Everything the sidecar records about a submission.
#[derive(Debug, Serialize)]
struct Sidecar<'a> {
    username: &'a str,
    phone: &'a str,
    link: &'a str,
    follow_proof: &'a str,
    unit: Option<&'a str>,
    uploaded_at: DateTime<Utc>,
    file_id: &'a str,
    file_name: &'a str,
    file_size: u64,
}

/// Orchestrates video submissions against the blob store: lazily provisioned
/// year/user folder hierarchy, sanitized unique filenames, a JSON metadata
/// sidecar next to each video, and a session registry for two-phase uploads.
///
/// The folder ensure step is find-then-create without locking; two concurrent
/// submitters with the same folder name can still race into duplicates, the
/// same exposure the backing store itself has.
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    root_folder: String,
    sessions: Mutex<HashMap<Uuid, UploadSession>>,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>, root_folder: String) -> Self {
        Self {
            store,
            root_folder,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Reject anything outside the video allow-list or over the size ceiling
    /// before a single remote call is made.
    pub fn validate_video(mime_type: &str, size: u64) -> Result<()> {
        if !ALLOWED_VIDEO_MIMES.contains(&mime_type) {
            return Err(StorageError::BadRequest(format!(
                "invalid file type '{}', only mp4, mov and avi videos are accepted",
                mime_type
            )));
        }
        if size == 0 {
            return Err(StorageError::BadRequest("video file is empty".to_string()));
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(StorageError::BadRequest(
                "file exceeds the 100 MiB limit".to_string(),
            ));
        }
        Ok(())
    }

    /// Single-shot upload: the whole payload is already in memory.
    pub async fn upload_video(
        &self,
        content: Bytes,
        original_name: &str,
        mime_type: &str,
        metadata: UploadMetadata,
    ) -> Result<UploadReceipt> {
        Self::validate_video(mime_type, content.len() as u64)?;

        let folder = self.user_folder(&metadata.username).await?;
        let file_name = unique_filename(&metadata.username, original_name, metadata.uploaded_at);

        let file = self
            .store
            .create_file(&file_name, &folder, content, mime_type)
            .await?;

        let receipt = self.write_sidecar(&folder, &metadata, &file).await?;
        tracing::info!(
            username = %metadata.username,
            file_id = %receipt.file_id,
            size = receipt.file_size,
            "video upload completed"
        );
        Ok(receipt)
    }

    /// Open a two-phase upload: provision folders, reserve the file object,
    /// and record a session the finalize call must present.
    pub async fn init_upload(
        &self,
        original_name: &str,
        mime_type: &str,
        declared_size: u64,
        metadata: UploadMetadata,
    ) -> Result<InitiatedUpload> {
        Self::validate_video(mime_type, declared_size)?;

        let folder = self.user_folder(&metadata.username).await?;
        let file_name = unique_filename(&metadata.username, original_name, metadata.uploaded_at);

        let (file_id, upload_url) = self
            .store
            .create_resumable(&file_name, &folder, mime_type, declared_size)
            .await?;

        let session_id = Uuid::new_v4();
        let session = UploadSession {
            session_id,
            file_id: file_id.clone(),
            file_name: file_name.clone(),
            parent_folder: folder,
            expected_size: declared_size,
            owner: metadata.username.clone(),
            metadata,
            expires_at: Utc::now() + Duration::minutes(SESSION_TTL_MINUTES),
        };
        self.sessions.lock().await.insert(session_id, session);

        tracing::debug!(%session_id, file = %file_name, "upload session opened");
        Ok(InitiatedUpload {
            session_id,
            upload_url,
            file_id,
            file_name,
        })
    }

    /// Close a two-phase upload: verify the session exists and the bytes
    /// actually arrived, then write the sidecar.
    pub async fn finalize_upload(&self, session_id: Uuid) -> Result<UploadReceipt> {
        let session = {
            let mut sessions = self.sessions.lock().await;
            let now = Utc::now();
            sessions.retain(|_, s| s.expires_at > now);
            sessions.remove(&session_id)
        }
        .ok_or_else(|| {
            StorageError::BadRequest("unknown or expired upload session".to_string())
        })?;

        let file = self.store.get_file(&session.file_id).await?;
        if file.size != session.expected_size {
            return Err(StorageError::BadRequest(format!(
                "upload incomplete: expected {} bytes, found {}",
                session.expected_size, file.size
            )));
        }

        self.write_sidecar(&session.parent_folder, &session.metadata, &file)
            .await
    }

    /// Folder for today's submissions from one user, nested under the
    /// current-year competition folder. Both levels are find-then-create, so
    /// repeated uploads reuse the same folders.
    async fn user_folder(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let year_folder = format!("competition-videos-{}", now.format("%Y"));
        let user_folder = format!("{}_{}", username, now.format("%Y-%m-%d"));

        let year_id = self.ensure_folder(&year_folder, &self.root_folder).await?;
        self.ensure_folder(&user_folder, &year_id).await
    }

    async fn ensure_folder(&self, name: &str, parent: &str) -> Result<String> {
        if let Some(id) = self.store.find_folder(name, parent).await? {
            return Ok(id);
        }
        self.store.create_folder(name, parent).await
    }

    /// Write the metadata sidecar next to the stored file. If the write
    /// fails, the already-created file is removed best-effort so a partial
    /// upload is never reported as success.
    async fn write_sidecar(
        &self,
        parent: &str,
        metadata: &UploadMetadata,
        file: &StoredFile,
    ) -> Result<UploadReceipt> {
        let sidecar = Sidecar {
            username: &metadata.username,
            phone: &metadata.phone,
            link: &metadata.link,
            follow_proof: &metadata.follow_proof,
            unit: metadata.unit.as_deref(),
            uploaded_at: metadata.uploaded_at,
            file_id: &file.id,
            file_name: &file.name,
            file_size: file.size,
        };
        let body = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| StorageError::Unknown(e.to_string()))?;
        let sidecar_name = format!("{}.meta.json", file.name);

        let written = self
            .store
            .create_file(&sidecar_name, parent, Bytes::from(body), "application/json")
            .await;

        match written {
            Ok(meta_file) => Ok(UploadReceipt {
                file_id: file.id.clone(),
                file_name: file.name.clone(),
                file_size: file.size,
                web_view_link: file.web_view_link.clone(),
                metadata_file_id: meta_file.id,
            }),
            Err(err) => {
                if let Err(cleanup) = self.store.delete_file(&file.id).await {
                    tracing::warn!(file_id = %file.id, error = %cleanup, "cleanup of orphaned file failed");
                }
                Err(err)
            }
        }
    }

    #[cfg(test)]
    async fn expire_session(&self, session_id: Uuid) {
        if let Some(session) = self.sessions.lock().await.get_mut(&session_id) {
            session.expires_at = Utc::now() - Duration::minutes(1);
        }
    }
}

/// Strip everything outside `[A-Za-z0-9._-]` from a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}

/// Prefix with the submitter and a timestamp so names never collide within a
/// shared user folder.
fn unique_filename(username: &str, original: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        sanitize_filename(username),
        at.timestamp(),
        sanitize_filename(original)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::fake::FakeBlobStore;
    use serde_json::Value;

    fn metadata(username: &str) -> UploadMetadata {
        UploadMetadata {
            username: username.to_string(),
            phone: "081111111111".to_string(),
            link: "https://videos.example/submission".to_string(),
            follow_proof: "https://social.example/proof".to_string(),
            unit: Some("Unit X".to_string()),
            uploaded_at: Utc::now(),
        }
    }

    fn service(store: &FakeBlobStore) -> UploadService {
        UploadService::new(Arc::new(store.clone()), "root-folder".to_string())
    }

    #[test]
    fn sanitizes_filenames() {
        assert_eq!(sanitize_filename("my video (1).mp4"), "myvideo1.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_filename("???"), "video");
        assert_eq!(sanitize_filename("clip.mov"), "clip.mov");
    }

    #[test]
    fn rejects_disallowed_mime_and_size() {
        assert!(matches!(
            UploadService::validate_video("image/png", 10),
            Err(StorageError::BadRequest(_))
        ));
        assert!(matches!(
            UploadService::validate_video("video/mp4", MAX_UPLOAD_BYTES + 1),
            Err(StorageError::BadRequest(_))
        ));
        assert!(matches!(
            UploadService::validate_video("video/mp4", 0),
            Err(StorageError::BadRequest(_))
        ));
        assert!(UploadService::validate_video("video/mp4", MAX_UPLOAD_BYTES).is_ok());
        assert!(UploadService::validate_video("video/quicktime", 1).is_ok());
    }

    #[tokio::test]
    async fn upload_creates_folders_file_and_sidecar() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let receipt = svc
            .upload_video(
                Bytes::from_static(b"video bytes"),
                "my clip.mp4",
                "video/mp4",
                metadata("andi"),
            )
            .await
            .unwrap();

        assert!(receipt.file_name.starts_with("andi_"));
        assert!(receipt.file_name.ends_with("myclip.mp4"));
        assert_eq!(receipt.file_size, 11);
        assert!(receipt.web_view_link.is_some());

        // Year folder + user folder.
        assert_eq!(store.folder_count().await, 2);

        let files = store.files().await;
        assert_eq!(files.len(), 2);
        let sidecar = files
            .iter()
            .find(|(_, f)| f.name.ends_with(".meta.json"))
            .expect("sidecar written");
        assert_eq!(sidecar.1.mime_type, "application/json");

        let body: Value = serde_json::from_slice(&sidecar.1.content).unwrap();
        assert_eq!(body["username"], "andi");
        assert_eq!(body["file_id"], receipt.file_id);
        assert_eq!(body["file_size"], 11);
        assert_eq!(body["unit"], "Unit X");
    }

    #[tokio::test]
    async fn repeated_uploads_reuse_folders() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        for _ in 0..2 {
            svc.upload_video(
                Bytes::from_static(b"x"),
                "clip.mp4",
                "video/mp4",
                metadata("budi"),
            )
            .await
            .unwrap();
        }

        assert_eq!(store.folder_count().await, 2);
    }

    #[tokio::test]
    async fn ensure_folder_is_idempotent_when_serial() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let first = svc.ensure_folder("year", "root-folder").await.unwrap();
        let second = svc.ensure_folder("year", "root-folder").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.folder_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_mime_makes_no_remote_calls() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let err = svc
            .upload_video(
                Bytes::from_static(b"png bytes"),
                "image.png",
                "image/png",
                metadata("andi"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::BadRequest(_)));
        assert_eq!(store.call_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_payload_makes_no_remote_calls() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let payload = Bytes::from(vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize]);
        let err = svc
            .upload_video(payload, "big.mp4", "video/mp4", metadata("andi"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::BadRequest(_)));
        assert_eq!(store.call_count().await, 0);
    }

    #[tokio::test]
    async fn sidecar_failure_removes_the_uploaded_file() {
        let store = FakeBlobStore::new();
        let svc = service(&store);
        store.fail_files_containing(".meta.json").await;

        let err = svc
            .upload_video(
                Bytes::from_static(b"video"),
                "clip.mp4",
                "video/mp4",
                metadata("andi"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Unknown(_)));
        assert!(store.files().await.is_empty());
    }

    #[tokio::test]
    async fn two_phase_upload_completes() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let init = svc
            .init_upload("clip.mov", "video/quicktime", 1024, metadata("citra"))
            .await
            .unwrap();
        assert!(init.upload_url.contains(&init.file_id));
        assert!(init.file_name.starts_with("citra_"));

        store.complete_resumable(&init.file_id, 1024).await;

        let receipt = svc.finalize_upload(init.session_id).await.unwrap();
        assert_eq!(receipt.file_id, init.file_id);
        assert_eq!(receipt.file_size, 1024);

        let files = store.files().await;
        assert!(files.iter().any(|(_, f)| f.name.ends_with(".meta.json")));
    }

    #[tokio::test]
    async fn finalize_rejects_unknown_session() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let err = svc.finalize_upload(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StorageError::BadRequest(_)));
        assert_eq!(store.call_count().await, 0);
    }

    #[tokio::test]
    async fn finalize_rejects_expired_session() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let init = svc
            .init_upload("clip.mp4", "video/mp4", 64, metadata("dewi"))
            .await
            .unwrap();
        store.complete_resumable(&init.file_id, 64).await;
        svc.expire_session(init.session_id).await;

        let err = svc.finalize_upload(init.session_id).await.unwrap_err();
        assert!(matches!(err, StorageError::BadRequest(_)));
    }

    #[tokio::test]
    async fn finalize_rejects_incomplete_transfer() {
        let store = FakeBlobStore::new();
        let svc = service(&store);

        let init = svc
            .init_upload("clip.mp4", "video/mp4", 2048, metadata("eka"))
            .await
            .unwrap();
        // Client never streamed the bytes; size stays 0.

        let err = svc.finalize_upload(init.session_id).await.unwrap_err();
        assert!(matches!(err, StorageError::BadRequest(_)));

        // No sidecar for an incomplete upload.
        let files = store.files().await;
        assert!(!files.iter().any(|(_, f)| f.name.ends_with(".meta.json")));
    }
}
