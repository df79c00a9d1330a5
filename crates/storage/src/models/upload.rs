use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attributes of a file object as reported by the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub web_view_link: Option<String>,
}

/// Submission context recorded alongside a video, both in the metadata
/// sidecar and in the session registry for two-phase uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub username: String,
    pub phone: String,
    pub link: String,
    pub follow_proof: String,
    pub unit: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Result of a completed upload, sidecar included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadReceipt {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub web_view_link: Option<String>,
    pub metadata_file_id: String,
}

/// State held between `init` and `finalize` of a two-phase upload. The client
/// streams bytes to the session URL on its own; `finalize` validates against
/// this record instead of trusting caller-supplied ids.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub session_id: Uuid,
    pub file_id: String,
    pub file_name: String,
    /// Folder the file was reserved in; the sidecar goes next to it.
    pub parent_folder: String,
    pub expected_size: u64,
    pub owner: String,
    pub metadata: UploadMetadata,
    pub expires_at: DateTime<Utc>,
}
