use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::UploadReceipt;
use crate::services::upload::InitiatedUpload;

/// Request payload for opening a two-phase upload. The file bytes are not in
/// this request; the client streams them to the returned session URL.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadRequest {
    #[validate(length(min = 1, max = 255, message = "Filename is required"))]
    pub filename: String,

    #[validate(length(min = 1, max = 100, message = "Mime type is required"))]
    pub mime_type: String,

    /// Declared size in bytes, verified again at finalize.
    pub size: u64,

    #[validate(length(min = 1, max = 100, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 6, max = 20, message = "Phone number is required"))]
    pub phone: String,

    #[validate(length(min = 1, max = 500, message = "Link is required"))]
    pub link: String,

    #[validate(length(min = 1, max = 500, message = "Follow proof is required"))]
    pub follow_proof: String,

    #[validate(length(max = 255))]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadResponse {
    pub session_id: Uuid,
    pub upload_url: String,
    pub file_id: String,
    pub file_name: String,
}

impl From<InitiatedUpload> for InitUploadResponse {
    fn from(init: InitiatedUpload) -> Self {
        Self {
            session_id: init.session_id,
            upload_url: init.upload_url,
            file_id: init.file_id,
            file_name: init.file_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeUploadRequest {
    pub session_id: Uuid,
}

/// Response for a completed upload, single-shot or two-phase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub web_view_link: Option<String>,
    pub metadata_file_id: String,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            file_id: receipt.file_id,
            file_name: receipt.file_name,
            file_size: receipt.file_size,
            web_view_link: receipt.web_view_link,
            metadata_file_id: receipt.metadata_file_id,
        }
    }
}
