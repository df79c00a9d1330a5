use bytes::Bytes;
use chrono::Utc;
use storage::dto::upload::InitUploadRequest;
use storage::error::Result;
use storage::models::{UploadMetadata, UploadReceipt};
use storage::services::UploadService;
use storage::services::upload::InitiatedUpload;
use uuid::Uuid;

/// Single-shot upload: the payload was buffered by the handler.
pub async fn upload_video(
    service: &UploadService,
    content: Bytes,
    original_name: &str,
    mime_type: &str,
    metadata: UploadMetadata,
) -> Result<UploadReceipt> {
    service
        .upload_video(content, original_name, mime_type, metadata)
        .await
}

pub async fn init_upload(
    service: &UploadService,
    request: &InitUploadRequest,
) -> Result<InitiatedUpload> {
    let metadata = UploadMetadata {
        username: request.username.clone(),
        phone: request.phone.clone(),
        link: request.link.clone(),
        follow_proof: request.follow_proof.clone(),
        unit: request.unit.clone(),
        uploaded_at: Utc::now(),
    };
    service
        .init_upload(&request.filename, &request.mime_type, request.size, metadata)
        .await
}

pub async fn finalize_upload(service: &UploadService, session_id: Uuid) -> Result<UploadReceipt> {
    service.finalize_upload(session_id).await
}
