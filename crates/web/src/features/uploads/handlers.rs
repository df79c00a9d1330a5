use axum::{
    Json,
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use storage::dto::upload::{
    FinalizeUploadRequest, InitUploadRequest, InitUploadResponse, UploadResponse,
};
use storage::models::UploadMetadata;
use storage::services::UploadService;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

/// The file part plus the text fields of a multipart submission, as parsed
/// off the wire before any validation.
#[derive(Default)]
struct SubmissionForm {
    file: Option<(Bytes, String, String)>,
    username: Option<String>,
    phone: Option<String>,
    link: Option<String>,
    follow_proof: Option<String>,
    unit: Option<String>,
}

async fn parse_form(mut multipart: Multipart) -> Result<SubmissionForm, WebError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            let file_name = field.file_name().unwrap_or("video").to_string();
            let mime_type = field.content_type().unwrap_or_default().to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| WebError::BadRequest(format!("failed to read file part: {}", e)))?;
            form.file = Some((content, file_name, mime_type));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| WebError::BadRequest(format!("failed to read field '{}': {}", name, e)))?;
        match name.as_str() {
            "username" => form.username = Some(value),
            "phone" => form.phone = Some(value),
            "link" => form.link = Some(value),
            "follow_proof" => form.follow_proof = Some(value),
            "unit" => form.unit = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

fn require_field(value: Option<String>, name: &str) -> Result<String, WebError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WebError::BadRequest(format!(
            "missing required field: {}",
            name
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    responses(
        (status = 200, description = "Video stored with its metadata sidecar"),
        (status = 400, description = "Missing file, disallowed type, oversize payload or missing fields"),
        (status = 500, description = "Blob store unavailable or not configured")
    ),
    tag = "uploads"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let uploads = state.uploads()?;
    let form = parse_form(multipart).await?;

    // Validation order: file present, then type, then size, then the
    // required text fields. Each failure short-circuits before any remote
    // call is made.
    let (content, original_name, mime_type) = form
        .file
        .ok_or_else(|| WebError::BadRequest("video file is required".to_string()))?;
    UploadService::validate_video(&mime_type, content.len() as u64)?;

    let metadata = UploadMetadata {
        username: require_field(form.username, "username")?,
        phone: require_field(form.phone, "phone")?,
        link: require_field(form.link, "link")?,
        follow_proof: require_field(form.follow_proof, "follow_proof")?,
        unit: form.unit.filter(|u| !u.trim().is_empty()),
        uploaded_at: Utc::now(),
    };

    let receipt =
        services::upload_video(&uploads, content, &original_name, &mime_type, metadata).await?;

    Ok(Json(json!({
        "success": true,
        "data": UploadResponse::from(receipt)
    }))
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/uploads/init",
    request_body = InitUploadRequest,
    responses(
        (status = 200, description = "Upload session opened; client streams bytes to the returned URL"),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Blob store unavailable or not configured")
    ),
    tag = "uploads"
)]
pub async fn init_upload(
    State(state): State<AppState>,
    Json(req): Json<InitUploadRequest>,
) -> Result<Response, WebError> {
    let uploads = state.uploads()?;
    req.validate()?;

    let initiated = services::init_upload(&uploads, &req).await?;

    Ok(Json(json!({
        "success": true,
        "data": InitUploadResponse::from(initiated)
    }))
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/uploads/finalize",
    request_body = FinalizeUploadRequest,
    responses(
        (status = 200, description = "Session verified, sidecar written"),
        (status = 400, description = "Unknown, expired or incomplete session"),
        (status = 500, description = "Blob store unavailable or not configured")
    ),
    tag = "uploads"
)]
pub async fn finalize_upload(
    State(state): State<AppState>,
    Json(req): Json<FinalizeUploadRequest>,
) -> Result<Response, WebError> {
    let uploads = state.uploads()?;

    let receipt = services::finalize_upload(&uploads, req.session_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": UploadResponse::from(receipt)
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use storage::blob_store::fake::FakeBlobStore;
    use storage::services::UploadService;
    use tower::ServiceExt;

    use super::super::routes;
    use crate::state::AppState;

    const BOUNDARY: &str = "form-test-boundary";

    fn app(store: &FakeBlobStore) -> Router {
        let service = UploadService::new(Arc::new(store.clone()), "root-folder".to_string());
        let state = AppState::new(None, Some(Arc::new(service)));
        Router::new()
            .nest("/api/uploads", routes::routes())
            .with_state(state)
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn multipart_request(mime: &str, payload: &str, with_fields: bool) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.mp4\"\r\nContent-Type: {mime}\r\n\r\n{payload}\r\n"
        );
        if with_fields {
            body.push_str(&text_part("username", "andi"));
            body.push_str(&text_part("phone", "081111111111"));
            body.push_str(&text_part("link", "https://videos.example/clip"));
            body.push_str(&text_part("follow_proof", "https://social.example/proof"));
            body.push_str(&text_part("unit", "Unit X"));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/uploads")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_succeeds_and_reports_the_stored_file() {
        let store = FakeBlobStore::new();
        let response = app(&store)
            .oneshot(multipart_request("video/mp4", "video bytes", true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(
            body["data"]["fileName"]
                .as_str()
                .unwrap()
                .starts_with("andi_")
        );
        assert!(body["data"]["fileId"].as_str().is_some());

        let files = store.files().await;
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn disallowed_mime_is_rejected_before_any_remote_call() {
        let store = FakeBlobStore::new();
        let response = app(&store)
            .oneshot(multipart_request("image/png", "png bytes", true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("invalid file type"));
        assert_eq!(store.call_count().await, 0);
    }

    #[tokio::test]
    async fn missing_text_fields_are_rejected() {
        let store = FakeBlobStore::new();
        let response = app(&store)
            .oneshot(multipart_request("video/mp4", "video bytes", false))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("missing required field")
        );
        assert_eq!(store.call_count().await, 0);
    }

    #[tokio::test]
    async fn two_phase_flow_over_http() {
        let store = FakeBlobStore::new();
        let app = app(&store);

        let init = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads/init")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "filename": "clip.mov",
                            "mimeType": "video/quicktime",
                            "size": 512,
                            "username": "citra",
                            "phone": "082222222222",
                            "link": "https://videos.example/clip",
                            "followProof": "https://social.example/proof"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(init.status(), StatusCode::OK);
        let init_body = body_json(init).await;
        let session_id = init_body["data"]["sessionId"].as_str().unwrap().to_string();
        let file_id = init_body["data"]["fileId"].as_str().unwrap().to_string();

        store.complete_resumable(&file_id, 512).await;

        let finalize = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads/finalize")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "sessionId": session_id }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(finalize.status(), StatusCode::OK);
        let body = body_json(finalize).await;
        assert_eq!(body["data"]["fileId"], file_id);
        assert_eq!(body["data"]["fileSize"], 512);
    }

    #[tokio::test]
    async fn unconfigured_blob_store_yields_server_error() {
        let state = AppState::new(None, None);
        let app = Router::new()
            .nest("/api/uploads", routes::routes())
            .with_state(state);

        let response = app
            .oneshot(multipart_request("video/mp4", "video bytes", true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }
}
