use axum::{Router, extract::DefaultBodyLimit, routing::post};
use storage::services::upload::MAX_UPLOAD_BYTES;

use super::handlers::{finalize_upload, init_upload, upload_video};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // Allow the full video ceiling plus multipart framing overhead; the
    // handler enforces the exact ceiling itself.
    let body_limit = (MAX_UPLOAD_BYTES as usize) + 1024 * 1024;

    Router::new()
        .route("/", post(upload_video))
        .route("/init", post(init_upload))
        .route("/finalize", post(finalize_upload))
        .layer(DefaultBodyLimit::max(body_limit))
}
