use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handlers::{
    create_registration, delete_registration, get_registration, list_registrations,
    registration_stats, update_registration_status,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_registration))
        .route("/", get(list_registrations))
        .route("/stats", get(registration_stats))
        .route("/:id", get(get_registration))
        .route("/:id", put(update_registration_status))
        .route("/:id", delete(delete_registration))
}
