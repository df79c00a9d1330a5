use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use storage::dto::registration::{
    CreateRegistrationRequest, RegistrationResponse, UpdateStatusRequest,
};
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Restrict the listing to one competition category.
    pub category: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/registrations",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created with pending status and today's date"),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Record store unavailable or not configured")
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(state): State<AppState>,
    Json(req): Json<CreateRegistrationRequest>,
) -> Result<Response, WebError> {
    let store = state.records()?;
    req.validate()?;

    let registration = services::create_registration(store.as_ref(), &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": RegistrationResponse::from(registration)
        })),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/registrations",
    params(ListParams),
    responses(
        (status = 200, description = "All registrations, optionally filtered by category")
    ),
    tag = "registrations"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, WebError> {
    let store = state.records()?;

    let registrations =
        services::list_registrations(store.as_ref(), params.category.as_deref()).await?;
    let response: Vec<RegistrationResponse> = registrations
        .into_iter()
        .map(RegistrationResponse::from)
        .collect();

    Ok(Json(json!({ "success": true, "data": response })).into_response())
}

#[utoipa::path(
    get,
    path = "/api/registrations/stats",
    responses(
        (status = 200, description = "Per-category and per-status registration counts")
    ),
    tag = "registrations"
)]
pub async fn registration_stats(State(state): State<AppState>) -> Result<Response, WebError> {
    let store = state.records()?;

    let stats = services::registration_stats(store.as_ref()).await?;

    Ok(Json(json!({ "success": true, "data": stats })).into_response())
}

#[utoipa::path(
    get,
    path = "/api/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    responses(
        (status = 200, description = "Registration found"),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let store = state.records()?;

    let registration = services::get_registration(store.as_ref(), id).await?;

    Ok(Json(json!({
        "success": true,
        "data": RegistrationResponse::from(registration)
    }))
    .into_response())
}

#[utoipa::path(
    put,
    path = "/api/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status and note updated"),
        (status = 400, description = "Status outside pending/approved/rejected"),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn update_registration_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Response, WebError> {
    let store = state.records()?;
    req.validate()?;

    let registration = services::update_status(store.as_ref(), id, &req).await?;

    Ok(Json(json!({
        "success": true,
        "data": RegistrationResponse::from(registration)
    }))
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration id")),
    responses(
        (status = 200, description = "Registration deleted"),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let store = state.records()?;

    services::delete_registration(store.as_ref(), id).await?;

    Ok(Json(json!({ "success": true })).into_response())
}
