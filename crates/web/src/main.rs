use anyhow::Context;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod state;

use config::Config;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::registrations::handlers::create_registration,
        features::registrations::handlers::list_registrations,
        features::registrations::handlers::registration_stats,
        features::registrations::handlers::get_registration,
        features::registrations::handlers::update_registration_status,
        features::registrations::handlers::delete_registration,
        features::uploads::handlers::upload_video,
        features::uploads::handlers::init_upload,
        features::uploads::handlers::finalize_upload,
        health,
    ),
    components(
        schemas(
            storage::dto::registration::CreateRegistrationRequest,
            storage::dto::registration::UpdateStatusRequest,
            storage::dto::registration::RegistrationResponse,
            storage::dto::registration::CategoryCount,
            storage::dto::registration::StatusBreakdown,
            storage::dto::registration::StatsResponse,
            storage::dto::upload::InitUploadRequest,
            storage::dto::upload::InitUploadResponse,
            storage::dto::upload::FinalizeUploadRequest,
            storage::dto::upload::UploadResponse,
            storage::models::ReviewStatus,
            storage::models::Registration,
        )
    ),
    tags(
        (name = "registrations", description = "Competition registration endpoints"),
        (name = "uploads", description = "Video submission endpoints"),
    )
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up"))
)]
async fn health() -> Json<Value> {
    Json(json!({ "success": true, "data": { "status": "ok" } }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting competition registration API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let state = AppState::from_config(&config);
    if !state.has_record_store() {
        tracing::warn!(
            "record store credentials missing; registration endpoints will answer not-configured"
        );
    }
    if !state.has_upload_service() {
        tracing::warn!(
            "blob store credentials missing; upload endpoints will answer not-configured"
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest(
            "/api/registrations",
            features::registrations::routes::routes(),
        )
        .nest("/api/uploads", features::uploads::routes::routes())
        .route("/api/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind server address")?;
    axum::serve(listener, app).await?;

    Ok(())
}
