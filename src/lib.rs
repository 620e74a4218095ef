pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::MediaConfig;
use crate::services::media_service::MediaService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Slack for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::assets::upload::upload_asset,
        api::handlers::assets::serve::serve_asset,
        api::handlers::assets::manage::delete_asset,
        api::handlers::assets::list::list_assets,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::assets::UploadResponse,
            api::handlers::assets::DeleteResponse,
            api::handlers::health::HealthResponse,
            models::AssetMetadata,
            models::AssetKind,
        )
    ),
    tags(
        (name = "assets", description = "Media upload, serving and management"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub media: Arc<MediaService>,
    pub config: MediaConfig,
}

fn cors_layer(config: &MediaConfig) -> CorsLayer {
    let origins = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::assets::upload_asset)
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
        .route("/assets", get(api::handlers::assets::list_assets))
        .route(
            "/assets/:filename",
            get(api::handlers::assets::serve_asset).delete(api::handlers::assets::delete_asset),
        )
        .layer(cors_layer(&state.config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        // Outermost, so the trace span already sees the assigned id
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
