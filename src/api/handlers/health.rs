use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub serving_root: String,
    pub build_assets_root: String,
    pub version: String,
}

fn root_status(writable: bool) -> String {
    if writable { "writable" } else { "unavailable" }.to_string()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let serving = state.media.serving().health_check().await;
    let build_assets = state.media.build_assets().health_check().await;

    Json(HealthResponse {
        status: if serving && build_assets { "ok" } else { "degraded" }.to_string(),
        serving_root: root_status(serving),
        build_assets_root: root_status(build_assets),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
