use crate::api::error::AppError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

#[utoipa::path(
    get,
    path = "/assets/{filename}",
    params(
        ("filename" = String, Path, description = "Stored asset filename")
    ),
    responses(
        (status = 200, description = "Asset bytes"),
        (status = 404, description = "Asset not found")
    ),
    tag = "assets"
)]
pub async fn serve_asset(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let asset = state
        .media
        .open_asset(&filename)
        .await
        .map_err(|e| AppError::from_media(e, state.config.expose_error_details))?;

    let body = Body::from_stream(ReaderStream::new(asset.object.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.content_type)
        .header(header::CONTENT_LENGTH, asset.object.size)
        // Freshness over caching: assets can be replaced or deleted at any time
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build asset response: {}", e)))
}
