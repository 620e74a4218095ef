use crate::api::error::AppError;
use crate::models::AssetMetadata;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/assets",
    responses(
        (status = 200, description = "Image assets, newest first", body = [AssetMetadata])
    ),
    tag = "assets"
)]
pub async fn list_assets(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<AssetMetadata>>, AppError> {
    let images = state
        .media
        .list_images()
        .await
        .map_err(|e| AppError::from_media(e, state.config.expose_error_details))?;
    Ok(Json(images))
}
