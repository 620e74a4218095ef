use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::DeleteResponse;

#[utoipa::path(
    delete,
    path = "/assets/{filename}",
    params(
        ("filename" = String, Path, description = "Stored asset filename")
    ),
    responses(
        (status = 200, description = "Removed from at least one root", body = DeleteResponse),
        (status = 404, description = "Present in neither root")
    ),
    tag = "assets"
)]
pub async fn delete_asset(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state
        .media
        .delete_asset(&filename)
        .await
        .map_err(|e| AppError::from_media(e, state.config.expose_error_details))?;

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
        filename,
    }))
}
