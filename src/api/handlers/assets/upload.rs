use crate::api::error::AppError;
use crate::models::UploadRequest;
use crate::utils::validation::{
    file_too_large, validate_file_count, validate_file_size, validate_media_type,
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use bytes::BytesMut;

use super::types::*;

fn multipart_error(e: MultipartError, max_size: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // Body limit hit before the field was fully read
        file_too_large(max_size).into()
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Vec<u8>, description = "Single image or video in the `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Invalid type, oversize, or wrong file count"),
        (status = 500, description = "Storage failure")
    ),
    tag = "assets"
)]
pub async fn upload_asset(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_size = state.config.max_file_size;

    // Use a result to capture errors so we can consume the multipart stream if needed
    let result: Result<Json<UploadResponse>, AppError> = async {
        let mut upload: Option<UploadRequest> = None;
        let mut file_count = 0;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_size))?
        {
            let is_file = field.file_name().is_some() || field.name() == Some("file");
            if !is_file {
                continue;
            }

            file_count += 1;
            validate_file_count(file_count)?;

            let original_filename = field.file_name().unwrap_or("unnamed").to_string();
            let content_type = field.content_type().map(|s| s.to_string());

            // 1. Reject bad types before buffering anything
            validate_media_type(&original_filename, content_type.as_deref())?;

            // 2. Buffer with a running size check
            let mut buffer = BytesMut::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| multipart_error(e, max_size))?
            {
                validate_file_size(buffer.len() + chunk.len(), max_size)?;
                buffer.extend_from_slice(&chunk);
            }

            upload = Some(UploadRequest::new(
                buffer.freeze(),
                original_filename,
                content_type,
            ));
        }

        validate_file_count(file_count)?;
        let upload = upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

        // 3. Run the pipeline
        let stored = state
            .media
            .ingest(upload)
            .await
            .map_err(|e| AppError::from_media(e, state.config.expose_error_details))?;

        Ok(Json(UploadResponse::from(stored)))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Consume the remaining multipart stream to avoid a TCP reset on early rejection
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
