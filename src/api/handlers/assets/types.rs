use serde::Serialize;
use utoipa::ToSchema;

use crate::models::StoredAsset;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
}

impl From<StoredAsset> for UploadResponse {
    fn from(asset: StoredAsset) -> Self {
        Self {
            url: asset.url,
            filename: asset.filename,
            original_name: asset.original_name,
            size: asset.size,
            mimetype: asset.content_type.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub filename: String,
}
