use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::media::{extension_of, is_video_extension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }

    /// Declared content-type wins; the extension decides when the type is missing or generic.
    pub fn detect(content_type: Option<&str>, extension: &str) -> Self {
        let declared = content_type.and_then(|ct| ct.parse::<mime::Mime>().ok());
        match declared {
            Some(m) if m.type_() == mime::VIDEO => AssetKind::Video,
            Some(m) if m.type_() == mime::IMAGE => AssetKind::Image,
            _ if is_video_extension(extension) => AssetKind::Video,
            _ => AssetKind::Image,
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub original_name: String,
    pub content_type: Option<String>,
    /// Lowercased extension of `original_name` including the dot, or empty.
    pub extension: String,
}

impl UploadRequest {
    pub fn new(data: Bytes, original_name: impl Into<String>, content_type: Option<String>) -> Self {
        let original_name = original_name.into();
        let extension = extension_of(&original_name);
        Self {
            data,
            original_name,
            content_type,
            extension,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::detect(self.content_type.as_deref(), &self.extension)
    }
}

/// Pipeline-internal result of normalization. `extension` always describes `data`'s encoding,
/// except for passthrough where the original extension is kept as-is.
#[derive(Debug, Clone)]
pub struct NormalizedAsset {
    pub data: Bytes,
    pub extension: String,
    pub kind: AssetKind,
    pub converted: bool,
}

impl NormalizedAsset {
    pub fn passthrough(upload: &UploadRequest, kind: AssetKind) -> Self {
        Self {
            data: upload.data.clone(),
            extension: upload.extension.clone(),
            kind,
            converted: false,
        }
    }
}

/// An asset persisted in both storage roots.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub filename: String,
    pub url: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: &'static str,
}

/// Listing entry for an image in the serving root.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_content_type() {
        assert_eq!(AssetKind::detect(Some("video/mp4"), ".bin"), AssetKind::Video);
        assert_eq!(AssetKind::detect(Some("image/heic"), ".heic"), AssetKind::Image);
        assert_eq!(
            AssetKind::detect(Some("video/quicktime; codecs=avc1"), ".mov"),
            AssetKind::Video
        );
    }

    #[test]
    fn test_kind_falls_back_to_extension() {
        assert_eq!(
            AssetKind::detect(Some("application/octet-stream"), ".mov"),
            AssetKind::Video
        );
        assert_eq!(AssetKind::detect(None, ".webm"), AssetKind::Video);
        assert_eq!(AssetKind::detect(None, ".heif"), AssetKind::Image);
    }

    #[test]
    fn test_upload_request_extension() {
        let req = UploadRequest::new(Bytes::from_static(b"x"), "Holiday.JPG", None);
        assert_eq!(req.extension, ".jpg");
        assert_eq!(req.size(), 1);
    }
}
