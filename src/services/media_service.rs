use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::MediaConfig;
use crate::models::{AssetMetadata, StoredAsset, UploadRequest};
use crate::services::naming::NameAllocator;
use crate::services::normalizer::ImageNormalizer;
use crate::services::storage::{DualWriter, ObjectReader, StorageError, StorageService};
use crate::utils::media::{content_type_for, is_listable_image, is_safe_filename};
use crate::utils::validation::{ValidationError, validate_upload};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("asset '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct AssetStream {
    pub object: ObjectReader,
    pub content_type: &'static str,
}

/// Ingest pipeline plus the read, delete and list paths over the two storage roots.
pub struct MediaService {
    config: MediaConfig,
    normalizer: ImageNormalizer,
    names: NameAllocator,
    writer: DualWriter,
    serving: Arc<dyn StorageService>,
    build_assets: Arc<dyn StorageService>,
}

impl MediaService {
    pub fn new(
        config: MediaConfig,
        serving: Arc<dyn StorageService>,
        build_assets: Arc<dyn StorageService>,
    ) -> Self {
        let normalizer = ImageNormalizer::new(&config);
        Self::with_normalizer(config, serving, build_assets, normalizer)
    }

    pub fn with_normalizer(
        config: MediaConfig,
        serving: Arc<dyn StorageService>,
        build_assets: Arc<dyn StorageService>,
        normalizer: ImageNormalizer,
    ) -> Self {
        Self {
            writer: DualWriter::new(serving.clone(), build_assets.clone()),
            config,
            normalizer,
            names: NameAllocator,
            serving,
            build_assets,
        }
    }

    pub fn serving(&self) -> &Arc<dyn StorageService> {
        &self.serving
    }

    pub fn build_assets(&self) -> &Arc<dyn StorageService> {
        &self.build_assets
    }

    /// validate → normalize → allocate name → dual-write
    pub async fn ingest(&self, upload: UploadRequest) -> Result<StoredAsset, MediaError> {
        // 1. Validate (no I/O before this passes)
        let original_name = validate_upload(
            &upload.original_name,
            upload.content_type.as_deref(),
            upload.size(),
            self.config.max_file_size,
        )?;

        // 2. Normalize; never fails
        let asset = self.normalizer.normalize(&upload).await;

        // 3. Allocate a name from the final kind and extension
        let filename = self.names.allocate(asset.kind, &asset.extension);

        // 4. Persist to both roots
        self.writer.write(&filename, &asset.data).await?;

        info!(
            "📦 Stored {} {} as {} ({} bytes, converted={})",
            asset.kind,
            original_name,
            filename,
            asset.data.len(),
            asset.converted
        );

        Ok(StoredAsset {
            url: self.config.public_url(&filename),
            content_type: content_type_for(&filename),
            size: asset.data.len() as u64,
            original_name,
            filename,
        })
    }

    pub async fn open_asset(&self, filename: &str) -> Result<AssetStream, MediaError> {
        if !is_safe_filename(filename) {
            return Err(MediaError::NotFound(filename.to_string()));
        }
        let object = self
            .serving
            .open_file(filename)
            .await
            .map_err(|e| not_found_or(e, filename))?;
        Ok(AssetStream {
            object,
            content_type: content_type_for(filename),
        })
    }

    /// Removes from both roots; succeeds when at least one root held the file.
    pub async fn delete_asset(&self, filename: &str) -> Result<usize, MediaError> {
        if !is_safe_filename(filename) {
            return Err(MediaError::NotFound(filename.to_string()));
        }
        let removed = self.writer.delete(filename).await;
        if removed == 0 {
            return Err(MediaError::NotFound(filename.to_string()));
        }
        info!("🗑️  Deleted {} from {} root(s)", filename, removed);
        Ok(removed)
    }

    /// Images in the serving root, newest first.
    pub async fn list_images(&self) -> Result<Vec<AssetMetadata>, MediaError> {
        let mut images: Vec<AssetMetadata> = self
            .serving
            .list_objects()
            .await?
            .into_iter()
            .filter(|o| is_listable_image(&o.filename))
            .map(|o| AssetMetadata {
                url: self.config.public_url(&o.filename),
                filename: o.filename,
                size: o.size,
                created_at: o.created_at,
                modified_at: o.modified_at,
            })
            .collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }
}

fn not_found_or(err: StorageError, filename: &str) -> MediaError {
    match err {
        StorageError::NotFound { .. } | StorageError::InvalidFilename(_) => {
            MediaError::NotFound(filename.to_string())
        }
        other => MediaError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::LocalStorageService;
    use bytes::Bytes;
    use image::{DynamicImage, GenericImageView, ImageFormat};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn service(dir: &TempDir, max_file_size: usize) -> MediaService {
        let config = MediaConfig {
            serving_root: dir.path().join("uploads"),
            build_assets_root: dir.path().join("assets"),
            max_file_size,
            ffmpeg_path: "/nonexistent/ffmpeg".into(),
            ..MediaConfig::development()
        };
        let serving = Arc::new(LocalStorageService::new("serving", &config.serving_root));
        let build = Arc::new(LocalStorageService::new("build-assets", &config.build_assets_root));
        MediaService::new(config, serving, build)
    }

    fn jpeg(width: u32, height: u32) -> Bytes {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    #[tokio::test]
    async fn test_ingest_large_jpeg_is_bounded() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 50 * 1024 * 1024);

        let stored = media
            .ingest(UploadRequest::new(jpeg(3000, 2000), "big.jpeg", Some("image/jpeg".into())))
            .await
            .unwrap();

        assert!(stored.filename.starts_with("image-"));
        assert!(stored.filename.ends_with(".jpg"));
        assert_eq!(stored.url, format!("/assets/{}", stored.filename));
        let bytes = std::fs::read(dir.path().join("uploads").join(&stored.filename)).unwrap();
        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        let (w, h) = img.dimensions();
        assert!(w <= 1920 && h <= 1080);
        assert_eq!(
            bytes,
            std::fs::read(dir.path().join("assets").join(&stored.filename)).unwrap()
        );
    }

    #[tokio::test]
    async fn test_oversize_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 16);

        let err = media
            .ingest(UploadRequest::new(
                Bytes::from(vec![0u8; 17]),
                "clip.mp4",
                Some("video/mp4".into()),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Validation(ref e) if e.code == "FILE_TOO_LARGE"));
        assert!(!dir.path().join("uploads").exists());
        assert!(!dir.path().join("assets").exists());
    }

    #[tokio::test]
    async fn test_delete_then_open_is_not_found() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 1024);
        let stored = media
            .ingest(UploadRequest::new(
                Bytes::from_static(b"webm-bytes"),
                "loop.webm",
                Some("video/webm".into()),
            ))
            .await
            .unwrap();

        assert_eq!(media.delete_asset(&stored.filename).await.unwrap(), 2);
        assert!(matches!(
            media.open_asset(&stored.filename).await,
            Err(MediaError::NotFound(_))
        ));
        assert!(matches!(
            media.delete_asset(&stored.filename).await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unremovable_entry_is_not_found() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 1024);
        std::fs::create_dir_all(dir.path().join("uploads/image-5-5.jpg")).unwrap();

        assert!(matches!(
            media.delete_asset("image-5-5.jpg").await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_images_only() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 50 * 1024 * 1024);
        media
            .ingest(UploadRequest::new(jpeg(10, 10), "a.jpg", Some("image/jpeg".into())))
            .await
            .unwrap();
        media
            .ingest(UploadRequest::new(
                Bytes::from_static(b"mp4"),
                "b.mp4",
                Some("video/mp4".into()),
            ))
            .await
            .unwrap();

        let images = media.list_images().await.unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].filename.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_unsafe_names_are_not_found() {
        let dir = TempDir::new().unwrap();
        let media = service(&dir, 1024);
        assert!(matches!(
            media.open_asset("../Cargo.toml").await,
            Err(MediaError::NotFound(_))
        ));
        assert!(matches!(
            media.delete_asset("..").await,
            Err(MediaError::NotFound(_))
        ));
    }
}
