//! Image normalization.
//!
//! Images are run through an ordered chain of [`ConversionStrategy`]s; the first
//! strategy that produces bytes wins. When every strategy fails, or the chain
//! overruns its time budget, the original bytes are kept unchanged. Videos are
//! never converted.

pub mod heif;
pub mod raster;

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MediaConfig;
use crate::models::{AssetKind, NormalizedAsset, UploadRequest};
use crate::utils::media::{is_heif_extension, looks_like_heif};

pub use heif::HeifDecoderStrategy;
pub use raster::RasterStrategy;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("unsupported output dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },

    #[error("external decoder failed: {0}")]
    External(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ConversionInput<'a> {
    pub data: &'a [u8],
    /// Original lowercased extension including the dot
    pub extension: &'a str,
}

#[derive(Debug)]
pub struct Converted {
    pub data: Vec<u8>,
    pub extension: &'static str,
}

impl Converted {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            extension: ".jpg",
        }
    }
}

/// One step of the fallback chain. CPU-bound; called from the blocking pool.
pub trait ConversionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn convert(&self, input: &ConversionInput<'_>) -> Result<Converted, ConversionError>;
}

pub type StrategyChain = Arc<Vec<Box<dyn ConversionStrategy>>>;

/// Runs strategies in order, logging each failure. `None` when all of them failed.
pub fn run_chain(chain: &[Box<dyn ConversionStrategy>], input: &ConversionInput<'_>) -> Option<Converted> {
    for strategy in chain {
        match strategy.convert(input) {
            Ok(converted) => {
                info!(
                    "🖼️  {} converted {} ({} bytes) to {} ({} bytes)",
                    strategy.name(),
                    input.extension,
                    input.data.len(),
                    converted.extension,
                    converted.data.len()
                );
                return Some(converted);
            }
            Err(e) => {
                warn!("{} conversion failed, trying next: {}", strategy.name(), e);
            }
        }
    }
    None
}

pub struct ImageNormalizer {
    standard: StrategyChain,
    heif: StrategyChain,
    timeout: Duration,
}

impl ImageNormalizer {
    /// Standard chain: raster at `jpeg_quality`.
    /// HEIF chain: dedicated decoder, then raster, both at `heif_quality`.
    pub fn new(config: &MediaConfig) -> Self {
        let standard: Vec<Box<dyn ConversionStrategy>> = vec![Box::new(RasterStrategy::new(
            config.max_width,
            config.max_height,
            config.jpeg_quality,
        ))];
        let heif: Vec<Box<dyn ConversionStrategy>> = vec![
            Box::new(HeifDecoderStrategy::new(
                config.ffmpeg_path.clone(),
                config.heif_quality,
            )),
            Box::new(RasterStrategy::new(
                config.max_width,
                config.max_height,
                config.heif_quality,
            )),
        ];
        Self::with_chains(standard, heif, config.conversion_timeout())
    }

    pub fn with_chains(
        standard: Vec<Box<dyn ConversionStrategy>>,
        heif: Vec<Box<dyn ConversionStrategy>>,
        timeout: Duration,
    ) -> Self {
        Self {
            standard: Arc::new(standard),
            heif: Arc::new(heif),
            timeout,
        }
    }

    fn chain_for(&self, upload: &UploadRequest) -> StrategyChain {
        if is_heif_extension(&upload.extension) || looks_like_heif(&upload.data) {
            self.heif.clone()
        } else {
            self.standard.clone()
        }
    }

    /// Never fails: the worst case is the original bytes under the original extension.
    pub async fn normalize(&self, upload: &UploadRequest) -> NormalizedAsset {
        let kind = upload.kind();
        if kind == AssetKind::Video {
            return NormalizedAsset::passthrough(upload, kind);
        }

        let chain = self.chain_for(upload);
        let data = upload.data.clone();
        let extension = upload.extension.clone();
        let task = tokio::task::spawn_blocking(move || {
            run_chain(
                &chain,
                &ConversionInput {
                    data: &data,
                    extension: &extension,
                },
            )
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Some(converted))) => NormalizedAsset {
                data: Bytes::from(converted.data),
                extension: converted.extension.to_string(),
                kind,
                converted: true,
            },
            Ok(Ok(None)) => {
                warn!(
                    "All conversions failed for '{}', storing original bytes",
                    upload.original_name
                );
                NormalizedAsset::passthrough(upload, kind)
            }
            Ok(Err(e)) => {
                warn!(
                    "Conversion task for '{}' aborted ({}), storing original bytes",
                    upload.original_name, e
                );
                NormalizedAsset::passthrough(upload, kind)
            }
            Err(_) => {
                warn!(
                    "Conversion of '{}' exceeded {:?}, storing original bytes",
                    upload.original_name, self.timeout
                );
                NormalizedAsset::passthrough(upload, kind)
            }
        }
    }
}
