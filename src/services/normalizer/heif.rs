use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::error;

use super::raster::{decode, encode_progressive_jpeg};
use super::{ConversionError, ConversionInput, ConversionStrategy, Converted};

/// Dedicated HEIC/HEIF decoder. `image` cannot read HEIF containers, so the first
/// frame is extracted by ffmpeg into a lossless PNG and re-encoded as JPEG.
pub struct HeifDecoderStrategy {
    ffmpeg_path: PathBuf,
    quality: u8,
}

impl HeifDecoderStrategy {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            quality,
        }
    }
}

impl ConversionStrategy for HeifDecoderStrategy {
    fn name(&self) -> &'static str {
        "heif-decoder"
    }

    fn convert(&self, input: &ConversionInput<'_>) -> Result<Converted, ConversionError> {
        // Write HEIF data to a temp file; ffmpeg needs a seekable input
        let suffix = if input.extension.is_empty() {
            ".heic"
        } else {
            input.extension
        };
        let mut input_file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        input_file.write_all(input.data)?;
        let input_path = input_file.into_temp_path();

        let output_file = NamedTempFile::with_suffix(".png")?;
        let output_path = output_file.path().to_path_buf();

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y") // Overwrite output
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input_path.as_os_str())
            .arg("-frames:v")
            .arg("1")
            .arg(&output_path)
            .output()
            .map_err(|e| {
                ConversionError::External(format!(
                    "failed to spawn {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg failed on HEIC/HEIF: {}", err_msg.trim());
            return Err(ConversionError::External(format!(
                "ffmpeg exited with {}",
                output.status
            )));
        }

        let png_data = std::fs::read(&output_path)?;
        let img = decode(&png_data)?;
        let data = encode_progressive_jpeg(&img, self.quality)?;
        Ok(Converted::jpeg(data))
    }
}
