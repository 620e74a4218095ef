use image::imageops::FilterType;
use image::io::{Limits, Reader as ImageReader};
use image::{DynamicImage, GenericImageView, RgbImage};
use std::io::Cursor;

use super::{ConversionError, ConversionInput, ConversionStrategy, Converted};

/// Maximum source dimension accepted by the decoder. Guards against decompression bombs.
pub const MAX_SOURCE_DIMENSION: u32 = 16384;

/// Generic decode → bound → progressive JPEG conversion using the `image` crate.
pub struct RasterStrategy {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl RasterStrategy {
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }
}

impl ConversionStrategy for RasterStrategy {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn convert(&self, input: &ConversionInput<'_>) -> Result<Converted, ConversionError> {
        let img = decode(input.data)?;
        let img = apply_orientation(img, exif_orientation(input.data));
        let img = fit_within(img, self.max_width, self.max_height);
        let data = encode_progressive_jpeg(&img, self.quality)?;
        Ok(Converted::jpeg(data))
    }
}

pub fn decode(data: &[u8]) -> Result<DynamicImage, ConversionError> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(ConversionError::Decode("unrecognized image format".to_string()));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
    limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
    reader.limits(limits);

    reader
        .decode()
        .map_err(|e| ConversionError::Decode(e.to_string()))
}

/// Shrinks to fit the bounding box preserving aspect ratio. Never upscales.
pub fn fit_within(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_width && h <= max_height {
        return img;
    }
    img.resize(max_width, max_height, FilterType::Lanczos3)
}

/// EXIF orientation tag (1-8), if present
pub fn exif_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)
}

pub fn apply_orientation(img: DynamicImage, orientation: Option<u32>) -> DynamicImage {
    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.rotate90().fliph(),
        Some(6) => img.rotate90(),
        Some(7) => img.rotate270().fliph(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}

/// Encodes as progressive JPEG. Alpha is flattened onto white.
pub fn encode_progressive_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ConversionError> {
    let (width, height) = img.dimensions();
    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ConversionError::Dimensions { width, height }),
    };

    let rgb = flatten(img);
    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality);
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), w, h, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| ConversionError::Encode(e.to_string()))?;
    Ok(out)
}

fn flatten(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            dst[c] = ((src[c] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn is_progressive(jpeg: &[u8]) -> bool {
        // SOF2 marker
        jpeg.windows(2).any(|w| w == [0xFF, 0xC2])
    }

    #[test]
    fn test_fit_within_downscales_preserving_ratio() {
        let img = DynamicImage::new_rgb8(3000, 2000);
        let out = fit_within(img, 1920, 1080);
        assert_eq!(out.dimensions(), (1620, 1080));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let img = DynamicImage::new_rgb8(640, 480);
        assert_eq!(fit_within(img, 1920, 1080).dimensions(), (640, 480));
    }

    #[test]
    fn test_raster_converts_png_to_progressive_jpeg() {
        let png = encode(&DynamicImage::new_rgba8(2400, 600), ImageFormat::Png);
        let strategy = RasterStrategy::new(1920, 1080, 85);

        let out = strategy
            .convert(&ConversionInput {
                data: &png,
                extension: ".png",
            })
            .unwrap();

        assert_eq!(out.extension, ".jpg");
        assert!(is_progressive(&out.data));
        let decoded = image::load_from_memory_with_format(&out.data, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (1920, 480));
    }

    #[test]
    fn test_raster_rejects_garbage() {
        let strategy = RasterStrategy::new(1920, 1080, 85);
        let err = strategy
            .convert(&ConversionInput {
                data: b"definitely not an image",
                extension: ".png",
            })
            .unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
    }

    #[test]
    fn test_decode_refuses_oversized_source() {
        let png = encode(
            &DynamicImage::new_luma8(MAX_SOURCE_DIMENSION + 1, 1),
            ImageFormat::Png,
        );
        assert!(matches!(decode(&png), Err(ConversionError::Decode(_))));

        // Fails the strategy too, so the chain falls through
        let strategy = RasterStrategy::new(1920, 1080, 85);
        let err = strategy
            .convert(&ConversionInput {
                data: &png,
                extension: ".png",
            })
            .unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
    }

    #[test]
    fn test_decode_accepts_source_at_limit() {
        let png = encode(&DynamicImage::new_luma8(MAX_SOURCE_DIMENSION, 1), ImageFormat::Png);
        assert_eq!(decode(&png).unwrap().dimensions(), (MAX_SOURCE_DIMENSION, 1));
    }

    #[test]
    fn test_flatten_transparent_onto_white() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let rgb = flatten(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_apply_orientation_rotates() {
        let img = DynamicImage::new_rgb8(40, 10);
        assert_eq!(apply_orientation(img.clone(), Some(6)).dimensions(), (10, 40));
        assert_eq!(apply_orientation(img.clone(), Some(3)).dimensions(), (40, 10));
        assert_eq!(apply_orientation(img, None).dimensions(), (40, 10));
    }

    #[test]
    fn test_no_orientation_in_plain_png() {
        let png = encode(&DynamicImage::new_rgb8(4, 4), ImageFormat::Png);
        assert_eq!(exif_orientation(&png), None);
    }
}
