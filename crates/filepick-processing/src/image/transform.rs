//! Geometry and re-encoding transforms: resize, quality compression, EXIF stripping.

use crate::error::ProcessingError;
use crate::image::codec;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Pixel};
use std::path::Path;

/// Extensions the compress operation accepts
pub const COMPRESSIBLE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Quality presets for JPEG recompression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl QualityLevel {
    /// Unrecognized or missing values fall back to medium.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("high") => QualityLevel::High,
            Some("low") => QualityLevel::Low,
            _ => QualityLevel::Medium,
        }
    }

    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityLevel::High => 85,
            QualityLevel::Medium => 65,
            QualityLevel::Low => 40,
        }
    }
}

/// Scale to exactly `width` x `height`, ignoring the source aspect ratio.
pub fn resize(
    img: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ProcessingError> {
    if width == 0 || height == 0 {
        return Err(ProcessingError::InvalidDimension(format!(
            "{}x{} (width and height must be greater than zero)",
            width, height
        )));
    }

    Ok(img.resize_exact(width, height, FilterType::CatmullRom))
}

/// Lower-cased extension of an uploaded file name, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub fn ensure_compressible(filename: &str) -> Result<(), ProcessingError> {
    match file_extension(filename) {
        Some(ext) if COMPRESSIBLE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ProcessingError::UnsupportedInputType(format!(
            ".{} (compress accepts .jpg, .jpeg, .png, .webp)",
            ext
        ))),
        None => Err(ProcessingError::UnsupportedInputType(format!(
            "'{}' has no file extension",
            filename
        ))),
    }
}

/// Recompress as JPEG at the preset's quality.
pub fn compress(img: &DynamicImage, quality: QualityLevel) -> Result<Vec<u8>, ProcessingError> {
    codec::encode_jpeg(img, quality.jpeg_quality())
}

/// Result of stripping metadata from an image
#[derive(Debug)]
pub struct CleanImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// Copy the pixels into a fresh buffer and encode it in the source format.
///
/// Nothing but the pixel data survives, so EXIF, XMP and ICC segments are all dropped.
pub fn strip_exif(data: &[u8]) -> Result<CleanImage, ProcessingError> {
    let format = image::guess_format(data)?;
    let img = image::load_from_memory_with_format(data, format)?;
    let (width, height) = img.dimensions();

    let fresh = match img {
        DynamicImage::ImageLuma8(buf) => rebuild(buf).map(DynamicImage::ImageLuma8),
        DynamicImage::ImageLumaA8(buf) => rebuild(buf).map(DynamicImage::ImageLumaA8),
        DynamicImage::ImageRgb8(buf) => rebuild(buf).map(DynamicImage::ImageRgb8),
        DynamicImage::ImageRgba8(buf) => rebuild(buf).map(DynamicImage::ImageRgba8),
        DynamicImage::ImageRgb16(buf) => rebuild(buf).map(DynamicImage::ImageRgb16),
        DynamicImage::ImageRgba16(buf) => rebuild(buf).map(DynamicImage::ImageRgba16),
        other => rebuild(other.to_rgba8()).map(DynamicImage::ImageRgba8),
    }
    .ok_or_else(|| {
        ProcessingError::Encode(format!("pixel buffer does not match {}x{}", width, height))
    })?;

    Ok(CleanImage {
        data: codec::encode(&fresh, format)?,
        format,
    })
}

fn rebuild<P: Pixel>(
    buf: ImageBuffer<P, Vec<P::Subpixel>>,
) -> Option<ImageBuffer<P, Vec<P::Subpixel>>> {
    let (width, height) = buf.dimensions();
    ImageBuffer::from_raw(width, height, buf.into_raw())
}
