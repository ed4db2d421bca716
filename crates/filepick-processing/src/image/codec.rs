//! Decoding and encoding of raster images.
//!
//! JPEG goes through mozjpeg and lossy WebP through libwebp; everything else uses the
//! `image` crate encoders.

use crate::error::ProcessingError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;

/// Quality used when a JPEG is written without an explicit level.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;
pub const DEFAULT_WEBP_QUALITY: f32 = 80.0;

/// Largest width/height an ICO entry can hold.
const ICO_MAX_SIDE: u32 = 256;

/// Output formats accepted by the convert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
    Ico,
}

impl TargetFormat {
    pub fn parse(s: &str) -> Result<Self, ProcessingError> {
        match s.trim().to_uppercase().as_str() {
            "JPG" | "JPEG" => Ok(TargetFormat::Jpeg),
            "PNG" => Ok(TargetFormat::Png),
            "WEBP" => Ok(TargetFormat::Webp),
            "BMP" => Ok(TargetFormat::Bmp),
            "TIFF" => Ok(TargetFormat::Tiff),
            "ICO" => Ok(TargetFormat::Ico),
            _ => Err(ProcessingError::UnsupportedFormat(format!(
                "'{}' (expected one of JPG, PNG, WEBP, BMP, TIFF, ICO)",
                s.trim()
            ))),
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Webp => ImageFormat::WebP,
            TargetFormat::Bmp => ImageFormat::Bmp,
            TargetFormat::Tiff => ImageFormat::Tiff,
            TargetFormat::Ico => ImageFormat::Ico,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Bmp => "bmp",
            TargetFormat::Tiff => "tiff",
            TargetFormat::Ico => "ico",
        }
    }

    pub fn mime_type(self) -> &'static str {
        self.image_format().to_mime_type()
    }
}

/// Decode an uploaded byte stream, guessing the format from its signature.
pub fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Encode `img` in `format` with default quality settings.
pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ProcessingError> {
    match format {
        ImageFormat::Jpeg => encode_jpeg(img, DEFAULT_JPEG_QUALITY),
        ImageFormat::WebP => Ok(encode_webp(img, DEFAULT_WEBP_QUALITY)),
        _ => {
            let img = eight_bit(img, format);
            let (width, height) = img.dimensions();
            let mut buffer = Vec::with_capacity(width as usize * height as usize * 3);
            img.write_to(&mut Cursor::new(&mut buffer), format)?;
            Ok(buffer)
        }
    }
}

/// Compress to JPEG using mozjpeg
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::Encode("image has no pixels".to_string()));
    }

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(&rgb_img)?;
    let jpeg_data = comp.finish()?;

    Ok(jpeg_data)
}

/// Lossy WebP; the alpha channel is kept when the image has one.
pub fn encode_webp(img: &DynamicImage, quality: f32) -> Vec<u8> {
    let (width, height) = img.dimensions();
    if img.color().has_alpha() {
        let rgba_img = img.to_rgba8();
        webp::Encoder::from_rgba(&rgba_img, width, height)
            .encode(quality)
            .to_vec()
    } else {
        let rgb_img = img.to_rgb8();
        webp::Encoder::from_rgb(&rgb_img, width, height)
            .encode(quality)
            .to_vec()
    }
}

/// Re-encode for the convert operation: alpha is dropped, ICO output is fitted into 256x256.
///
/// ICO entries are written as opaque RGBA, the only PNG layout icon readers accept.
pub fn reencode(img: &DynamicImage, target: TargetFormat) -> Result<Vec<u8>, ProcessingError> {
    let mut rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    if target == TargetFormat::Ico {
        let (width, height) = rgb.dimensions();
        if width > ICO_MAX_SIDE || height > ICO_MAX_SIDE {
            rgb = rgb.resize(ICO_MAX_SIDE, ICO_MAX_SIDE, FilterType::CatmullRom);
        }
        let icon = DynamicImage::ImageRgba8(rgb.to_rgba8());
        return encode(&icon, target.image_format());
    }

    encode(&rgb, target.image_format())
}

/// Encoders other than PNG and TIFF only take 8-bit buffers.
fn eight_bit(img: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    let native = matches!(
        img,
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)
    );
    let wide_ok = matches!(format, ImageFormat::Png | ImageFormat::Tiff)
        && matches!(
            img,
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_)
        );

    if native || wide_ok {
        Cow::Borrowed(img)
    } else if img.color().has_alpha() {
        Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8()))
    } else {
        Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8()))
    }
}
