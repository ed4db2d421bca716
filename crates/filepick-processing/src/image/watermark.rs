//! Text and image watermarks
//!
//! The watermark is drawn onto a transparent layer the size of the base image, the layer
//! is alpha-composited over the base and the result is flattened to RGB.

use crate::error::ProcessingError;
use crate::image::bitmap_font;
use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fmt;
use std::path::Path;

/// Distance from the edges for edge-anchored positions
const MARGIN: i64 = 10;

/// Text height relative to the shorter side of the base image
const TEXT_SCALE: f64 = 0.05;

/// Overlay size relative to each side of the base image
const OVERLAY_SCALE: f64 = 0.25;

pub const DEFAULT_TEXT: &str = "FilePick";
pub const DEFAULT_OPACITY: u8 = 128;

/// Watermark position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl WatermarkPosition {
    /// Unknown names resolve to top-left.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "top-left" => WatermarkPosition::TopLeft,
            "top-right" => WatermarkPosition::TopRight,
            "bottom-left" => WatermarkPosition::BottomLeft,
            "bottom-right" => WatermarkPosition::BottomRight,
            "center" => WatermarkPosition::Center,
            _ => WatermarkPosition::TopLeft,
        }
    }

    /// Top-left corner of an overlay of size `overlay` on a base of size `base`.
    ///
    /// Negative coordinates are possible when the overlay is larger than the base.
    pub fn anchor(self, base: (u32, u32), overlay: (u32, u32)) -> (i64, i64) {
        let (bx, by) = (base.0 as i64, base.1 as i64);
        let (wx, wy) = (overlay.0 as i64, overlay.1 as i64);
        match self {
            WatermarkPosition::TopLeft => (MARGIN, MARGIN),
            WatermarkPosition::TopRight => (bx - wx - MARGIN, MARGIN),
            WatermarkPosition::BottomLeft => (MARGIN, by - wy - MARGIN),
            WatermarkPosition::BottomRight => (bx - wx - MARGIN, by - wy - MARGIN),
            WatermarkPosition::Center => ((bx - wx).div_euclid(2), (by - wy).div_euclid(2)),
        }
    }
}

/// Font used for text watermarks
pub enum WatermarkFont {
    Scalable(FontVec),
    /// Fixed-size 5x7 glyphs, independent of the requested size
    Bitmap,
}

impl fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkFont::Scalable(_) => f.write_str("WatermarkFont::Scalable"),
            WatermarkFont::Bitmap => f.write_str("WatermarkFont::Bitmap"),
        }
    }
}

impl WatermarkFont {
    /// Load a TrueType/OpenType font, falling back to the bitmap font when `path` is
    /// unset or the file cannot be used.
    pub fn from_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return WatermarkFont::Bitmap;
        };

        let loaded = std::fs::read(path)
            .map_err(ProcessingError::from)
            .and_then(Self::from_bytes);

        match loaded {
            Ok(font) => {
                tracing::info!(path = %path.display(), "Loaded watermark font");
                font
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Watermark font unavailable, using bitmap font"
                );
                WatermarkFont::Bitmap
            }
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ProcessingError> {
        FontVec::try_from_vec(data)
            .map(WatermarkFont::Scalable)
            .map_err(|e| ProcessingError::invalid("watermark font", e.to_string()))
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, WatermarkFont::Scalable(_))
    }

    fn text_size(&self, px: f32, text: &str) -> (u32, u32) {
        match self {
            WatermarkFont::Scalable(font) => text_size(PxScale::from(px), font, text),
            WatermarkFont::Bitmap => bitmap_font::text_size(text),
        }
    }

    fn draw(&self, layer: &mut RgbaImage, color: Rgba<u8>, at: (i64, i64), px: f32, text: &str) {
        match self {
            WatermarkFont::Scalable(font) => {
                let x = at.0.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                let y = at.1.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                draw_text_mut(layer, color, x, y, PxScale::from(px), font, text);
            }
            WatermarkFont::Bitmap => bitmap_font::draw(layer, color, at.0, at.1, text),
        }
    }
}

/// What gets drawn on the layer
#[derive(Debug, Clone)]
pub enum WatermarkContent {
    Text(String),
    /// `None` when the overlay was missing or could not be decoded
    Image(Option<RgbaImage>),
}

#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub content: WatermarkContent,
    pub opacity: u8,
    pub position: WatermarkPosition,
}

/// Composite the watermark described by `mark` onto `base`.
pub fn composite(base: &DynamicImage, mark: &WatermarkSpec, font: &WatermarkFont) -> RgbImage {
    let mut canvas = base.to_rgba8();
    let (bx, by) = canvas.dimensions();
    let mut layer = RgbaImage::new(bx, by);

    match &mark.content {
        WatermarkContent::Text(text) => {
            let px = ((bx.min(by) as f64 * TEXT_SCALE) as u32).max(1) as f32;
            let size = font.text_size(px, text);
            let at = mark.position.anchor((bx, by), size);
            font.draw(&mut layer, Rgba([0, 0, 0, mark.opacity]), at, px, text);
        }
        WatermarkContent::Image(Some(overlay)) => {
            let wx = (bx as f64 * OVERLAY_SCALE) as u32;
            let wy = (by as f64 * OVERLAY_SCALE) as u32;
            if wx == 0 || wy == 0 {
                tracing::warn!(
                    width = bx,
                    height = by,
                    "Base image too small for an image watermark"
                );
            } else {
                let mut scaled = imageops::resize(overlay, wx, wy, FilterType::CatmullRom);
                apply_opacity(&mut scaled, mark.opacity);
                let (x, y) = mark.position.anchor((bx, by), (wx, wy));
                imageops::replace(&mut layer, &scaled, x, y);
            }
        }
        WatermarkContent::Image(None) => {
            tracing::warn!("No usable watermark image, leaving image unmarked");
        }
    }

    imageops::overlay(&mut canvas, &layer, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Scale existing alpha by `opacity / 255`; full opacity makes the overlay opaque.
fn apply_opacity(overlay: &mut RgbaImage, opacity: u8) {
    for pixel in overlay.pixels_mut() {
        pixel[3] = if opacity == u8::MAX {
            u8::MAX
        } else {
            (pixel[3] as u32 * opacity as u32 / 255) as u8
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    fn image_spec(overlay: Option<RgbaImage>, opacity: u8) -> WatermarkSpec {
        WatermarkSpec {
            content: WatermarkContent::Image(overlay),
            opacity,
            position: WatermarkPosition::TopLeft,
        }
    }

    #[test]
    fn test_anchor_positions() {
        let base = (1000, 800);
        let overlay = (100, 50);
        assert_eq!(WatermarkPosition::BottomRight.anchor(base, overlay), (890, 740));
        assert_eq!(WatermarkPosition::Center.anchor(base, overlay), (450, 375));
        assert_eq!(WatermarkPosition::TopLeft.anchor(base, overlay), (10, 10));
        assert_eq!(WatermarkPosition::TopRight.anchor(base, overlay), (890, 10));
        assert_eq!(WatermarkPosition::BottomLeft.anchor(base, overlay), (10, 740));
    }

    #[test]
    fn test_anchor_can_be_negative() {
        assert_eq!(
            WatermarkPosition::BottomRight.anchor((50, 50), (100, 100)),
            (-60, -60)
        );
        assert_eq!(WatermarkPosition::Center.anchor((10, 10), (15, 15)), (-3, -3));
    }

    #[test]
    fn test_unknown_position_is_top_left() {
        assert_eq!(WatermarkPosition::parse("middle"), WatermarkPosition::TopLeft);
        assert_eq!(WatermarkPosition::parse("CENTER"), WatermarkPosition::Center);
        assert_eq!(WatermarkPosition::default(), WatermarkPosition::BottomRight);
    }

    #[test]
    fn test_text_watermark_marks_bottom_right() {
        let mark = WatermarkSpec {
            content: WatermarkContent::Text(DEFAULT_TEXT.to_string()),
            opacity: 255,
            position: WatermarkPosition::BottomRight,
        };
        let out = composite(&white(400, 300), &mark, &WatermarkFont::Bitmap);
        assert_eq!(out.dimensions(), (400, 300));

        // Bitmap text is 48x8, anchored at (342, 282)
        let dark_in_box = (342..390)
            .flat_map(|x| (282..290).map(move |y| (x, y)))
            .any(|(x, y)| out.get_pixel(x, y) == &Rgb([0, 0, 0]));
        assert!(dark_in_box);

        let untouched = (0..300).all(|x| out.get_pixel(x, 10) == &Rgb([255, 255, 255]));
        assert!(untouched);
    }

    #[test]
    fn test_image_watermark_blends_with_opacity() {
        let overlay = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]));
        let out = composite(
            &white(200, 100),
            &image_spec(Some(overlay), 128),
            &WatermarkFont::Bitmap,
        );

        // Overlay is 50x25 at (10, 10)
        let Rgb([r, g, b]) = *out.get_pixel(20, 20);
        assert_eq!(r, 255);
        assert!((120..=135).contains(&g), "g = {}", g);
        assert_eq!(g, b);
        assert_eq!(out.get_pixel(5, 5), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(70, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_full_opacity_forces_alpha() {
        let overlay = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 255, 0]));
        let out = composite(
            &white(200, 100),
            &image_spec(Some(overlay), 255),
            &WatermarkFont::Bitmap,
        );
        assert_eq!(out.get_pixel(20, 20), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_missing_overlay_passes_through() {
        let base = white(64, 64);
        let out = composite(&base, &image_spec(None, 128), &WatermarkFont::Bitmap);
        assert_eq!(out, base.to_rgb8());
    }

    #[test]
    fn test_font_fallbacks() {
        assert!(WatermarkFont::from_bytes(b"not a font".to_vec()).is_err());
        let font = WatermarkFont::from_path(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!font.is_scalable());
        assert!(!WatermarkFont::from_path(None).is_scalable());
    }
}
