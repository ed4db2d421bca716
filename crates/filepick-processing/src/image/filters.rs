use crate::error::ProcessingError;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::Kernel;

/// Sharpen kernel, normalized by 16
const SHARPEN: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

/// 5x5 ring blur, normalized by 16
#[rustfmt::skip]
const BLUR: [f32; 25] = [
    1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 0.0, 0.0, 0.0, 1.0,
    1.0, 0.0, 0.0, 0.0, 1.0,
    1.0, 0.0, 0.0, 0.0, 1.0,
    1.0, 1.0, 1.0, 1.0, 1.0,
];

const EDGE: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

const CONTRAST_FACTOR: f32 = 1.5;
const BRIGHTNESS_FACTOR: f32 = 1.3;

/// Named filters of the filter operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    Grayscale,
    Sepia,
    Sharpen,
    Blur,
    Contrast,
    Brightness,
    Edge,
}

impl FilterKind {
    pub fn parse(s: &str) -> Result<Self, ProcessingError> {
        match s.trim().to_lowercase().as_str() {
            "grayscale" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "sharpen" => Ok(FilterKind::Sharpen),
            "blur" => Ok(FilterKind::Blur),
            "contrast" => Ok(FilterKind::Contrast),
            "brightness" => Ok(FilterKind::Brightness),
            "edge" => Ok(FilterKind::Edge),
            other => Err(ProcessingError::UnsupportedFilter(other.to_string())),
        }
    }

    /// Name used in output file names
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Blur => "blur",
            FilterKind::Contrast => "contrast",
            FilterKind::Brightness => "brightness",
            FilterKind::Edge => "edge",
        }
    }
}

/// Apply `filter` to an RGB copy of `img`.
pub fn apply(img: &DynamicImage, filter: FilterKind) -> RgbImage {
    let mut rgb = img.to_rgb8();
    match filter {
        FilterKind::Grayscale => {
            grayscale(&mut rgb);
            rgb
        }
        FilterKind::Sepia => {
            sepia(&mut rgb);
            rgb
        }
        FilterKind::Sharpen => convolve(&rgb, &SHARPEN, 3, 16.0),
        FilterKind::Blur => convolve(&rgb, &BLUR, 5, 16.0),
        FilterKind::Edge => convolve(&rgb, &EDGE, 3, 1.0),
        FilterKind::Contrast => {
            let mean = mean_luma(&rgb);
            map_channels(&mut rgb, |v| scale_around(v, mean, CONTRAST_FACTOR));
            rgb
        }
        FilterKind::Brightness => {
            map_channels(&mut rgb, |v| scale_around(v, 0.0, BRIGHTNESS_FACTOR));
            rgb
        }
    }
}

/// ITU-R 601-2 luma in 16.16 fixed point.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn grayscale(rgb: &mut RgbImage) {
    for px in rgb.chunks_exact_mut(3) {
        let l = luma(px[0], px[1], px[2]);
        px.fill(l);
    }
}

/// Single in-place pass; channels are truncated after clamping to 255.
pub fn sepia(rgb: &mut RgbImage) {
    for px in rgb.chunks_exact_mut(3) {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        px[0] = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0) as u8;
        px[1] = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0) as u8;
        px[2] = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0) as u8;
    }
}

fn mean_luma(rgb: &RgbImage) -> f32 {
    let count = rgb.width() as u64 * rgb.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = rgb
        .pixels()
        .map(|Rgb([r, g, b])| luma(*r, *g, *b) as u64)
        .sum();
    (sum as f64 / count as f64).round() as f32
}

fn map_channels(rgb: &mut RgbImage, f: impl Fn(u8) -> u8) {
    for v in rgb.iter_mut() {
        *v = f(*v);
    }
}

fn scale_around(value: u8, center: f32, factor: f32) -> u8 {
    (center + factor * (value as f32 - center)).clamp(0.0, 255.0) as u8
}

fn convolve(rgb: &RgbImage, data: &[f32], size: u32, scale: f32) -> RgbImage {
    Kernel::new(data, size, size).filter::<Rgb<u8>, _, Rgb<u8>>(rgb, |out, acc| {
        *out = (acc / scale).round().clamp(0.0, 255.0) as u8;
    })
}
