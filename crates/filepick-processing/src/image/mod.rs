//! Raster image operations

pub mod bitmap_font;
pub mod codec;
pub mod filters;
pub mod transform;
pub mod watermark;

pub use codec::TargetFormat;
pub use filters::FilterKind;
pub use transform::{CleanImage, QualityLevel};
pub use watermark::{
    WatermarkContent, WatermarkFont, WatermarkPosition, WatermarkSpec, DEFAULT_OPACITY,
    DEFAULT_TEXT,
};
