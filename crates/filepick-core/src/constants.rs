//! Shared constants: default bucket names and tool defaults.

/// Bucket for image operation outputs.
pub const DEFAULT_IMAGE_BUCKET: &str = "images";

/// Bucket for PDF operation outputs.
pub const DEFAULT_PDF_BUCKET: &str = "pdf-files";

/// Bucket for office/audio/video converter outputs.
pub const DEFAULT_CONVERTED_BUCKET: &str = "converted-files";

pub const DEFAULT_SOFFICE_PATH: &str = "soffice";
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_PDFTOPPM_PATH: &str = "pdftoppm";

/// Rasterization resolution used when a PDF is converted to images.
pub const PDF_RASTER_DPI: u32 = 200;
