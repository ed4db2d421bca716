//! FilePick Processing Library
//!
//! This crate holds the batch media transformation engine:
//! - Pixel transforms: resize, re-encode, compress, filters, EXIF stripping (image)
//! - Text and image watermark compositing (image::watermark)
//! - PDF page engine: merge, split, rotate/delete, metadata stripping, passwords, text (document)
//! - Batch executor with per-item failure isolation and the naming/upload adapter (batch)
//! - External converters for office documents and audio/video (converter)
//!
//! CPU-bound transforms are synchronous functions; the batch executor moves each item
//! onto the blocking pool so request handlers stay responsive.

pub mod batch;
pub mod converter;
pub mod document;
pub mod error;
pub mod image;

pub use crate::batch::{
    Artifact, ArtifactName, ArtifactPublisher, BatchExecutor, BatchOutcome, BatchReport,
    InputFile, Operation, OperationFamily, OperationKind, SkippedItem, TransformRequest,
    UploadedArtifact,
};
pub use crate::converter::{ConverterError, MediaTranscoder, OfficeConverter, OfficeFormat};
pub use crate::document::{PageRasterizer, PdfDocument, PdftoppmRasterizer, Rotation};
pub use crate::error::ProcessingError;
pub use crate::image::{FilterKind, QualityLevel, TargetFormat, WatermarkFont, WatermarkPosition};
