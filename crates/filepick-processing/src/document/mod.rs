//! PDF document operations

pub mod assembly;
pub mod engine;
pub mod pages;
pub mod rasterizer;
pub mod text;

pub use assembly::PageAssembler;
pub use engine::{PdfDocument, Rotation};
pub use pages::parse_index_list;
pub use rasterizer::{PageRasterizer, PdftoppmRasterizer};
pub use text::extract_text;

/// `%PDF` signature or a `.pdf` extension
pub fn is_pdf(filename: &str, data: &[u8]) -> bool {
    data.starts_with(b"%PDF") || filename.to_lowercase().ends_with(".pdf")
}
