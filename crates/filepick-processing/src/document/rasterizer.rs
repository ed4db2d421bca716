//! PDF page rasterization through Poppler's `pdftoppm`.

use crate::error::ProcessingError;
use async_trait::async_trait;
use bytes::Bytes;
use filepick_core::constants::PDF_RASTER_DPI;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Renders every page of a PDF to an encoded raster image
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// One PNG per page, in page order
    async fn rasterize(&self, pdf: Bytes) -> Result<Vec<Bytes>, ProcessingError>;
}

#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            dpi: PDF_RASTER_DPI,
        }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: Bytes) -> Result<Vec<Bytes>, ProcessingError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, &pdf).await?;

        let args = vec![
            "-r".to_string(),
            self.dpi.to_string(),
            "-png".to_string(),
            input.to_string_lossy().to_string(),
            workdir.path().join("page").to_string_lossy().to_string(),
        ];

        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ProcessingError::Rasterize(format!("failed to execute {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessingError::Rasterize(stderr.trim().to_string()));
        }

        let mut pages = rendered_pages(workdir.path()).await?;
        pages.sort_by_key(|(number, _)| *number);

        let mut images = Vec::with_capacity(pages.len());
        for (_, path) in pages {
            images.push(Bytes::from(tokio::fs::read(&path).await?));
        }

        tracing::debug!(pages = images.len(), dpi = self.dpi, "Rasterized PDF");
        Ok(images)
    }
}

/// `page-N.png` files in `dir` with their page number. Poppler zero-pads N.
async fn rendered_pages(dir: &Path) -> Result<Vec<(u32, std::path::PathBuf)>, ProcessingError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pages = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if let Some(number) = page_number(&name.to_string_lossy()) {
            pages.push((number, entry.path()));
        }
    }
    Ok(pages)
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
