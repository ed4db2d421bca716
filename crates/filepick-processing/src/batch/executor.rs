//! Runs one operation over every input of a request.
//!
//! Items are processed one after another; the CPU-bound part of each item runs on the
//! blocking pool. An item that fails to transform or upload is skipped and the batch
//! continues. Decryption failures end the batch, and merge and text extraction fail as
//! a whole since they produce a single result.

use crate::batch::report::{BatchOutcome, BatchReport};
use crate::batch::{
    Artifact, ArtifactName, ArtifactPublisher, CryptoMode, InputFile, Operation,
    OperationFamily, TransformRequest,
};
use crate::document::{self, PageRasterizer, PdfDocument};
use crate::error::ProcessingError;
use crate::image::codec::{self, TargetFormat, DEFAULT_JPEG_QUALITY};
use crate::image::watermark::{self, WatermarkFont};
use crate::image::{filters, transform};
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;

pub struct BatchExecutor {
    publisher: ArtifactPublisher,
    font: Arc<WatermarkFont>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl BatchExecutor {
    pub fn new(
        publisher: ArtifactPublisher,
        font: Arc<WatermarkFont>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            publisher,
            font,
            rasterizer,
        }
    }

    pub fn publisher(&self) -> &ArtifactPublisher {
        &self.publisher
    }

    /// Validate `request` and run it.
    ///
    /// Validation errors are returned before any input is looked at.
    #[tracing::instrument(
        skip_all,
        fields(operation = ?request.kind, inputs = request.inputs.len())
    )]
    pub async fn run(&self, request: TransformRequest) -> Result<BatchOutcome, ProcessingError> {
        let operation = Arc::new(Operation::from_request(&request)?);
        let mut inputs = request.inputs;

        match (operation.as_ref(), operation.folder()) {
            (Operation::Merge, Some(folder)) => self.merge(folder, inputs).await,
            (_, Some(folder)) => self
                .run_items(Arc::clone(&operation), folder, inputs)
                .await
                .map(BatchOutcome::Uploaded),
            // Nothing stored: the text itself is the result
            (_, None) => {
                let input = inputs.swap_remove(0);
                let text = blocking(move || document::extract_text(&input.data)).await?;
                Ok(BatchOutcome::Text(text))
            }
        }
    }

    async fn run_items(
        &self,
        operation: Arc<Operation>,
        folder: &'static str,
        inputs: Vec<InputFile>,
    ) -> Result<BatchReport, ProcessingError> {
        let family = operation.kind().family();
        let mut report = BatchReport::default();

        for (index, input) in inputs.into_iter().enumerate() {
            let filename = input.filename.clone();

            let artifacts = match self.process_item(&operation, input).await {
                Ok(artifacts) => artifacts,
                Err(e) if e.aborts_batch() => {
                    tracing::error!(index, filename = %filename, error = %e, "Aborting batch");
                    return Err(e);
                }
                Err(e) => {
                    report.skip(index, &filename, &e);
                    continue;
                }
            };

            for artifact in artifacts {
                match self.publisher.persist(family, folder, artifact).await {
                    Ok(uploaded) => report.successes.push(uploaded),
                    Err(e) => report.skip(index, &filename, &ProcessingError::Upload(e)),
                }
            }
        }

        tracing::info!(
            succeeded = report.successes.len(),
            skipped = report.skipped.len(),
            "Batch finished"
        );
        Ok(report)
    }

    async fn process_item(
        &self,
        operation: &Arc<Operation>,
        input: InputFile,
    ) -> Result<Vec<Artifact>, ProcessingError> {
        if let Operation::Convert { target } = operation.as_ref() {
            if document::is_pdf(&input.filename, &input.data) {
                let target = *target;
                let pages = self.rasterizer.rasterize(input.data).await?;
                return blocking(move || convert_pages(&pages, target)).await;
            }
        }

        let operation = Arc::clone(operation);
        let font = Arc::clone(&self.font);
        blocking(move || transform_item(&operation, &input, &font).map(|a| vec![a])).await
    }

    async fn merge(
        &self,
        folder: &'static str,
        inputs: Vec<InputFile>,
    ) -> Result<BatchOutcome, ProcessingError> {
        let artifact = blocking(move || {
            let documents = inputs
                .iter()
                .map(|input| PdfDocument::load(&input.data))
                .collect::<Result<Vec<_>, _>>()?;
            pdf_artifact(PdfDocument::merge(documents)?)
        })
        .await?;

        let uploaded = self
            .publisher
            .persist(OperationFamily::Pdf, folder, artifact)
            .await?;

        Ok(BatchOutcome::Uploaded(BatchReport {
            successes: vec![uploaded],
            skipped: Vec::new(),
        }))
    }
}

async fn blocking<T, F>(f: F) -> Result<T, ProcessingError>
where
    F: FnOnce() -> Result<T, ProcessingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Transform one input into its output artifact.
pub fn transform_item(
    operation: &Operation,
    input: &InputFile,
    font: &WatermarkFont,
) -> Result<Artifact, ProcessingError> {
    let artifact = match operation {
        Operation::Resize { width, height } => {
            let img = codec::decode(&input.data)?;
            let resized = transform::resize(&img, *width, *height)?;
            Artifact::new(
                codec::encode(&resized, ImageFormat::Png)?,
                ArtifactName::unique("", "png"),
                ImageFormat::Png.to_mime_type(),
            )
        }
        Operation::Convert { target } => {
            let img = codec::decode(&input.data)?;
            reencoded(&img, *target, ArtifactName::unique("", target.extension()))?
        }
        Operation::CompressImage { quality } => {
            transform::ensure_compressible(&input.filename)?;
            let img = codec::decode(&input.data)?;
            jpeg(transform::compress(&img, *quality)?, "_compressed")
        }
        Operation::Filter { filter } => {
            let img = codec::decode(&input.data)?;
            let filtered = DynamicImage::ImageRgb8(filters::apply(&img, *filter));
            jpeg(
                codec::encode_jpeg(&filtered, DEFAULT_JPEG_QUALITY)?,
                &format!("_{}", filter.name()),
            )
        }
        Operation::Watermark { spec } => {
            let img = codec::decode(&input.data)?;
            let marked = DynamicImage::ImageRgb8(watermark::composite(&img, spec, font));
            jpeg(
                codec::encode_jpeg(&marked, DEFAULT_JPEG_QUALITY)?,
                "_watermarked",
            )
        }
        Operation::StripExif => {
            let clean = transform::strip_exif(&input.data)?;
            let extension = transform::file_extension(&input.filename).unwrap_or_else(|| {
                clean
                    .format
                    .extensions_str()
                    .first()
                    .copied()
                    .unwrap_or("img")
                    .to_string()
            });
            Artifact::new(
                clean.data,
                ArtifactName::unique("_noexif", extension),
                clean.format.to_mime_type(),
            )
        }
        Operation::Split { pages } => pdf_artifact(PdfDocument::load(&input.data)?.split(pages)?)?,
        Operation::CompressPdf => {
            pdf_artifact(PdfDocument::load(&input.data)?.strip_metadata()?)?
        }
        Operation::RotateDelete { rotation, delete } => pdf_artifact(
            PdfDocument::load(&input.data)?.rotate_delete(*rotation, delete)?,
        )?,
        Operation::EncryptDecrypt { mode, password } => match mode {
            CryptoMode::Encrypt => {
                let mut doc = PdfDocument::load(&input.data)?.copy_pages()?;
                doc.encrypt(password)?;
                pdf_artifact(doc)?
            }
            CryptoMode::Decrypt => {
                pdf_artifact(PdfDocument::load_with_password(&input.data, password)?.copy_pages()?)?
            }
        },
        Operation::Merge | Operation::ExtractText => {
            return Err(ProcessingError::Task(format!(
                "{:?} does not run per item",
                operation.kind()
            )))
        }
    };

    Ok(artifact)
}

/// Re-encode every rasterized page, named `_page_{n}` from 1.
fn convert_pages(
    pages: &[bytes::Bytes],
    target: TargetFormat,
) -> Result<Vec<Artifact>, ProcessingError> {
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let img = codec::decode(page)?;
            let name = ArtifactName::unique(format!("_page_{}", i + 1), target.extension());
            reencoded(&img, target, name)
        })
        .collect()
}

fn reencoded(
    img: &DynamicImage,
    target: TargetFormat,
    name: ArtifactName,
) -> Result<Artifact, ProcessingError> {
    Ok(Artifact::new(
        codec::reencode(img, target)?,
        name,
        target.mime_type(),
    ))
}

fn jpeg(data: Vec<u8>, suffix: &str) -> Artifact {
    Artifact::new(
        data,
        ArtifactName::unique(suffix, "jpg"),
        ImageFormat::Jpeg.to_mime_type(),
    )
}

fn pdf_artifact(mut doc: PdfDocument) -> Result<Artifact, ProcessingError> {
    Ok(Artifact::new(
        doc.to_bytes()?,
        ArtifactName::timestamped("pdf"),
        "application/pdf",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::testing::MemoryStorage;
    use crate::batch::{BatchOutcome, OperationKind};
    use crate::document::fixtures;
    use async_trait::async_trait;
    use bytes::Bytes;
    use filepick_core::BucketConfig;
    use image::{Rgb, RgbImage};
    use std::time::Duration;

    struct FakeRasterizer {
        pages: usize,
    }

    #[async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn rasterize(&self, _pdf: Bytes) -> Result<Vec<Bytes>, ProcessingError> {
            (0..self.pages)
                .map(|_| png(30, 20).map(Bytes::from))
                .collect()
        }
    }

    fn png(width: u32, height: u32) -> Result<Vec<u8>, ProcessingError> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 90])));
        codec::encode(&img, ImageFormat::Png)
    }

    fn image_input(name: &str) -> InputFile {
        InputFile::new(name, png(64, 48).unwrap())
    }

    fn pdf_input(name: &str, widths: &[i64]) -> InputFile {
        InputFile::new(name, fixtures::pdf_bytes(widths))
    }

    fn executor(storage: Arc<MemoryStorage>) -> BatchExecutor {
        let publisher =
            ArtifactPublisher::new(storage, BucketConfig::default(), Duration::from_secs(5));
        BatchExecutor::new(
            publisher,
            Arc::new(WatermarkFont::Bitmap),
            Arc::new(FakeRasterizer { pages: 2 }),
        )
    }

    fn uploaded(outcome: BatchOutcome) -> BatchReport {
        match outcome {
            BatchOutcome::Uploaded(report) => report,
            BatchOutcome::Text(text) => panic!("unexpected text outcome: {}", text),
        }
    }

    #[tokio::test]
    async fn test_undecodable_item_is_skipped() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Filter)
            .with_param("filter", "sepia")
            .with_input(image_input("a.png"))
            .with_input(InputFile::new("b.png", Bytes::from_static(b"garbage")))
            .with_input(image_input("c.png"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());

        assert_eq!(report.urls().len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[0].filename, "b.png");
        for object in storage.objects() {
            assert_eq!(object.bucket, "images");
            assert!(object.path.starts_with("filtered/"));
            assert!(object.path.ends_with("_sepia.jpg"));
        }
    }

    #[tokio::test]
    async fn test_upload_failure_is_skipped() {
        let storage = Arc::new(MemoryStorage::failing_on(&[1]));
        let request = TransformRequest::new(OperationKind::Resize)
            .with_param("width", "10")
            .with_param("height", "30")
            .with_input(image_input("a.png"))
            .with_input(image_input("b.png"))
            .with_input(image_input("c.png"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert_eq!(report.successes.len(), 2);
        assert_eq!(report.skipped[0].index, 1);
        assert!(report.skipped[0].reason.starts_with("Upload failed"));

        let resized = codec::decode(&storage.objects()[0].data).unwrap();
        assert_eq!((resized.width(), resized.height()), (10, 30));
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_item() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Filter)
            .with_param("filter", "vintage")
            .with_input(image_input("a.png"));

        let err = executor(storage.clone()).run(request).await.unwrap_err();
        assert!(err.is_validation());
        assert!(storage.objects().is_empty());
    }

    #[tokio::test]
    async fn test_compress_skips_unsupported_extension() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::CompressImage)
            .with_param("quality", "low")
            .with_input(image_input("a.gif"))
            .with_input(image_input("b.PNG"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert_eq!(report.successes.len(), 1);
        assert!(report.successes[0].filename.ends_with("_compressed.jpg"));
        assert!(report.skipped[0].reason.contains("Unsupported input type"));
    }

    #[tokio::test]
    async fn test_convert_pdf_pages() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Convert)
            .with_param("format", "png")
            .with_input(pdf_input("doc.pdf", &[100, 100]))
            .with_input(image_input("photo.jpg"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        let names: Vec<&str> = report.successes.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("_page_1.png"));
        assert!(names[1].ends_with("_page_2.png"));
        assert!(!names[2].contains("_page_"));
        assert!(report.successes.iter().all(|a| a.folder == "converted"));
    }

    #[tokio::test]
    async fn test_strip_exif_keeps_extension() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::StripExif)
            .with_input(image_input("Holiday.PNG"))
            .with_input(image_input("scan"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert!(report.successes[0].filename.ends_with("_noexif.png"));
        assert!(report.successes[1].filename.ends_with("_noexif.png"));
        assert_eq!(storage.objects()[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn test_merge_produces_single_document() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Merge)
            .with_input(pdf_input("a.pdf", &[101, 102]))
            .with_input(pdf_input("b.pdf", &[201, 202, 203]));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert_eq!(report.successes.len(), 1);
        assert_eq!(report.successes[0].bucket, "pdf-files");

        let objects = storage.objects();
        assert!(objects[0].path.starts_with("merged/"));
        let merged = PdfDocument::load(&objects[0].data).unwrap();
        assert_eq!(
            fixtures::page_widths(merged.document()),
            vec![101, 102, 201, 202, 203]
        );
    }

    #[tokio::test]
    async fn test_merge_aborts_on_bad_input() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Merge)
            .with_input(pdf_input("a.pdf", &[101]))
            .with_input(InputFile::new("b.pdf", Bytes::from_static(b"not a pdf")));

        assert!(executor(storage.clone()).run(request).await.is_err());
        assert!(storage.objects().is_empty());
    }

    #[tokio::test]
    async fn test_merge_upload_failure_aborts() {
        let storage = Arc::new(MemoryStorage::failing());
        let request = TransformRequest::new(OperationKind::Merge)
            .with_input(pdf_input("a.pdf", &[101]))
            .with_input(pdf_input("b.pdf", &[102]));

        let err = executor(storage).run(request).await.unwrap_err();
        assert!(err.is_upload());
    }

    #[tokio::test]
    async fn test_split_and_rotate_delete() {
        let storage = Arc::new(MemoryStorage::default());
        let split = TransformRequest::new(OperationKind::Split)
            .with_param("pages", "3,0,1")
            .with_input(pdf_input("a.pdf", &[100, 101, 102, 103, 104]));
        uploaded(executor(storage.clone()).run(split).await.unwrap());

        let rotate = TransformRequest::new(OperationKind::RotateDelete)
            .with_param("rotate", "90")
            .with_param("delete_pages", "1")
            .with_input(pdf_input("b.pdf", &[100, 101, 102]));
        uploaded(executor(storage.clone()).run(rotate).await.unwrap());

        let objects = storage.objects();
        assert!(objects[0].path.starts_with("split/"));
        let split = PdfDocument::load(&objects[0].data).unwrap();
        assert_eq!(fixtures::page_widths(split.document()), vec![103, 100, 101]);

        assert!(objects[1].path.starts_with("processed/"));
        let rotated = PdfDocument::load(&objects[1].data).unwrap();
        assert_eq!(fixtures::page_widths(rotated.document()), vec![100, 102]);
        assert_eq!(rotated.page_rotations(), vec![90, 90]);
    }

    #[tokio::test]
    async fn test_wrong_password_aborts_whole_batch() {
        let mut locked = PdfDocument::load(&fixtures::pdf_bytes(&[100])).unwrap();
        locked.encrypt("right").unwrap();
        let locked = locked.to_bytes().unwrap();

        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::EncryptDecrypt)
            .with_param("mode", "decrypt")
            .with_param("password", "wrong")
            .with_input(pdf_input("plain.pdf", &[100]))
            .with_input(InputFile::new("locked.pdf", locked));

        let err = executor(storage).run(request).await.unwrap_err();
        assert!(matches!(err, ProcessingError::DecryptionFailed(_)));
    }

    #[tokio::test]
    async fn test_encrypt_output_requires_password() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::EncryptDecrypt)
            .with_param("mode", "encrypt")
            .with_param("password", "hunter2")
            .with_input(pdf_input("a.pdf", &[100, 101]));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert!(report.successes[0].url.contains("/encrypt/"));

        let data = &storage.objects()[0].data;
        assert!(PdfDocument::load_with_password(data, "nope").is_err());
        let opened = PdfDocument::load_with_password(data, "hunter2").unwrap();
        assert_eq!(opened.page_count(), 2);
    }

    #[tokio::test]
    async fn test_extract_text() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::ExtractText)
            .with_input(pdf_input("a.pdf", &[300]));

        match executor(storage.clone()).run(request).await.unwrap() {
            BatchOutcome::Text(text) => assert!(text.contains("Page 1")),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(storage.objects().is_empty());
    }

    #[tokio::test]
    async fn test_watermark_item() {
        let storage = Arc::new(MemoryStorage::default());
        let request = TransformRequest::new(OperationKind::Watermark)
            .with_param("position", "center")
            .with_input(image_input("a.png"));

        let report = uploaded(executor(storage.clone()).run(request).await.unwrap());
        assert!(report.successes[0].filename.ends_with("_watermarked.jpg"));
        assert_eq!(storage.objects()[0].content_type, "image/jpeg");
    }
}
