//! Application state shared by every handler.

use filepick_core::Config;
use filepick_processing::{
    ArtifactPublisher, BatchExecutor, MediaTranscoder, OfficeConverter, PageRasterizer,
    PdftoppmRasterizer, WatermarkFont,
};
use filepick_storage::Storage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub executor: BatchExecutor,
    pub office: OfficeConverter,
    pub media: MediaTranscoder,
}

impl AppState {
    /// Build the state around an already-created blob store.
    ///
    /// PDF pages are rasterized with `pdftoppm` at the configured path.
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let rasterizer = Arc::new(PdftoppmRasterizer::new(
            config.processing().pdftoppm_path.clone(),
        ));
        Self::with_rasterizer(config, storage, rasterizer)
    }

    pub fn with_rasterizer(
        config: Config,
        storage: Arc<dyn Storage>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        let processing = config.processing();
        let font = WatermarkFont::from_path(processing.watermark_font_path.as_deref());
        let publisher =
            ArtifactPublisher::new(storage, config.buckets().clone(), config.upload_timeout());

        Self {
            executor: BatchExecutor::new(publisher, Arc::new(font), rasterizer),
            office: OfficeConverter::new(processing.soffice_path.clone()),
            media: MediaTranscoder::new(processing.ffmpeg_path.clone()),
            config,
        }
    }

    pub fn publisher(&self) -> &ArtifactPublisher {
        self.executor.publisher()
    }
}
