//! Batch executor and the naming/upload adapter

pub mod executor;
pub mod naming;
pub mod operation;
pub mod publisher;
pub mod report;

pub use executor::BatchExecutor;
pub use naming::ArtifactName;
pub use operation::{
    Artifact, CryptoMode, InputFile, Operation, OperationFamily, OperationKind,
    TransformRequest, WATERMARK_IMAGE_FIELD,
};
pub use publisher::{ArtifactPublisher, UploadedArtifact};
pub use report::{BatchOutcome, BatchReport, SkippedItem};
