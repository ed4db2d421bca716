//! Operation kinds and request-level parameter validation

use crate::batch::ArtifactName;
use crate::document::{parse_index_list, Rotation};
use crate::error::ProcessingError;
use crate::image::codec::{self, TargetFormat};
use crate::image::watermark::{
    WatermarkContent, WatermarkPosition, WatermarkSpec, DEFAULT_OPACITY, DEFAULT_TEXT,
};
use crate::image::{FilterKind, QualityLevel};
use bytes::Bytes;
use std::collections::{BTreeSet, HashMap};

/// Largest width or height resize will produce
pub const MAX_RESIZE_DIMENSION: u32 = 16_384;

/// Multipart field carrying the overlay of an image watermark
pub const WATERMARK_IMAGE_FIELD: &str = "watermark_image";

/// An uploaded file
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filename: String,
    pub data: Bytes,
}

impl InputFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Encoded output of a transform, not yet persisted
#[derive(Debug, Clone)]
pub struct Artifact {
    pub data: Bytes,
    pub name: ArtifactName,
    pub content_type: String,
}

impl Artifact {
    pub fn new(
        data: impl Into<Bytes>,
        name: ArtifactName,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            name,
            content_type: content_type.into(),
        }
    }
}

/// Bucket family an operation writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationFamily {
    Image,
    Pdf,
    Converted,
}

/// Batch operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Resize,
    Convert,
    CompressImage,
    Filter,
    Watermark,
    StripExif,
    Merge,
    Split,
    CompressPdf,
    RotateDelete,
    EncryptDecrypt,
    ExtractText,
}

impl OperationKind {
    /// Key of the result collection in the JSON response
    pub fn result_key(self) -> &'static str {
        match self {
            OperationKind::Resize => "resized_urls",
            OperationKind::Convert => "converted_urls",
            OperationKind::CompressImage | OperationKind::CompressPdf => "compressed_urls",
            OperationKind::Filter => "filtered_urls",
            OperationKind::Watermark => "watermarked_urls",
            OperationKind::StripExif => "cleaned_urls",
            OperationKind::Merge => "merged_url",
            OperationKind::Split => "split_urls",
            OperationKind::RotateDelete => "processed_urls",
            OperationKind::EncryptDecrypt => "result_urls",
            OperationKind::ExtractText => "extracted_text",
        }
    }

    pub fn family(self) -> OperationFamily {
        match self {
            OperationKind::Resize
            | OperationKind::Convert
            | OperationKind::CompressImage
            | OperationKind::Filter
            | OperationKind::Watermark
            | OperationKind::StripExif => OperationFamily::Image,
            _ => OperationFamily::Pdf,
        }
    }

    /// Multipart field the input files arrive in
    pub fn files_field(self) -> &'static str {
        match self.family() {
            OperationFamily::Image => "images",
            _ if self == OperationKind::ExtractText => "file",
            _ => "files",
        }
    }

    /// Operations that produce a single artifact from the whole batch
    pub fn is_single_artifact(self) -> bool {
        matches!(self, OperationKind::Merge | OperationKind::ExtractText)
    }
}

/// Raw request: inputs plus flat string parameters, not yet validated
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub kind: OperationKind,
    pub inputs: Vec<InputFile>,
    pub params: HashMap<String, String>,
    pub attachments: HashMap<String, InputFile>,
}

impl TransformRequest {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            params: HashMap::new(),
            attachments: HashMap::new(),
        }
    }

    pub fn with_input(mut self, input: InputFile) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, field: impl Into<String>, file: InputFile) -> Self {
        self.attachments.insert(field.into(), file);
        self
    }

    /// Trimmed parameter value; blank values count as absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoMode {
    Encrypt,
    Decrypt,
}

impl CryptoMode {
    pub fn parse(s: &str) -> Result<Self, ProcessingError> {
        match s.trim().to_lowercase().as_str() {
            "encrypt" => Ok(CryptoMode::Encrypt),
            "decrypt" => Ok(CryptoMode::Decrypt),
            other => Err(ProcessingError::invalid(
                "mode",
                format!("'{}' (expected encrypt or decrypt)", other),
            )),
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            CryptoMode::Encrypt => "encrypt",
            CryptoMode::Decrypt => "decrypt",
        }
    }
}

/// A validated operation, ready to run over the inputs
#[derive(Debug, Clone)]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Convert { target: TargetFormat },
    CompressImage { quality: QualityLevel },
    Filter { filter: FilterKind },
    Watermark { spec: WatermarkSpec },
    StripExif,
    Merge,
    Split { pages: Vec<usize> },
    CompressPdf,
    RotateDelete {
        rotation: Option<Rotation>,
        delete: BTreeSet<usize>,
    },
    EncryptDecrypt { mode: CryptoMode, password: String },
    ExtractText,
}

impl Operation {
    /// Validate the request parameters and input cardinality.
    ///
    /// Nothing here looks at the content of the inputs, except the watermark overlay
    /// which is decoded once for the whole batch.
    pub fn from_request(request: &TransformRequest) -> Result<Self, ProcessingError> {
        let kind = request.kind;

        if request.inputs.is_empty() {
            return Err(ProcessingError::MissingParameter(kind.files_field()));
        }

        let operation = match kind {
            OperationKind::Resize => Operation::Resize {
                width: dimension(request, "width")?,
                height: dimension(request, "height")?,
            },
            OperationKind::Convert => Operation::Convert {
                target: TargetFormat::parse(
                    request
                        .param("format")
                        .ok_or(ProcessingError::MissingParameter("format"))?,
                )?,
            },
            OperationKind::CompressImage => Operation::CompressImage {
                quality: QualityLevel::parse(request.param("quality")),
            },
            OperationKind::Filter => Operation::Filter {
                filter: match request.param("filter") {
                    Some(name) => FilterKind::parse(name)?,
                    None => FilterKind::default(),
                },
            },
            OperationKind::Watermark => Operation::Watermark {
                spec: watermark_spec(request)?,
            },
            OperationKind::StripExif => Operation::StripExif,
            OperationKind::Merge => {
                if request.inputs.len() < 2 {
                    return Err(ProcessingError::InsufficientInputs(format!(
                        "merge needs at least 2 files, got {}",
                        request.inputs.len()
                    )));
                }
                Operation::Merge
            }
            OperationKind::Split => Operation::Split {
                pages: parse_index_list(
                    "pages",
                    request
                        .param("pages")
                        .ok_or(ProcessingError::MissingParameter("pages"))?,
                )?,
            },
            OperationKind::CompressPdf => Operation::CompressPdf,
            OperationKind::RotateDelete => Operation::RotateDelete {
                rotation: rotation(request)?,
                delete: match request.param("delete_pages") {
                    Some(raw) => parse_index_list("delete_pages", raw)?.into_iter().collect(),
                    None => BTreeSet::new(),
                },
            },
            OperationKind::EncryptDecrypt => {
                let mode = request
                    .param("mode")
                    .ok_or(ProcessingError::MissingParameter("mode"))?;
                // Passwords are used verbatim
                let password = request
                    .params
                    .get("password")
                    .filter(|p| !p.is_empty())
                    .ok_or(ProcessingError::MissingParameter("password"))?;
                Operation::EncryptDecrypt {
                    mode: CryptoMode::parse(mode)?,
                    password: password.clone(),
                }
            }
            OperationKind::ExtractText => Operation::ExtractText,
        };

        Ok(operation)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Resize { .. } => OperationKind::Resize,
            Operation::Convert { .. } => OperationKind::Convert,
            Operation::CompressImage { .. } => OperationKind::CompressImage,
            Operation::Filter { .. } => OperationKind::Filter,
            Operation::Watermark { .. } => OperationKind::Watermark,
            Operation::StripExif => OperationKind::StripExif,
            Operation::Merge => OperationKind::Merge,
            Operation::Split { .. } => OperationKind::Split,
            Operation::CompressPdf => OperationKind::CompressPdf,
            Operation::RotateDelete { .. } => OperationKind::RotateDelete,
            Operation::EncryptDecrypt { .. } => OperationKind::EncryptDecrypt,
            Operation::ExtractText => OperationKind::ExtractText,
        }
    }

    /// Folder inside the family bucket; `None` for operations that store nothing
    pub fn folder(&self) -> Option<&'static str> {
        let folder = match self {
            Operation::Resize { .. } => "resized",
            Operation::Convert { .. } => "converted",
            Operation::CompressImage { .. } | Operation::CompressPdf => "compressed",
            Operation::Filter { .. } => "filtered",
            Operation::Watermark { .. } => "watermarked",
            Operation::StripExif => "no_exif",
            Operation::Merge => "merged",
            Operation::Split { .. } => "split",
            Operation::RotateDelete { .. } => "processed",
            Operation::EncryptDecrypt { mode, .. } => mode.folder(),
            Operation::ExtractText => return None,
        };
        Some(folder)
    }
}

fn dimension(request: &TransformRequest, name: &'static str) -> Result<u32, ProcessingError> {
    let raw = request
        .param(name)
        .ok_or(ProcessingError::MissingParameter(name))?;
    let value: i64 = raw
        .parse()
        .map_err(|_| ProcessingError::invalid(name, format!("'{}' is not an integer", raw)))?;

    if value <= 0 {
        return Err(ProcessingError::InvalidDimension(format!(
            "{} must be greater than zero, got {}",
            name, value
        )));
    }
    if value > MAX_RESIZE_DIMENSION as i64 {
        return Err(ProcessingError::InvalidDimension(format!(
            "{} must be at most {}, got {}",
            name, MAX_RESIZE_DIMENSION, value
        )));
    }
    Ok(value as u32)
}

fn rotation(request: &TransformRequest) -> Result<Option<Rotation>, ProcessingError> {
    let Some(raw) = request.param("rotate") else {
        return Ok(None);
    };
    raw.parse::<i64>()
        .ok()
        .and_then(Rotation::from_degrees)
        .map(Some)
        .ok_or_else(|| {
            ProcessingError::invalid("rotate", format!("'{}' (expected 0, 90, 180 or 270)", raw))
        })
}

fn watermark_spec(request: &TransformRequest) -> Result<WatermarkSpec, ProcessingError> {
    let opacity = match request.param("opacity") {
        Some(raw) => raw.parse::<u8>().map_err(|_| {
            ProcessingError::invalid("opacity", format!("'{}' (expected an integer 0-255)", raw))
        })?,
        None => DEFAULT_OPACITY,
    };

    let position = request
        .param("position")
        .map(WatermarkPosition::parse)
        .unwrap_or_default();

    let content = match request.param("type").map(str::to_lowercase).as_deref() {
        None | Some("text") => WatermarkContent::Text(
            request.param("text").unwrap_or(DEFAULT_TEXT).to_string(),
        ),
        Some("image") => WatermarkContent::Image(overlay(request)),
        Some(other) => {
            return Err(ProcessingError::invalid(
                "type",
                format!("'{}' (expected text or image)", other),
            ))
        }
    };

    Ok(WatermarkSpec {
        content,
        opacity,
        position,
    })
}

fn overlay(request: &TransformRequest) -> Option<image::RgbaImage> {
    let Some(file) = request.attachments.get(WATERMARK_IMAGE_FIELD) else {
        tracing::warn!("Image watermark requested without a watermark_image file");
        return None;
    };

    match codec::decode(&file.data) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            tracing::warn!(
                filename = %file.filename,
                error = %e,
                "Watermark image could not be decoded"
            );
            None
        }
    }
}
