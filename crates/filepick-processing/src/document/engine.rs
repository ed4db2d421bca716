//! PDF page engine: merge, split, rotate/delete, metadata stripping and passwords.

use crate::document::assembly::{inherited, PageAssembler};
use crate::error::ProcessingError;
use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};
use std::collections::BTreeSet;

/// RC4 key length for password protection
const KEY_LENGTH_BITS: usize = 128;

/// Absolute page rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// A parsed PDF document
#[derive(Debug)]
pub struct PdfDocument {
    inner: Document,
}

impl PdfDocument {
    /// Parse an unencrypted document.
    ///
    /// Documents protected by a non-empty user password are rejected; use
    /// [`Self::load_with_password`] for those.
    pub fn load(data: &[u8]) -> Result<Self, ProcessingError> {
        let inner = Document::load_mem(data)?;
        if inner.is_encrypted() {
            return Err(ProcessingError::UnsupportedInputType(
                "password-protected PDF".to_string(),
            ));
        }
        Ok(Self { inner })
    }

    /// Parse a document, decrypting it with `password` if it is encrypted.
    ///
    /// Any failure, including a corrupt file, is reported as `DecryptionFailed`.
    pub fn load_with_password(data: &[u8], password: &str) -> Result<Self, ProcessingError> {
        let inner = match Document::load_mem(data) {
            Ok(doc) if !doc.is_encrypted() => doc,
            _ => Document::load_mem_with_password(data, password)
                .map_err(|e| ProcessingError::DecryptionFailed(e.to_string()))?,
        };

        if inner.is_encrypted() {
            return Err(ProcessingError::DecryptionFailed(
                "document is still encrypted".to_string(),
            ));
        }
        Ok(Self { inner })
    }

    pub fn from_document(inner: Document) -> Self {
        Self { inner }
    }

    pub fn document(&self) -> &Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    pub fn is_encrypted(&self) -> bool {
        self.inner.is_encrypted()
    }

    /// Effective `/Rotate` of every page, in page order
    pub fn page_rotations(&self) -> Vec<i64> {
        self.inner
            .get_pages()
            .into_values()
            .map(|id| {
                inherited(&self.inner, id, b"Rotate")
                    .and_then(|r| r.as_i64().ok())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Concatenate the pages of all `documents` in input order.
    pub fn merge(documents: Vec<PdfDocument>) -> Result<Self, ProcessingError> {
        if documents.len() < 2 {
            return Err(ProcessingError::InsufficientInputs(format!(
                "merge needs at least 2 documents, got {}",
                documents.len()
            )));
        }

        let mut assembler = PageAssembler::new();
        for document in documents {
            for page_id in assembler.import(document.inner)? {
                assembler.push_page(page_id, None)?;
            }
        }
        Ok(Self::from_document(assembler.finish()))
    }

    /// Pages at `indices`, in the requested order. Out-of-range indices are dropped.
    pub fn split(self, indices: &[usize]) -> Result<Self, ProcessingError> {
        let mut assembler = PageAssembler::new();
        let pages = assembler.import(self.inner)?;
        for &index in indices {
            if let Some(&page_id) = pages.get(index) {
                assembler.push_page(page_id, None)?;
            }
        }
        Ok(Self::from_document(assembler.finish()))
    }

    /// Drop the pages in `delete` and set an absolute rotation on the rest.
    ///
    /// A zero rotation leaves existing `/Rotate` values alone.
    pub fn rotate_delete(
        self,
        rotation: Option<Rotation>,
        delete: &BTreeSet<usize>,
    ) -> Result<Self, ProcessingError> {
        let rotation = rotation.filter(|r| *r != Rotation::Deg0);
        let mut assembler = PageAssembler::new();
        let pages = assembler.import(self.inner)?;
        for (index, page_id) in pages.into_iter().enumerate() {
            if !delete.contains(&index) {
                assembler.push_page(page_id, rotation)?;
            }
        }
        Ok(Self::from_document(assembler.finish()))
    }

    /// Copy every page into a fresh document.
    pub fn copy_pages(self) -> Result<Self, ProcessingError> {
        let mut assembler = PageAssembler::new();
        for page_id in assembler.import(self.inner)? {
            assembler.push_page(page_id, None)?;
        }
        Ok(Self::from_document(assembler.finish()))
    }

    /// Drop `/Info` and catalog `/Metadata`; unreferenced objects go with them.
    pub fn strip_metadata(self) -> Result<Self, ProcessingError> {
        self.copy_pages()
    }

    /// Protect the document with `password` as both user and owner password.
    pub fn encrypt(&mut self, password: &str) -> Result<(), ProcessingError> {
        if !self.inner.trailer.has(b"ID") {
            let id = uuid::Uuid::new_v4().as_bytes().to_vec();
            self.inner.trailer.set(
                "ID",
                Object::Array(vec![
                    Object::String(id.clone(), StringFormat::Hexadecimal),
                    Object::String(id, StringFormat::Hexadecimal),
                ]),
            );
        }

        let version = EncryptionVersion::V2 {
            document: &self.inner,
            owner_password: password,
            user_password: password,
            key_length: KEY_LENGTH_BITS,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|e| ProcessingError::Encode(format!("encryption setup failed: {}", e)))?;
        self.inner
            .encrypt(&state)
            .map_err(|e| ProcessingError::Encode(format!("encryption failed: {}", e)))?;
        Ok(())
    }

    /// Serialize the document. Unencrypted output uses object streams.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        if self.inner.is_encrypted() {
            self.inner.save_to(&mut buffer)?;
        } else {
            self.inner.save_modern(&mut buffer)?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;
    use lopdf::dictionary;

    fn load(widths: &[i64]) -> PdfDocument {
        PdfDocument::load(&fixtures::pdf_bytes(widths)).unwrap()
    }

    fn reload(mut doc: PdfDocument) -> PdfDocument {
        PdfDocument::load(&doc.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_merge_keeps_input_order() {
        let merged = PdfDocument::merge(vec![load(&[101, 102]), load(&[201, 202, 203])]).unwrap();
        let merged = reload(merged);
        assert_eq!(merged.page_count(), 5);
        assert_eq!(
            fixtures::page_widths(merged.document()),
            vec![101, 102, 201, 202, 203]
        );
    }

    #[test]
    fn test_merge_needs_two_documents() {
        let err = PdfDocument::merge(vec![load(&[100])]).unwrap_err();
        assert!(matches!(err, ProcessingError::InsufficientInputs(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_split_preserves_requested_order() {
        let split = load(&[100, 101, 102, 103, 104]).split(&[3, 0, 1]).unwrap();
        let split = reload(split);
        assert_eq!(fixtures::page_widths(split.document()), vec![103, 100, 101]);
    }

    #[test]
    fn test_split_drops_out_of_range_and_allows_duplicates() {
        let split = load(&[100, 101]).split(&[1, 7, 1, 0]).unwrap();
        assert_eq!(fixtures::page_widths(split.document()), vec![101, 101, 100]);
    }

    #[test]
    fn test_rotate_delete() {
        let delete = BTreeSet::from([1]);
        let out = load(&[100, 101, 102])
            .rotate_delete(Rotation::from_degrees(90), &delete)
            .unwrap();
        let out = reload(out);
        assert_eq!(fixtures::page_widths(out.document()), vec![100, 102]);
        assert_eq!(out.page_rotations(), vec![90, 90]);
    }

    #[test]
    fn test_rotation_is_absolute() {
        let once = load(&[100])
            .rotate_delete(Some(Rotation::Deg90), &BTreeSet::new())
            .unwrap();
        let twice = once
            .rotate_delete(Some(Rotation::Deg90), &BTreeSet::new())
            .unwrap();
        assert_eq!(twice.page_rotations(), vec![90]);

        let kept = twice
            .rotate_delete(Some(Rotation::Deg0), &BTreeSet::new())
            .unwrap();
        assert_eq!(kept.page_rotations(), vec![90]);
    }

    #[test]
    fn test_strip_metadata() {
        let mut source = fixtures::document(&[100, 101]);
        let info = source.add_object(dictionary! {
            "Title" => Object::string_literal("Quarterly report"),
        });
        source.trailer.set("Info", info);

        let stripped = PdfDocument::from_document(source).strip_metadata().unwrap();
        let stripped = reload(stripped);
        assert!(!stripped.document().trailer.has(b"Info"));
        assert_eq!(stripped.page_count(), 2);
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let mut doc = load(&[100, 101, 102]).copy_pages().unwrap();
        doc.encrypt("s3cret").unwrap();
        assert!(doc.is_encrypted());
        let bytes = doc.to_bytes().unwrap();

        assert!(PdfDocument::load(&bytes).is_err());
        assert!(matches!(
            PdfDocument::load_with_password(&bytes, "wrong"),
            Err(ProcessingError::DecryptionFailed(_))
        ));

        let decrypted = PdfDocument::load_with_password(&bytes, "s3cret").unwrap();
        let decrypted = reload(decrypted.copy_pages().unwrap());
        assert!(!decrypted.is_encrypted());
        assert_eq!(fixtures::page_widths(decrypted.document()), vec![100, 101, 102]);
    }

    #[test]
    fn test_decrypt_accepts_plain_documents() {
        let bytes = fixtures::pdf_bytes(&[100]);
        let doc = PdfDocument::load_with_password(&bytes, "anything").unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_garbage_input() {
        assert!(PdfDocument::load(b"%PDF-1.7 but not really").is_err());
        assert!(matches!(
            PdfDocument::load_with_password(b"nope", "pw"),
            Err(ProcessingError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg180.degrees(), 180);
    }
}
