use crate::batch::{Artifact, ArtifactName, InputFile};
use crate::converter::{has_extension, run_tool, ConverterError};
use bytes::Bytes;
use std::path::Path;

const TOOL: &str = "soffice";

/// Office formats LibreOffice converts to PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeFormat {
    Docx,
    Ppt,
    Excel,
}

impl OfficeFormat {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            OfficeFormat::Docx => &["docx"],
            OfficeFormat::Ppt => &["ppt", "pptx"],
            OfficeFormat::Excel => &["xls", "xlsx"],
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            OfficeFormat::Docx => "docx-to-pdf",
            OfficeFormat::Ppt => "ppt-to-pdf",
            OfficeFormat::Excel => "excel-to-pdf",
        }
    }

    fn label(self) -> &'static str {
        match self {
            OfficeFormat::Docx => "DOCX",
            OfficeFormat::Ppt => "PPT/PPTX",
            OfficeFormat::Excel => "XLS/XLSX",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OfficeConverter {
    soffice_path: String,
}

impl OfficeConverter {
    pub fn new(soffice_path: impl Into<String>) -> Self {
        Self {
            soffice_path: soffice_path.into(),
        }
    }

    #[tracing::instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn to_pdf(
        &self,
        format: OfficeFormat,
        input: &InputFile,
    ) -> Result<Artifact, ConverterError> {
        if !has_extension(&input.filename, format.extensions()) {
            return Err(ConverterError::UnsupportedExtension {
                expected: format.label(),
                filename: input.filename.clone(),
            });
        }

        let workdir = tempfile::tempdir()?;
        // The output keeps the input's stem, so name the input ourselves
        let extension = Path::new(&input.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(format.extensions()[0])
            .to_lowercase();
        let source = workdir.path().join(format!("input.{}", extension));
        tokio::fs::write(&source, &input.data).await?;

        let args = vec![
            "--headless".to_string(),
            "--convert-to".to_string(),
            "pdf".to_string(),
            "--outdir".to_string(),
            workdir.path().to_string_lossy().to_string(),
            source.to_string_lossy().to_string(),
        ];
        run_tool(TOOL, &self.soffice_path, &args).await?;

        let converted = workdir.path().join("input.pdf");
        let data = match tokio::fs::read(&converted).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::MissingOutput { tool: TOOL });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(bytes = data.len(), "Converted office document to PDF");
        Ok(Artifact::new(
            Bytes::from(data),
            ArtifactName::unique("", "pdf"),
            "application/pdf",
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::converter::fake_tool;

    fn docx(name: &str) -> InputFile {
        InputFile::new(name, Bytes::from_static(b"PK\x03\x04 docx body"))
    }

    #[tokio::test]
    async fn test_rejects_wrong_extension() {
        let converter = OfficeConverter::new("soffice");
        let err = converter
            .to_pdf(OfficeFormat::Docx, &docx("notes.txt"))
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        let err = converter
            .to_pdf(OfficeFormat::Excel, &docx("sheet.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::UnsupportedExtension { .. }));
    }

    #[tokio::test]
    async fn test_reads_back_converted_pdf() {
        let bin = tempfile::tempdir().unwrap();
        let soffice = fake_tool::install(
            bin.path(),
            "soffice",
            r#"out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "--outdir" ]; then out="$2"; fi
  shift
done
name=$(basename "$1")
echo "converted pdf" > "$out/${name%.*}.pdf""#,
        );

        let converter = OfficeConverter::new(soffice.to_string_lossy());
        let artifact = converter
            .to_pdf(OfficeFormat::Ppt, &docx("deck.PPTX"))
            .await
            .unwrap();
        assert_eq!(artifact.content_type, "application/pdf");
        assert_eq!(&artifact.data[..], b"converted pdf\n");
        assert!(artifact.name.render().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_tool_failure_carries_stderr() {
        let bin = tempfile::tempdir().unwrap();
        let soffice =
            fake_tool::install(bin.path(), "soffice", "echo 'no office here' >&2\nexit 1");

        let err = OfficeConverter::new(soffice.to_string_lossy())
            .to_pdf(OfficeFormat::Docx, &docx("a.docx"))
            .await
            .unwrap_err();
        match err {
            ConverterError::ToolFailed { stderr, .. } => assert_eq!(stderr, "no office here"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_output() {
        let bin = tempfile::tempdir().unwrap();
        let soffice = fake_tool::install(bin.path(), "soffice", "exit 0");

        let err = OfficeConverter::new(soffice.to_string_lossy())
            .to_pdf(OfficeFormat::Docx, &docx("a.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::MissingOutput { .. }));
    }
}
