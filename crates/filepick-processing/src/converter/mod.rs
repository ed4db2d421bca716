//! External converters: LibreOffice for office documents, FFmpeg for audio/video.
//!
//! Each conversion writes the upload into a private temp directory, runs the tool there
//! and reads the produced file back. The directory is removed when the call returns.

pub mod media;
pub mod office;

pub use media::MediaTranscoder;
pub use office::{OfficeConverter, OfficeFormat};

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("Expected a {expected} file, got '{filename}'")]
    UnsupportedExtension {
        expected: &'static str,
        filename: String,
    },

    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    #[error("{tool} produced no output file")]
    MissingOutput { tool: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Rejections of the upload itself, as opposed to conversion failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConverterError::UnsupportedExtension { .. })
    }
}

/// Lower-cased extension check, `extensions` without the dot.
fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Run `binary` with `args`, returning its stderr on a non-zero exit.
async fn run_tool(tool: &'static str, binary: &str, args: &[String]) -> Result<(), ConverterError> {
    tracing::debug!(tool, binary, ?args, "Running converter");

    let output = Command::new(binary)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| ConverterError::Spawn { tool, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConverterError::ToolFailed {
            tool,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(all(test, unix))]
pub(crate) mod fake_tool {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for an external tool.
    pub fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
