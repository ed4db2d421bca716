use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How an output file is named when it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactName {
    /// `{uuid}{suffix}.{extension}`
    Unique { suffix: String, extension: String },
    /// `YYYYMMDD_HHMMSS_<4 hex>.{extension}`, UTC
    Timestamped { extension: String },
    /// `{stem}_{uuid}.{extension}`
    Derived { stem: String, extension: String },
}

impl ArtifactName {
    pub fn unique(suffix: impl Into<String>, extension: impl Into<String>) -> Self {
        ArtifactName::Unique {
            suffix: suffix.into(),
            extension: extension.into(),
        }
    }

    pub fn timestamped(extension: impl Into<String>) -> Self {
        ArtifactName::Timestamped {
            extension: extension.into(),
        }
    }

    /// Path separators in `stem` are replaced so the name stays a single key segment.
    pub fn derived(stem: impl Into<String>, extension: impl Into<String>) -> Self {
        let stem: String = stem
            .into()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        ArtifactName::Derived {
            stem,
            extension: extension.into(),
        }
    }

    /// Fresh file name; every call produces a different one.
    pub fn render(&self) -> String {
        self.render_at(Utc::now(), Uuid::new_v4())
    }

    pub fn render_at(&self, now: DateTime<Utc>, id: Uuid) -> String {
        match self {
            ArtifactName::Unique { suffix, extension } => {
                format!("{}{}.{}", id, suffix, extension)
            }
            ArtifactName::Timestamped { extension } => {
                let hex = id.simple().to_string();
                format!("{}_{}.{}", now.format("%Y%m%d_%H%M%S"), &hex[..4], extension)
            }
            ArtifactName::Derived { stem, extension } => {
                format!("{}_{}.{}", stem, id, extension)
            }
        }
    }
}
