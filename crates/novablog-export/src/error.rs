//! Export errors.

use std::path::PathBuf;

use novablog_content::{FrontmatterError, SourceError};

/// A problem confined to one note. The run continues unless strict.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Read(#[from] SourceError),

    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error("Invalid slug {0:?}: must be a single non-empty path segment")]
    InvalidSlug(String),

    #[error("Failed to copy asset {name}: {source}")]
    Asset {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that stop an export run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {0}: {1}")]
    Serialize(String, #[source] serde_json::Error),

    #[error("{path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}
