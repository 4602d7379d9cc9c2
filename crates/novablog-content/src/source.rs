//! Markdown source discovery and reading.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extension of the notes picked up by discovery.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// A note read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub raw: String,
}

impl SourceDocument {
    /// File name without the `.md` suffix.
    pub fn stem(&self) -> String {
        self.path
            .file_name()
            .map(|n| {
                let name = n.to_string_lossy();
                name.strip_suffix(MARKDOWN_SUFFIX)
                    .unwrap_or(&*name)
                    .to_string()
            })
            .unwrap_or_default()
    }
}

/// Errors raised while reading sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Content directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Failed to read content directory {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// List every `.md` file below `root`, in directory listing order.
///
/// Symlinks are followed. A missing or unreadable root, or an unreadable
/// directory below it, is an error. Symlink loops and dangling links are
/// logged and skipped.
pub fn discover_markdown(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !root.exists() {
        return Err(SourceError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(SourceError::RootUnreadable {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) if is_skippable(&e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => {
                return Err(SourceError::DirectoryUnreadable {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    source: e,
                });
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if entry
            .file_name()
            .to_string_lossy()
            .ends_with(MARKDOWN_SUFFIX)
        {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Found {} markdown files in {}", files.len(), root.display());

    Ok(files)
}

/// Loops and links pointing nowhere; anything else means part of the tree
/// could not be listed.
fn is_skippable(error: &walkdir::Error) -> bool {
    if error.loop_ancestor().is_some() {
        return true;
    }

    let dangling = error
        .path()
        .is_some_and(|p| p.is_symlink() && fs::metadata(p).is_err());
    dangling || error.io_error().is_none()
}

/// Read one note as UTF-8 text.
pub fn read_document(path: &Path) -> Result<SourceDocument, SourceError> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SourceDocument {
        path: path.to_path_buf(),
        raw,
    })
}
