//! Copying referenced images into the public asset directory.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What happened to one copy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Same name already copied during this run
    AlreadyCopied,
    /// No such file in the source directory; nothing is done
    Missing,
    /// Name would escape the destination directory
    Refused,
}

/// Copies assets by file name from a source to a destination directory.
///
/// Each name is copied at most once per copier. Destination files with the
/// same name are overwritten.
#[derive(Debug)]
pub struct AssetCopier {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    seen: HashSet<String>,
    missing: usize,
}

impl AssetCopier {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            seen: HashSet::new(),
            missing: 0,
        }
    }

    /// Copy `<source>/<file_name>` to `<dest>/<file_name>`.
    pub fn copy(&mut self, file_name: &str) -> io::Result<CopyOutcome> {
        if !is_contained(file_name) {
            tracing::warn!("Refusing to copy asset outside the asset directory: {}", file_name);
            return Ok(CopyOutcome::Refused);
        }

        if self.seen.contains(file_name) {
            return Ok(CopyOutcome::AlreadyCopied);
        }

        let source = self.source_dir.join(file_name);
        if !source.is_file() {
            tracing::debug!("Asset not found, skipping copy: {}", source.display());
            self.missing += 1;
            return Ok(CopyOutcome::Missing);
        }

        let dest = self.dest_dir.join(file_name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &dest)?;

        tracing::debug!("Copied asset {}", file_name);
        self.seen.insert(file_name.to_string());

        Ok(CopyOutcome::Copied)
    }

    /// Number of distinct assets copied.
    pub fn copied(&self) -> usize {
        self.seen.len()
    }

    /// Number of requests whose source file did not exist.
    pub fn missing(&self) -> usize {
        self.missing
    }
}

fn is_contained(file_name: &str) -> bool {
    !file_name.is_empty()
        && Path::new(file_name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
