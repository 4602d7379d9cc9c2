//! Writing post JSON files and the catalog list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use novablog_content::{sort_newest_first, CatalogEntry, PostRecord};

use crate::error::ExportError;

/// File name of the catalog list inside the output directory.
pub const CATALOG_FILE: &str = "posts.json";

/// Directory holding one JSON file per post.
pub const POSTS_DIR: &str = "posts";

/// Catalog entries collected during a run, unique by slug.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A previous entry with the same slug is dropped and
    /// `true` is returned.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.slug != entry.slug);
        let replaced = self.entries.len() != before;
        self.entries.push(entry);
        replaced
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by date, newest first.
    pub fn into_sorted(mut self) -> Vec<CatalogEntry> {
        sort_newest_first(&mut self.entries);
        self.entries
    }
}

/// Writes export output below one directory.
#[derive(Debug, Clone)]
pub struct CatalogWriter {
    output_dir: PathBuf,
}

impl CatalogWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of a post's JSON file.
    pub fn post_path(&self, slug: &str) -> PathBuf {
        self.output_dir.join(POSTS_DIR).join(format!("{slug}.json"))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir.join(CATALOG_FILE)
    }

    /// Create the output directories.
    pub fn prepare(&self) -> Result<(), ExportError> {
        let posts_dir = self.output_dir.join(POSTS_DIR);
        fs::create_dir_all(&posts_dir).map_err(|source| ExportError::Write {
            path: posts_dir,
            source,
        })
    }

    /// Write `posts/<slug>.json`, replacing any previous file.
    pub fn write_post(&self, record: &PostRecord) -> Result<PathBuf, ExportError> {
        let path = self.post_path(&record.slug);
        write_json(&path, record)?;
        Ok(path)
    }

    /// Write `posts.json` with the given entries in order.
    pub fn write_catalog(&self, entries: &[CatalogEntry]) -> Result<PathBuf, ExportError> {
        let path = self.catalog_path();
        write_json(&path, entries)?;
        Ok(path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ExportError::Serialize(path.display().to_string(), e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
