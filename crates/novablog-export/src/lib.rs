//! Markdown notes to JSON export for NovaBlog.
//!
//! Walks a folder of notes, keeps the published ones, copies the images they
//! reference, and writes one JSON file per post plus a `posts.json` catalog
//! sorted newest first.

pub mod assemble;
pub mod assets;
pub mod catalog;
pub mod error;
pub mod exporter;

pub use assemble::{assemble, derive_slug, Assembled};
pub use assets::{AssetCopier, CopyOutcome};
pub use catalog::{Catalog, CatalogWriter, CATALOG_FILE, POSTS_DIR};
pub use error::{DocumentError, ExportError};
pub use exporter::{ExportConfig, ExportSummary, Exporter, FailedDocument};
