//! Markdown notes for the NovaBlog exporter.
//!
//! This crate reads notes with YAML frontmatter, finds and rewrites image
//! references, renders bodies to HTML, and defines the JSON records the
//! blog client consumes.

pub mod frontmatter;
pub mod images;
pub mod record;
pub mod render;
pub mod source;

pub use frontmatter::{split_frontmatter, FrontMatter, FrontmatterError, PUBLISH_KEYS};
pub use images::{
    bracketed_name, resolve_images, rewrite_images, scan_images, web_path, ImageReference,
    ImageSyntax, ResolvedBody, ResolvedImage,
};
pub use record::{newest_first, parse_date, sort_newest_first, CatalogEntry, PostRecord};
pub use render::render_html;
pub use source::{discover_markdown, read_document, SourceDocument, SourceError};
