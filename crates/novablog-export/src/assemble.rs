//! Building a post record from a parsed note.

use chrono::NaiveDate;

use novablog_content::{bracketed_name, web_path, FrontMatter, PostRecord, ResolvedBody};

use crate::error::DocumentError;

/// A post record plus the cover asset that still has to be copied.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub record: PostRecord,

    /// File name of a bracketed cover, relative to the asset source
    pub cover_asset: Option<String>,
}

/// Slug from frontmatter, else the file stem.
///
/// The slug names an output file, so it must be one plain path segment.
pub fn derive_slug(front_matter: &FrontMatter, stem: &str) -> Result<String, DocumentError> {
    let slug = front_matter.slug().unwrap_or_else(|| stem.to_string());

    let valid = !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
        && !slug.chars().any(char::is_control);

    if valid {
        Ok(slug)
    } else {
        Err(DocumentError::InvalidSlug(slug))
    }
}

/// Merge frontmatter with the rewritten body.
///
/// Missing fields fall back: title to the slug, date to `today`, tags and
/// summary to empty. The cover is, in order: a bracketed frontmatter value
/// resolved to a web path, a plain frontmatter value as written, the first
/// body image, or empty.
pub fn assemble(
    stem: &str,
    front_matter: &FrontMatter,
    resolved: ResolvedBody,
    html: String,
    today: NaiveDate,
    asset_url: &str,
) -> Result<Assembled, DocumentError> {
    let slug = derive_slug(front_matter, stem)?;

    let (cover, cover_asset) = match front_matter.cover() {
        Some(raw) => match bracketed_name(&raw) {
            Some(name) => (web_path(asset_url, &name), Some(name)),
            None if raw.contains("[[") && raw.contains("]]") => (String::new(), None),
            None => (raw, None),
        },
        None => (resolved.first_image().unwrap_or_default().to_string(), None),
    };

    let record = PostRecord {
        title: front_matter.title().unwrap_or_else(|| slug.clone()),
        date: front_matter
            .date()
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        tags: front_matter.tags(),
        cover,
        summary: front_matter.summary().unwrap_or_default(),
        content: resolved.content,
        html,
        published: true,
        slug,
    };

    Ok(Assembled {
        record,
        cover_asset,
    })
}
