//! The export pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};

use novablog_content::{
    discover_markdown, read_document, render_html, resolve_images, split_frontmatter, PostRecord,
};

use crate::assemble::assemble;
use crate::assets::AssetCopier;
use crate::catalog::{Catalog, CatalogWriter};
use crate::error::{DocumentError, ExportError};

/// Configuration for an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Root of the markdown notes
    pub content_dir: PathBuf,

    /// Directory receiving `posts.json` and `posts/`
    pub output_dir: PathBuf,

    /// Directory images are looked up in
    pub assets_src: PathBuf,

    /// Directory images are copied to
    pub assets_dest: PathBuf,

    /// Public URL prefix of `assets_dest`
    pub asset_url: String,

    /// Abort on the first note that fails instead of skipping it
    pub strict: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("public/data"),
            assets_src: PathBuf::from("content/assets"),
            assets_dest: PathBuf::from("public/assets"),
            asset_url: "/assets".to_string(),
            strict: false,
        }
    }
}

/// A note that was skipped because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub message: String,
}

/// Result of an export run.
#[derive(Debug)]
pub struct ExportSummary {
    /// Posts in the catalog
    pub exported: usize,

    /// Notes without a publish flag
    pub unpublished: usize,

    /// Notes skipped because of errors
    pub failed: Vec<FailedDocument>,

    /// Distinct assets copied
    pub assets_copied: usize,

    /// Image references whose source file does not exist
    pub assets_missing: usize,

    pub duration_ms: u64,

    pub output_dir: PathBuf,
}

/// Runs the export: one note at a time, catalog last.
pub struct Exporter {
    config: ExportConfig,
    today: Option<NaiveDate>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            today: None,
        }
    }

    /// Fix the date used for notes without one.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export every published note.
    pub fn run(&self) -> Result<ExportSummary, ExportError> {
        let start = Instant::now();
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());

        let files = discover_markdown(&self.config.content_dir)?;
        tracing::info!(
            "Exporting {} notes from {}",
            files.len(),
            self.config.content_dir.display()
        );

        let writer = CatalogWriter::new(&self.config.output_dir);
        writer.prepare()?;
        fs::create_dir_all(&self.config.assets_dest).map_err(|source| ExportError::Write {
            path: self.config.assets_dest.clone(),
            source,
        })?;

        let mut copier = AssetCopier::new(&self.config.assets_src, &self.config.assets_dest);
        let mut catalog = Catalog::new();
        let mut unpublished = 0;
        let mut failed = Vec::new();

        for path in &files {
            match self.export_document(path, today, &mut copier, &writer) {
                Ok(Some(record)) => {
                    if catalog.insert(record.entry()) {
                        tracing::warn!(
                            "Duplicate slug '{}': {} replaces an earlier post",
                            record.slug,
                            path.display()
                        );
                    }
                }
                Ok(None) => unpublished += 1,
                Err(ExportError::Document { path, source }) if !self.config.strict => {
                    tracing::warn!("Skipping {}: {}", path.display(), source);
                    failed.push(FailedDocument {
                        path,
                        message: source.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let exported = catalog.len();
        writer.write_catalog(&catalog.into_sorted())?;

        Ok(ExportSummary {
            exported,
            unpublished,
            failed,
            assets_copied: copier.copied(),
            assets_missing: copier.missing(),
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Export one note. Returns `None` when it is not published.
    fn export_document(
        &self,
        path: &Path,
        today: NaiveDate,
        copier: &mut AssetCopier,
        writer: &CatalogWriter,
    ) -> Result<Option<PostRecord>, ExportError> {
        let document_error = |source: DocumentError| ExportError::Document {
            path: path.to_path_buf(),
            source,
        };

        let doc = read_document(path).map_err(|e| document_error(e.into()))?;
        let (front_matter, body) =
            split_frontmatter(&doc.raw).map_err(|e| document_error(e.into()))?;

        if !front_matter.is_published() {
            tracing::debug!("Not published: {}", path.display());
            return Ok(None);
        }

        let (resolved, refs) = resolve_images(body, &self.config.asset_url);
        for reference in &refs {
            copy_asset(copier, &reference.file_name).map_err(document_error)?;
        }

        let html = render_html(&resolved.content);

        let assembled = assemble(
            &doc.stem(),
            &front_matter,
            resolved,
            html,
            today,
            &self.config.asset_url,
        )
        .map_err(document_error)?;

        if let Some(cover) = &assembled.cover_asset {
            copy_asset(copier, cover).map_err(document_error)?;
        }

        writer.write_post(&assembled.record)?;
        tracing::debug!("Exported {} -> {}", path.display(), assembled.record.slug);

        Ok(Some(assembled.record))
    }
}

fn copy_asset(copier: &mut AssetCopier, name: &str) -> Result<(), DocumentError> {
    copier
        .copy(name)
        .map(|_| ())
        .map_err(|source| DocumentError::Asset {
            name: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use novablog_content::CatalogEntry;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    struct Site {
        _temp: TempDir,
        config: ExportConfig,
    }

    impl Site {
        fn new() -> Self {
            let temp = tempdir().unwrap();
            let root = temp.path();
            let config = ExportConfig {
                content_dir: root.join("vault"),
                output_dir: root.join("public").join("data"),
                assets_src: root.join("attachments"),
                assets_dest: root.join("public").join("assets"),
                asset_url: "/assets".to_string(),
                strict: false,
            };
            fs::create_dir_all(&config.content_dir).unwrap();
            fs::create_dir_all(&config.assets_src).unwrap();
            Self {
                _temp: temp,
                config,
            }
        }

        fn note(&self, name: &str, text: &str) -> &Self {
            let path = self.config.content_dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
            self
        }

        fn asset(&self, name: &str) -> &Self {
            fs::write(self.config.assets_src.join(name), name.as_bytes()).unwrap();
            self
        }

        fn export(&self) -> ExportSummary {
            self.exporter().run().unwrap()
        }

        fn exporter(&self) -> Exporter {
            Exporter::new(self.config.clone())
                .with_today(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        }

        fn post(&self, slug: &str) -> PostRecord {
            let path = self
                .config
                .output_dir
                .join("posts")
                .join(format!("{slug}.json"));
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
        }

        fn catalog(&self) -> Vec<CatalogEntry> {
            let text = fs::read_to_string(self.config.output_dir.join("posts.json")).unwrap();
            serde_json::from_str(&text).unwrap()
        }
    }

    #[test]
    fn exports_published_notes_only() {
        let site = Site::new();
        site.note("a.md", "---\ntitle: A\npublished: true\n---\nA body")
            .note("draft.md", "---\ntitle: Draft\n---\nnot yet")
            .note("plain.md", "no frontmatter at all")
            .note("cn.md", "---\n是否发布: true\n---\n中文");

        let summary = site.export();

        assert_eq!(summary.exported, 2);
        assert_eq!(summary.unpublished, 2);
        assert!(summary.failed.is_empty());
        assert!(!site.config.output_dir.join("posts/draft.json").exists());
        assert!(!site.config.output_dir.join("posts/plain.json").exists());
        let slugs: Vec<_> = site.catalog().into_iter().map(|e| e.slug).collect();
        assert!(slugs.contains(&"a".to_string()));
        assert!(slugs.contains(&"cn".to_string()));
        assert!(!slugs.contains(&"draft".to_string()));
    }

    #[test]
    fn bracketed_image_round_trip() {
        let site = Site::new();
        site.note("pics.md", "---\npublished: true\n---\nSee [[pic.png]]")
            .asset("pic.png");

        let summary = site.export();

        let post = site.post("pics");
        assert!(post.content.contains("![pic.png](/assets/pic.png)"));
        assert!(post.html.contains(r#"<img src="/assets/pic.png" alt="pic.png" />"#));
        assert!(site.config.assets_dest.join("pic.png").exists());
        assert_eq!(post.cover, "/assets/pic.png");
        assert_eq!(summary.assets_copied, 1);
    }

    #[test]
    fn standard_image_paths_are_flattened() {
        let site = Site::new();
        site.note("p.md", "---\npublished: true\n---\n![alt](sub/dir/photo.jpg)")
            .asset("photo.jpg");

        site.export();

        let post = site.post("p");
        assert_eq!(post.content, "![photo.jpg](/assets/photo.jpg)");
        assert!(site.config.assets_dest.join("photo.jpg").exists());
    }

    #[test]
    fn missing_asset_keeps_the_web_path() {
        let site = Site::new();
        site.note("p.md", "---\npublished: true\n---\n![[ghost.png]]");

        let summary = site.export();

        assert_eq!(site.post("p").content, "![ghost.png](/assets/ghost.png)");
        assert!(!site.config.assets_dest.join("ghost.png").exists());
        assert_eq!(summary.assets_missing, 1);
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn spaces_are_encoded_but_copies_keep_names() {
        let site = Site::new();
        site.note("p.md", "---\npublished: true\n---\n![[my pic.png]]")
            .asset("my pic.png");

        site.export();

        assert_eq!(site.post("p").content, "![my pic.png](/assets/my%20pic.png)");
        assert!(site.config.assets_dest.join("my pic.png").exists());
    }

    #[test]
    fn first_body_image_becomes_cover() {
        let site = Site::new();
        site.note(
            "p.md",
            "---\npublished: true\n---\n![one](a/first.png)\n\n![[second.png]]",
        );

        site.export();

        assert_eq!(site.post("p").cover, "/assets/first.png");
        assert_eq!(site.catalog()[0].cover, "/assets/first.png");
    }

    #[test]
    fn bracketed_cover_is_copied() {
        let site = Site::new();
        site.note(
            "p.md",
            "---\ncover: \"[[cover.jpg]]\"\npublished: true\n---\ntext",
        )
        .asset("cover.jpg");

        site.export();

        assert_eq!(site.post("p").cover, "/assets/cover.jpg");
        assert!(site.config.assets_dest.join("cover.jpg").exists());
    }

    #[test]
    fn catalog_is_sorted_newest_first() {
        let site = Site::new();
        site.note("jan.md", "---\ndate: 2024-01-01\npublished: true\n---\n")
            .note("mar.md", "---\ndate: 2024-03-01\npublished: true\n---\n")
            .note("feb.md", "---\ndate: 2024-02-01\npublished: true\n---\n");

        site.export();

        let dates: Vec<_> = site.catalog().into_iter().map(|e| e.date).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn duplicate_slugs_last_write_wins() {
        let site = Site::new();
        site.note("one.md", "---\nslug: same\ntitle: First\npublished: true\n---\n")
            .note("nested/two.md", "---\nslug: same\ntitle: Second\npublished: true\n---\n");

        let summary = site.export();

        // Enumeration order decides which one is "later"; find it from the walk.
        let files = discover_markdown(&site.config.content_dir).unwrap();
        let last = fs::read_to_string(files.last().unwrap()).unwrap();
        let expected = if last.contains("Second") { "Second" } else { "First" };

        assert_eq!(summary.exported, 1);
        assert_eq!(site.post("same").title, expected);
        let catalog = site.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].title, expected);
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let site = Site::new();
        site.note("p.md", "---\npublished: true\n---\n");

        site.export();

        assert_eq!(site.post("p").date, "2025-01-31");
    }

    #[test]
    fn export_is_idempotent() {
        let site = Site::new();
        site.note("a.md", "---\ndate: 2024-01-01\npublished: true\ntags: [x]\n---\n# A\n![[a.png]]")
            .note("b.md", "---\ndate: 2024-02-01\npublished: true\n---\nB")
            .asset("a.png");

        site.export();
        let catalog_first = fs::read(site.config.output_dir.join("posts.json")).unwrap();
        let post_first = fs::read(site.config.output_dir.join("posts/a.json")).unwrap();
        site.export();

        assert_eq!(
            fs::read(site.config.output_dir.join("posts.json")).unwrap(),
            catalog_first
        );
        assert_eq!(
            fs::read(site.config.output_dir.join("posts/a.json")).unwrap(),
            post_first
        );
    }

    #[test]
    fn bad_documents_are_skipped_and_reported() {
        let site = Site::new();
        site.note("good.md", "---\npublished: true\n---\nfine")
            .note("broken.md", "---\npublished: true\ntitle: [oops\n---\n")
            .note("unclosed.md", "---\npublished: true\n");

        let summary = site.export();

        assert_eq!(summary.exported, 1);
        assert_eq!(summary.failed.len(), 2);
        assert!(site.config.output_dir.join("posts/good.json").exists());
    }

    #[test]
    fn strict_mode_aborts_on_bad_document() {
        let mut site = Site::new();
        site.config.strict = true;
        site.note("broken.md", "---\npublished: true\ntitle: [oops\n---\n");

        let result = site.exporter().run();

        assert!(matches!(
            result,
            Err(ExportError::Document {
                source: DocumentError::Frontmatter(_),
                ..
            })
        ));
    }

    #[test]
    fn missing_content_dir_is_fatal() {
        let mut site = Site::new();
        site.config.content_dir = site.config.content_dir.join("missing");

        let result = site.exporter().run();

        assert!(matches!(result, Err(ExportError::Source(_))));
    }
}
