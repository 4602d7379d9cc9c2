//! Exported data lookup with a per-slug post cache.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use novablog_content::{sort_newest_first, CatalogEntry, PostRecord};

use crate::reading::reading_time;

/// Number of related posts returned when the caller has no preference.
pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// A post as the client shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub record: PostRecord,

    #[serde(
        rename = "readingTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reading_time: Option<String>,
}

/// How many published posts carry a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Errors that can occur when reading exported data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Blog post '{0}' not found")]
    NotFound(String),

    #[error("Blog post '{0}' is not published")]
    NotPublished(String),

    #[error("Invalid slug {0:?}")]
    InvalidSlug(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reader over an export output directory.
#[derive(Debug)]
pub struct BlogStore {
    data_dir: PathBuf,

    /// Loaded posts by slug
    cache: HashMap<String, Post>,
}

impl BlogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Published posts, newest first.
    pub fn posts(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let path = self.data_dir.join("posts.json");
        let mut entries: Vec<CatalogEntry> = read_json(&path)?;

        entries.retain(|e| e.published);
        sort_newest_first(&mut entries);

        Ok(entries)
    }

    /// One post by slug, loaded once and then served from the cache.
    pub fn post(&mut self, slug: &str) -> Result<&Post, CatalogError> {
        if !self.cache.contains_key(slug) {
            let post = self.load_post(slug)?;
            self.cache.insert(slug.to_string(), post);
        }

        Ok(&self.cache[slug])
    }

    fn load_post(&self, slug: &str) -> Result<Post, CatalogError> {
        if slug.is_empty() || slug.contains(['/', '\\']) || slug == "." || slug == ".." {
            return Err(CatalogError::InvalidSlug(slug.to_string()));
        }

        let path = self.data_dir.join("posts").join(format!("{slug}.json"));
        let mut post: Post = match read_json(&path) {
            Err(CatalogError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(slug.to_string()));
            }
            other => other?,
        };

        if !post.record.published {
            return Err(CatalogError::NotPublished(slug.to_string()));
        }

        if post.reading_time.is_none() {
            post.reading_time = Some(reading_time(&post.record.content));
        }

        tracing::debug!("Loaded post {}", slug);

        Ok(post)
    }

    /// Other posts ranked by how many tags they share with `tags`.
    ///
    /// Posts sharing nothing still fill the list when there are not enough
    /// better matches.
    pub fn related(
        &self,
        slug: &str,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut scored: Vec<(usize, CatalogEntry)> = self
            .posts()?
            .into_iter()
            .filter(|e| e.slug != slug)
            .map(|e| (shared_tags(&e.tags, tags), e))
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored.into_iter().take(limit).map(|(_, e)| e).collect())
    }

    /// Posts carrying `tag` exactly.
    pub fn by_tag(&self, tag: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self
            .posts()?
            .into_iter()
            .filter(|e| e.tags.iter().any(|t| t == tag))
            .collect())
    }

    /// Posts whose title or summary contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let query = query.to_lowercase();

        Ok(self
            .posts()?
            .into_iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&query) || e.summary.to_lowercase().contains(&query)
            })
            .collect())
    }

    /// Tag counts, most used first; ties keep first-seen order.
    pub fn tags(&self) -> Result<Vec<TagCount>, CatalogError> {
        let mut counts: Vec<TagCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for entry in self.posts()? {
            for tag in entry.tags {
                match index.get(&tag) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(tag.clone(), counts.len());
                        counts.push(TagCount { tag, count: 1 });
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    /// The `n` most used tags.
    pub fn popular_tags(&self, n: usize) -> Result<Vec<TagCount>, CatalogError> {
        let mut tags = self.tags()?;
        tags.truncate(n);
        Ok(tags)
    }

    /// Drop every cached post.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached posts.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn shared_tags(post_tags: &[String], wanted: &[String]) -> usize {
    post_tags.iter().filter(|t| wanted.contains(t)).count()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn entry(slug: &str, date: &str, tags: &[&str], published: bool) -> serde_json::Value {
        json!({
            "title": format!("Post {slug}"),
            "slug": slug,
            "date": date,
            "tags": tags,
            "summary": format!("About {slug}"),
            "cover": "",
            "published": published,
        })
    }

    fn data_dir() -> TempDir {
        let temp = tempdir().unwrap();
        let catalog = json!([
            entry("rust-intro", "2024-01-01", &["rust", "intro"], true),
            entry("async-rust", "2024-03-01", &["rust", "async"], true),
            entry("hidden", "2024-04-01", &["rust"], false),
            entry("cooking", "2024-02-01", &["food"], true),
            entry("tokio", "2024-02-15", &["rust", "async", "tokio"], true),
        ]);
        fs::write(
            temp.path().join("posts.json"),
            serde_json::to_string_pretty(&catalog).unwrap(),
        )
        .unwrap();

        let posts = temp.path().join("posts");
        fs::create_dir_all(&posts).unwrap();
        let mut detail = entry("rust-intro", "2024-01-01", &["rust"], true);
        detail["content"] = json!("word ".repeat(450));
        detail["html"] = json!("<p>...</p>");
        fs::write(posts.join("rust-intro.json"), detail.to_string()).unwrap();

        let mut draft = entry("hidden", "2024-04-01", &["rust"], false);
        draft["content"] = json!("secret");
        draft["html"] = json!("");
        fs::write(posts.join("hidden.json"), draft.to_string()).unwrap();

        temp
    }

    fn slugs(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.slug.as_str()).collect()
    }

    #[test]
    fn lists_published_posts_newest_first() {
        let temp = data_dir();
        let store = BlogStore::new(temp.path());

        let posts = store.posts().unwrap();

        assert_eq!(
            slugs(&posts),
            vec!["async-rust", "tokio", "cooking", "rust-intro"]
        );
    }

    #[test]
    fn loads_and_caches_posts() {
        let temp = data_dir();
        let mut store = BlogStore::new(temp.path());

        let post = store.post("rust-intro").unwrap();
        assert_eq!(post.record.title, "Post rust-intro");
        assert_eq!(post.reading_time.as_deref(), Some("3 min read"));
        assert_eq!(store.cached(), 1);

        fs::remove_file(temp.path().join("posts").join("rust-intro.json")).unwrap();
        assert!(store.post("rust-intro").is_ok());

        store.clear_cache();
        assert_eq!(store.cached(), 0);
        assert!(matches!(
            store.post("rust-intro"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn missing_post_is_not_found() {
        let temp = data_dir();
        let mut store = BlogStore::new(temp.path());

        assert!(matches!(store.post("nope"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn unpublished_post_is_rejected() {
        let temp = data_dir();
        let mut store = BlogStore::new(temp.path());

        assert!(matches!(
            store.post("hidden"),
            Err(CatalogError::NotPublished(_))
        ));
        assert_eq!(store.cached(), 0);
    }

    #[test]
    fn rejects_path_like_slugs() {
        let temp = data_dir();
        let mut store = BlogStore::new(temp.path());

        assert!(matches!(
            store.post("../posts"),
            Err(CatalogError::InvalidSlug(_))
        ));
    }

    #[test]
    fn related_posts_rank_by_shared_tags() {
        let temp = data_dir();
        let store = BlogStore::new(temp.path());
        let tags = vec!["rust".to_string(), "async".to_string()];

        let related = store.related("async-rust", &tags, DEFAULT_RELATED_LIMIT).unwrap();

        assert_eq!(slugs(&related), vec!["tokio", "rust-intro", "cooking"]);
    }

    #[test]
    fn filters_by_tag_and_query() {
        let temp = data_dir();
        let store = BlogStore::new(temp.path());

        assert_eq!(
            slugs(&store.by_tag("async").unwrap()),
            vec!["async-rust", "tokio"]
        );
        assert_eq!(slugs(&store.search("COOK").unwrap()), vec!["cooking"]);
        assert_eq!(
            slugs(&store.search("about rust").unwrap()),
            vec!["rust-intro"]
        );
    }

    #[test]
    fn counts_tags_of_published_posts() {
        let temp = data_dir();
        let store = BlogStore::new(temp.path());

        let tags = store.tags().unwrap();

        assert_eq!(
            tags[0],
            TagCount {
                tag: "rust".to_string(),
                count: 3
            }
        );
        assert_eq!(tags[1].tag, "async");
        assert_eq!(tags[1].count, 2);
        assert_eq!(store.popular_tags(2).unwrap().len(), 2);
    }

    #[test]
    fn missing_catalog_is_a_read_error() {
        let temp = tempdir().unwrap();
        let store = BlogStore::new(temp.path());

        assert!(matches!(store.posts(), Err(CatalogError::Read { .. })));
    }
}
