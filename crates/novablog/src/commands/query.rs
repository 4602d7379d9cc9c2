//! Catalog query commands.

use std::path::Path;

use anyhow::{Context, Result};
use novablog_catalog::BlogStore;
use novablog_content::CatalogEntry;

/// Print published posts, optionally filtered.
pub fn list(data: &Path, tag: Option<&str>, search: Option<&str>, json: bool) -> Result<()> {
    let store = BlogStore::new(data);

    let mut posts = match tag {
        Some(tag) => store.by_tag(tag)?,
        None => store.posts()?,
    };
    if let Some(query) = search {
        let matching: Vec<String> = store.search(query)?.into_iter().map(|e| e.slug).collect();
        posts.retain(|e| matching.contains(&e.slug));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else {
        print_entries(&posts);
    }

    Ok(())
}

/// Print one post.
pub fn show(data: &Path, slug: &str, json: bool) -> Result<()> {
    let mut store = BlogStore::new(data);
    let post = store
        .post(slug)
        .with_context(|| format!("Cannot show '{}'", slug))?;

    if json {
        println!("{}", serde_json::to_string_pretty(post)?);
        return Ok(());
    }

    let record = &post.record;
    println!("{}", record.title);
    println!(
        "{} · {}",
        record.date,
        post.reading_time.as_deref().unwrap_or_default()
    );
    if !record.tags.is_empty() {
        println!("tags: {}", record.tags.join(", "));
    }
    if !record.cover.is_empty() {
        println!("cover: {}", record.cover);
    }
    if !record.summary.is_empty() {
        println!("\n{}", record.summary);
    }
    println!("\n{}", record.content.trim());

    Ok(())
}

/// Print posts related to `slug` by shared tags.
pub fn related(data: &Path, slug: &str, limit: usize) -> Result<()> {
    let mut store = BlogStore::new(data);
    let tags = store
        .post(slug)
        .with_context(|| format!("Cannot find related posts for '{}'", slug))?
        .record
        .tags
        .clone();

    print_entries(&store.related(slug, &tags, limit)?);

    Ok(())
}

/// Print tag counts.
pub fn tags(data: &Path, top: Option<usize>) -> Result<()> {
    let store = BlogStore::new(data);
    let tags = match top {
        Some(n) => store.popular_tags(n)?,
        None => store.tags()?,
    };

    for tag in tags {
        println!("{:>4}  {}", tag.count, tag.tag);
    }

    Ok(())
}

fn print_entries(entries: &[CatalogEntry]) {
    if entries.is_empty() {
        tracing::info!("No posts");
        return;
    }

    for entry in entries {
        if entry.tags.is_empty() {
            println!("{}  {}  {}", entry.date, entry.slug, entry.title);
        } else {
            println!(
                "{}  {}  {}  [{}]",
                entry.date,
                entry.slug,
                entry.title,
                entry.tags.join(", ")
            );
        }
    }
}
