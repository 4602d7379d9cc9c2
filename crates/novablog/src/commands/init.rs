//! Initialize a blog project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing novablog...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    let assets_dir = Path::new("content").join("assets");
    fs::create_dir_all(&assets_dir).context("Failed to create content directory")?;

    let first_post = Path::new("content").join("hello-world.md");
    if !first_post.exists() || yes {
        fs::write(&first_post, DEFAULT_POST).context("Failed to write hello-world.md")?;
        tracing::info!("Created {}", first_post.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'novablog export' to write public/data.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# NovaBlog configuration
#
# Every path can also be set with a flag or an environment variable
# (NOVABLOG_CONTENT_DIR, NOVABLOG_OUTPUT_DIR, NOVABLOG_ASSETS_SRC,
# NOVABLOG_ASSETS_DEST, NOVABLOG_ASSET_URL); flags win over the
# environment, which wins over this file.

[paths]
# Markdown notes, searched recursively
content = "content"

# Receives posts.json and posts/<slug>.json
output = "public/data"

# Images referenced by notes are looked up here...
assets_src = "content/assets"

# ...copied here...
assets_dest = "public/assets"

# ...and linked with this prefix
asset_url = "/assets"

[export]
# Stop at the first note that cannot be read or parsed
strict = false

[serve]
dir = "public"
port = 4000
"#;

const DEFAULT_POST: &str = r#"---
title: Hello World
date: 2024-01-01
tags: [meta]
summary: The first post.
published: true
---

# Hello World

Notes are exported only when `published` (or `是否发布`) is true.

Images can be embedded with `![[picture.png]]` or `![alt](path/picture.png)`;
files are looked up in `content/assets` and copied to `public/assets`.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn default_config_parses() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("novablog.toml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.paths.content, "content");
        assert_eq!(config.paths.asset_url, "/assets");
        assert_eq!(config.serve.port, 4000);
        assert!(!config.export.strict);
    }

    #[test]
    fn default_post_is_published() {
        let (fm, _) = novablog_content::split_frontmatter(DEFAULT_POST).unwrap();

        assert!(fm.is_published());
        assert_eq!(fm.tags(), vec!["meta".to_string()]);
    }
}
