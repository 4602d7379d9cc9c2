//! Layered configuration: flag, then environment, then `novablog.toml`,
//! then built-in defaults.
//!
//! Flags and environment variables are both handled by clap (`env = ...`),
//! so a value arriving here as `Some` already won over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use novablog_export::ExportConfig;

/// Configuration file structure (novablog.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub serve: ServeSettings,
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content")]
    pub content: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_assets_src")]
    pub assets_src: String,
    #[serde(default = "default_assets_dest")]
    pub assets_dest: String,
    #[serde(default = "default_asset_url")]
    pub asset_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            output: default_output(),
            assets_src: default_assets_src(),
            assets_dest: default_assets_dest(),
            asset_url: default_asset_url(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportSettings {
    /// Abort on the first broken note
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct ServeSettings {
    #[serde(default = "default_public_dir")]
    pub dir: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            dir: default_public_dir(),
            port: default_port(),
        }
    }
}

fn default_content() -> String {
    "content".to_string()
}
fn default_output() -> String {
    "public/data".to_string()
}
fn default_assets_src() -> String {
    "content/assets".to_string()
}
fn default_assets_dest() -> String {
    "public/assets".to_string()
}
fn default_asset_url() -> String {
    "/assets".to_string()
}
fn default_public_dir() -> String {
    "public".to_string()
}
fn default_port() -> u16 {
    4000
}

/// Load configuration from the given file if it exists.
/// Returns an error if the file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

/// Export paths given on the command line or in the environment.
#[derive(Debug, Args, Default, Clone)]
pub struct PathArgs {
    /// Markdown notes directory
    #[arg(long = "content", env = "NOVABLOG_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Output directory for posts.json and posts/
    #[arg(long = "output", env = "NOVABLOG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory images are read from
    #[arg(long, env = "NOVABLOG_ASSETS_SRC")]
    pub assets_src: Option<PathBuf>,

    /// Directory images are copied to
    #[arg(long, env = "NOVABLOG_ASSETS_DEST")]
    pub assets_dest: Option<PathBuf>,

    /// Public URL prefix of the copied images
    #[arg(long, env = "NOVABLOG_ASSET_URL")]
    pub asset_url: Option<String>,
}

impl PathArgs {
    /// Fill unset values from the config file.
    pub fn resolve(self, file: &ConfigFile, strict: bool) -> ExportConfig {
        let paths = &file.paths;

        ExportConfig {
            content_dir: self
                .content_dir
                .unwrap_or_else(|| PathBuf::from(&paths.content)),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(&paths.output)),
            assets_src: self
                .assets_src
                .unwrap_or_else(|| PathBuf::from(&paths.assets_src)),
            assets_dest: self
                .assets_dest
                .unwrap_or_else(|| PathBuf::from(&paths.assets_dest)),
            asset_url: self.asset_url.unwrap_or_else(|| paths.asset_url.clone()),
            strict: strict || file.export.strict,
        }
    }
}
