//! Preview server command.

use std::path::PathBuf;

use anyhow::Result;
use novablog_export::ExportConfig;
use novablog_server::{PreviewConfig, PreviewServer};

/// Run the serve command.
pub async fn run(port: u16, dir: PathBuf, watch: bool, export: ExportConfig) -> Result<()> {
    if !watch && !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'novablog export' first or pass --watch.",
            dir.display()
        );
    }

    let config = PreviewConfig {
        public_dir: dir,
        port,
        watch,
        export,
        ..Default::default()
    };

    PreviewServer::new(config).start().await?;

    Ok(())
}
