//! Export command.

use anyhow::{Context, Result};
use novablog_export::{ExportConfig, Exporter};

/// Run the export command.
pub fn run(config: ExportConfig) -> Result<()> {
    tracing::info!("Exporting notes from {}...", config.content_dir.display());

    let summary = Exporter::new(config)
        .run()
        .context("Export failed")?;

    for failed in &summary.failed {
        tracing::warn!("Skipped {}: {}", failed.path.display(), failed.message);
    }

    tracing::info!(
        "Exported {} posts in {}ms ({} unpublished, {} skipped with errors)",
        summary.exported,
        summary.duration_ms,
        summary.unpublished,
        summary.failed.len()
    );

    if summary.assets_missing > 0 {
        tracing::info!(
            "Copied {} images, {} referenced images not found",
            summary.assets_copied,
            summary.assets_missing
        );
    } else {
        tracing::info!("Copied {} images", summary.assets_copied);
    }

    tracing::info!("Output: {}", summary.output_dir.display());

    Ok(())
}
