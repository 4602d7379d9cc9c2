//! Preview server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use tokio::sync::mpsc::Receiver;
use tower_http::services::{ServeDir, ServeFile};

use novablog_export::{ExportConfig, Exporter};

use crate::watcher::{FileWatcher, WatchEvent};

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory served at `/`
    pub public_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Re-export when notes or attachments change
    pub watch: bool,

    /// Export used for the initial and watch-triggered runs
    pub export: ExportConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            port: 4000,
            host: "127.0.0.1".to_string(),
            watch: false,
            export: ExportConfig::default(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Static preview of the exported site.
pub struct PreviewServer {
    config: PreviewConfig,
}

impl PreviewServer {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Serve until the process is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address.clone()))?;

        let _watcher = if self.config.watch {
            Some(self.spawn_rebuilds().await?)
        } else {
            None
        };

        if !self.config.public_dir.exists() {
            return Err(ServerError::MissingDirectory(self.config.public_dir.clone()));
        }

        let app = router(&self.config.public_dir);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        tracing::info!(
            "Serving {} at http://{}",
            self.config.public_dir.display(),
            addr
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }

    /// Export once, then re-export on every change to notes or attachments.
    async fn spawn_rebuilds(&self) -> Result<FileWatcher, ServerError> {
        let exporter = Arc::new(Exporter::new(self.config.export.clone()));
        export_blocking(Arc::clone(&exporter)).await;

        let export = &self.config.export;
        let watch_paths = vec![absolute(&export.content_dir), absolute(&export.assets_src)];
        let ignored = vec![
            absolute(&export.output_dir),
            absolute(&export.assets_dest),
        ];

        let (watcher, rx) =
            FileWatcher::new(&watch_paths, &ignored)
                .map_err(|e| ServerError::WatchError(e.to_string()))?;

        tokio::spawn(rebuild_on_change(rx, exporter));

        Ok(watcher)
    }
}

/// Static files, with `index.html` as the not-found page when present so
/// client-side routes load the app.
fn router(public_dir: &Path) -> Router {
    let index = public_dir.join("index.html");

    if index.is_file() {
        Router::new()
            .fallback_service(ServeDir::new(public_dir).not_found_service(ServeFile::new(index)))
    } else {
        Router::new().fallback_service(ServeDir::new(public_dir))
    }
}

async fn rebuild_on_change(mut rx: Receiver<WatchEvent>, exporter: Arc<Exporter>) {
    while let Some(event) = rx.recv().await {
        tracing::info!("Changed: {}", event.path().display());

        // One export covers the rest of the batch
        while let Ok(event) = rx.try_recv() {
            tracing::debug!("Changed: {}", event.path().display());
        }

        export_blocking(Arc::clone(&exporter)).await;
    }
}

async fn export_blocking(exporter: Arc<Exporter>) {
    match tokio::task::spawn_blocking(move || exporter.run()).await {
        Ok(Ok(summary)) => {
            tracing::info!(
                "Exported {} posts ({} skipped) in {}ms",
                summary.exported,
                summary.failed.len(),
                summary.duration_ms
            );
        }
        Ok(Err(e)) => tracing::warn!("Export failed: {}", e),
        Err(e) => tracing::warn!("Export task panicked: {}", e),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creates_server_with_default_config() {
        let server = PreviewServer::new(PreviewConfig::default());

        assert_eq!(server.config().port, 4000);
        assert!(!server.config().watch);
    }

    #[tokio::test]
    async fn initial_export_runs_before_watching() {
        let temp = tempdir().unwrap();
        let content = temp.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("hello.md"), "---\npublished: true\n---\nhi").unwrap();

        let config = PreviewConfig {
            public_dir: temp.path().join("public"),
            watch: true,
            export: ExportConfig {
                content_dir: content.clone(),
                output_dir: temp.path().join("public").join("data"),
                assets_src: content.join("assets"),
                assets_dest: temp.path().join("public").join("assets"),
                ..Default::default()
            },
            ..Default::default()
        };

        let watcher = PreviewServer::new(config).spawn_rebuilds().await.unwrap();

        assert!(temp.path().join("public/data/posts/hello.json").exists());
        drop(watcher);
    }

    #[tokio::test]
    async fn invalid_host_is_rejected() {
        let server = PreviewServer::new(PreviewConfig {
            host: "not a host".to_string(),
            ..Default::default()
        });

        assert!(matches!(
            server.start().await,
            Err(ServerError::InvalidAddress(_))
        ));
    }
}
