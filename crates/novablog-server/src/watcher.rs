//! File watching for re-export.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Markdown note was modified
    NoteModified(PathBuf),

    /// Any other file was modified (images, attachments)
    AssetModified(PathBuf),

    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::NoteModified(p) | Self::AssetModified(p) | Self::Created(p) | Self::Deleted(p) => {
                p
            }
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Paths that do not exist are skipped, and changes below any `ignored`
    /// directory are dropped. Events are batched until the watched tree has
    /// been quiet for the debounce window. Returns the watcher and a channel
    /// to receive events; dropping the watcher closes the channel.
    pub fn new(
        paths: &[PathBuf],
        ignored: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        let ignored = ignored.to_vec();
        std::thread::spawn(move || {
            let mut pending: Vec<WatchEvent> = Vec::new();

            while let Ok(event) = sync_rx.recv() {
                collect(&mut pending, event, &ignored);

                // Trailing edge: flush once nothing arrived for a full window
                let disconnected = loop {
                    match sync_rx.recv_timeout(DEBOUNCE) {
                        Ok(event) => collect(&mut pending, event, &ignored),
                        Err(RecvTimeoutError::Timeout) => break false,
                        Err(RecvTimeoutError::Disconnected) => break true,
                    }
                };

                for e in pending.drain(..) {
                    if async_tx.blocking_send(e).is_err() {
                        return;
                    }
                }

                if disconnected {
                    return;
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Quiet period before a batch of changes is forwarded.
const DEBOUNCE: Duration = Duration::from_millis(100);

fn collect(pending: &mut Vec<WatchEvent>, event: notify::Event, ignored: &[PathBuf]) {
    for path in event.paths {
        if ignored.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        if let Some(e) = classify_event(&path, &event.kind) {
            if !pending.contains(&e) {
                pending.push(e);
            }
        }
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let is_note = path.extension().and_then(|e| e.to_str()) == Some("md");

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) if is_note => Some(WatchEvent::NoteModified(path.to_path_buf())),
        EventKind::Modify(_) => Some(WatchEvent::AssetModified(path.to_path_buf())),
        _ => None,
    }
}
