//! Local preview for NovaBlog.
//!
//! Serves the public directory and, when asked, watches the notes and
//! attachments and re-runs the export after every change.

pub mod server;
pub mod watcher;

pub use server::{PreviewConfig, PreviewServer, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
