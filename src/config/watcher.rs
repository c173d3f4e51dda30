//! Configuration file watcher for hot reload.
//!
//! The directory holding the config file is watched rather than the file
//! itself: editors that save by writing a temporary file and renaming it over
//! the original replace the inode, and a watch on the old inode goes quiet.
//! Events for other files in the directory are ignored.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Watches a gateway config file and sends every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path);
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| {
                notify::Error::generic("config path has no file name")
                    .add_path(self.path.clone())
            })?;

        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_config_event(&event, &file_name) => {
                    tracing::info!(path = ?path, kind = ?event.kind, "Config file change detected, reloading");
                    if let Some(new_config) = reload(&path) {
                        let _ = tx.send(new_config);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Load and validate the config at `path`, logging the failure if it is
/// rejected.
pub fn reload(path: &Path) -> Option<GatewayConfig> {
    match load_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!(
                path = ?path,
                error = %e,
                "Failed to reload config, keeping current rewrite rules"
            );
            None
        }
    }
}

/// Directory to watch for `path`; a bare file name lives in the working
/// directory.
fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` may have changed the file called `file_name`.
///
/// Renames are modify events in notify, so a rename onto the config file
/// counts.
fn is_config_event(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
