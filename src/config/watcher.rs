use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{info, warn};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;

use crate::error::{AppError, Result};

use super::{loader::load_config, Config};

/// Keeps the active configuration in sync with its file on disk.
///
/// Subscribers receive the new [`Config`] after every successful reload. Edits
/// that fail to parse are logged and the previous config stays active; range
/// checks are left to the subscriber, which may still apply overrides.
pub struct ConfigWatcher {
    path: PathBuf,
    updates_tx: watch::Sender<Arc<Config>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, initial: Config) -> Self {
        let (updates_tx, _) = watch::channel(Arc::new(initial));
        Self {
            path: path.into(),
            updates_tx,
            watcher: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to config updates. The receiver starts at the current config.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.updates_tx.subscribe()
    }

    pub fn current(&self) -> Arc<Config> {
        self.updates_tx.borrow().clone()
    }

    /// Reload from disk. Returns `true` when the loaded config differs from the active one.
    pub fn refresh(&self) -> Result<bool> {
        let config = load_config(&self.path)?;
        let changed = self.updates_tx.send_if_modified(|current| {
            if **current == config {
                false
            } else {
                *current = Arc::new(config);
                true
            }
        });
        Ok(changed)
    }

    /// Begin watching the config file's directory. Multiple invocations are no-ops.
    pub fn start_watching(self: &Arc<Self>) -> Result<()> {
        let mut slot = self
            .watcher
            .lock()
            .map_err(|_| AppError::message("config watcher lock poisoned"))?;
        if slot.is_some() {
            return Ok(());
        }

        let watched_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        let this = Arc::clone(self);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) if is_relevant_event(&event.kind) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|path| path.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_config {
                        return;
                    }
                    match this.refresh() {
                        Ok(true) => info!("Reloaded configuration from {}", this.path.display()),
                        Ok(false) => {}
                        Err(err) => warn!(
                            "Ignoring config change in {}: {err}",
                            this.path.display()
                        ),
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("Config watch error: {err}"),
            })
            .map_err(|err| AppError::message(format!("Failed to start watcher: {err}")))?;

        watcher
            .watch(&watched_dir, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::message(format!(
                    "Failed to watch config directory {}: {err}",
                    watched_dir.display()
                ))
            })?;
        *slot = Some(watcher);
        Ok(())
    }
}

fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other
    )
}
