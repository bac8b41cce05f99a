// src/watch/watcher.rs

use std::path::PathBuf;

use notify::event::{MetadataKind, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::CoordinatorEvent;
use crate::errors::Result;

/// Handle for the filesystem watchers.
///
/// This exists mainly so the underlying `RecommendedWatcher`s are kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: Vec<RecommendedWatcher>,
    roots: Vec<PathBuf>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish()
    }
}

/// Watch every root non-recursively and send a
/// `CoordinatorEvent::Triggered` for each change notification.
///
/// Create, modify and delete notifications are all treated the same. Reads
/// (`Access` events, access-time updates) are dropped: stages read their
/// inputs from the watched roots on every run.
pub fn spawn_watchers(
    roots: &[PathBuf],
    runtime_tx: mpsc::Sender<CoordinatorEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callbacks into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watchers = Vec::with_capacity(roots.len());
    let mut watched = Vec::with_capacity(roots.len());

    for root in roots {
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());

        // Called synchronously by notify on its own thread.
        let mut watcher = RecommendedWatcher::new(
            {
                let event_tx = event_tx.clone();
                let root = root.clone();
                move |res: notify::Result<Event>| match res {
                    Ok(event) if !is_change(&event.kind) => {
                        debug!(root = %root.display(), kind = ?event.kind, "ignoring non-change event");
                    }
                    Ok(event) => {
                        debug!(root = %root.display(), kind = ?event.kind, paths = ?event.paths, "notify event");
                        if event_tx.send(root.clone()).is_err() {
                            debug!(root = %root.display(), "watch channel closed; dropping event");
                        }
                    }
                    Err(err) => {
                        warn!(root = %root.display(), error = %err, "file watch error");
                    }
                }
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        info!("file watcher started on {:?}", root);

        watchers.push(watcher);
        watched.push(root);
    }

    tokio::spawn(async move {
        while let Some(root) = event_rx.recv().await {
            if runtime_tx
                .send(CoordinatorEvent::Triggered { root })
                .await
                .is_err()
            {
                debug!("coordinator channel closed; stopping watch forwarder");
                break;
            }
        }
        debug!("watch forwarder finished");
    });

    Ok(WatcherHandle {
        _inner: watchers,
        roots: watched,
    })
}

/// Whether a notification describes a change to the watched tree.
fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}
