//! File-system events feeding the driver.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::config::ScanSettings;
use crate::locator::{Locator, LocatorError};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// A recursive watcher on the project root. Only paths the locator would
/// pick up are forwarded, so writing artifacts does not trigger a scan.
///
/// Dropping the watcher closes the event channel.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
}

impl FsWatcher {
    pub fn start(
        root: &Path,
        scan: &ScanSettings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PathBuf>), WatchError> {
        let root = root.canonicalize().map_err(|source| WatchError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        let filter = Locator::new(&root, scan)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                    return;
                }
            };
            if !is_change(&event.kind) {
                return;
            }
            for path in event.paths {
                if filter.is_candidate(&path) {
                    // Closed receiver means the driver is gone.
                    let _ = tx.send(path);
                } else {
                    trace!(path = %path.display(), "ignoring event");
                }
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((Self { _watcher: watcher }, rx))
    }
}

impl std::fmt::Debug for FsWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsWatcher").finish_non_exhaustive()
    }
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
