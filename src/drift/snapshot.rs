//! Persisted snapshot of the canonical model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::schema::Model;

/// File name of the snapshot inside the output directory.
pub const SNAPSHOT_FILE_NAME: &str = "database_schema.json";

/// Current snapshot format. Bump when the layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write snapshot {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Snapshot {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Snapshot {path} has unsupported version {found}")]
    Version { path: PathBuf, found: u32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Whether the file exists but cannot be used. Such snapshots are
    /// treated as absent.
    pub fn is_unusable(&self) -> bool {
        matches!(self, SnapshotError::Corrupt { .. } | SnapshotError::Version { .. })
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// SHA-256 of the model's JSON form, lowercase hex.
pub fn fingerprint(model: &Model) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(model)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// The model as of the last successful build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub fingerprint: String,
    pub model: Model,
}

impl Snapshot {
    pub fn new(model: Model) -> SnapshotResult<Self> {
        Ok(Self {
            version: SNAPSHOT_VERSION,
            fingerprint: fingerprint(&model)?,
            model,
        })
    }

    /// Read a snapshot. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> SnapshotResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                path: path.to_path_buf(),
                found: snapshot.version,
            });
        }

        debug!(path = %path.display(), tables = snapshot.model.tables.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Write as pretty JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> SnapshotResult<()> {
        let write_err = |source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(write_err)
    }
}
