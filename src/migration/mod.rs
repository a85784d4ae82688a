//! Migrations: a rendered [`Script`] plus metadata, persisted once as a
//! timestamped artifact.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::synth::Script;

/// Timestamp prefix of migration file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Whether a migration creates the whole schema or evolves an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    Full,
    Incremental,
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationKind::Full => write!(f, "full"),
            MigrationKind::Incremental => write!(f, "incremental"),
        }
    }
}

/// What started the pipeline run that produced a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationTrigger {
    /// A one-shot command.
    Manual,
    /// A debounced file-system change.
    Watch,
}

impl fmt::Display for MigrationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationTrigger::Manual => write!(f, "manual"),
            MigrationTrigger::Watch => write!(f, "watch"),
        }
    }
}

/// Place an existing SQL file where the migration command will pick it up.
///
/// A file already directly inside `dir` is used as is. Anything else is
/// copied to `<timestamp>_<stem>.sql` in `dir`, never overwriting.
pub fn stage(file: &Path, dir: &Path, now: DateTime<Utc>) -> io::Result<PathBuf> {
    let source = file.canonicalize()?;
    if let Ok(dir) = dir.canonicalize() {
        if source.parent() == Some(dir.as_path()) {
            return Ok(source);
        }
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "quarry_apply".to_string());
    let contents = std::fs::read(&source)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}.sql", now.format(FILE_TIMESTAMP_FORMAT), stem));
    let mut staged = OpenOptions::new().write(true).create_new(true).open(&path)?;
    staged.write_all(&contents)?;
    info!(from = %source.display(), to = %path.display(), "migration staged");
    Ok(path)
}

/// An ordered list of DDL statements with metadata. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    kind: MigrationKind,
    trigger: MigrationTrigger,
    created_at: DateTime<Utc>,
    script: Script,
}

impl Migration {
    pub fn new(
        kind: MigrationKind,
        trigger: MigrationTrigger,
        created_at: DateTime<Utc>,
        script: Script,
    ) -> Self {
        Self {
            kind,
            trigger,
            created_at,
            script,
        }
    }

    pub fn kind(&self) -> MigrationKind {
        self.kind
    }

    pub fn trigger(&self) -> MigrationTrigger {
        self.trigger
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// `<timestamp>_quarry_<kind>.sql`
    pub fn file_name(&self) -> String {
        format!(
            "{}_quarry_{}.sql",
            self.created_at.format(FILE_TIMESTAMP_FORMAT),
            self.kind
        )
    }

    /// Render with a metadata header.
    pub fn to_sql(&self) -> String {
        format!(
            "-- quarry {} migration\n-- trigger: {}\n-- created: {}\n\n{}",
            self.kind,
            self.trigger,
            self.created_at.to_rfc3339(),
            self.script.to_sql()
        )
    }

    /// Write to `dir`, creating it if needed. Never overwrites an existing file.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(self.to_sql().as_bytes())?;
        info!(
            path = %path.display(),
            kind = %self.kind,
            statements = self.script.statement_count(),
            "migration written"
        );
        Ok(path)
    }
}
