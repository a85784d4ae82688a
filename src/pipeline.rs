//! One pipeline execution.
//!
//! ```text
//! scan:  locate ─▶ load ─▶ extract ─▶ build model ─▶ validate
//! emit:  full schema ─▶ snapshot diff ─▶ migration ─▶ report ─▶ save snapshot
//! ```
//!
//! `scan` never writes. `emit` reads the snapshot once before diffing and
//! writes it once, after every other artifact has been written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{Settings, SettingsError};
use crate::drift::{diff, incremental, Drift, Snapshot, SnapshotError, SNAPSHOT_FILE_NAME};
use crate::extract::ExtractorSet;
use crate::facts::Warning;
use crate::locator::{Locator, LocatorError};
use crate::migration::{Migration, MigrationKind, MigrationTrigger};
use crate::report::{validate, AnalysisReport, ValidationReport, REPORT_FILE_NAME};
use crate::schema::{build_model, Model};
use crate::synth::{Script, Synthesizer};

/// File name of the full schema inside the output directory.
pub const SCHEMA_FILE_NAME: &str = "schema.sql";

/// Failures that abort a pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// What a scan found. Nothing has been written yet.
#[derive(Debug, Clone)]
pub struct Scan {
    pub files: usize,
    pub model: Model,
    /// Sorted by file, then line.
    pub warnings: Vec<Warning>,
    pub validation: ValidationReport,
}

/// Artifacts written by [`Pipeline::emit`].
#[derive(Debug, Clone)]
pub struct Emitted {
    pub schema_path: PathBuf,
    pub report_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub fingerprint: String,
    /// Fingerprint of the snapshot the run started from, if any was usable.
    pub previous_fingerprint: Option<String>,
    /// `None` on the first run.
    pub drift: Option<Drift>,
    /// `None` when nothing changed.
    pub migration: Option<Migration>,
    pub migration_path: Option<PathBuf>,
    pub warnings: Vec<Warning>,
}

impl Emitted {
    pub fn is_unchanged(&self) -> bool {
        self.previous_fingerprint.as_deref() == Some(self.fingerprint.as_str())
    }
}

/// A complete execution.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub scan: Scan,
    pub emitted: Emitted,
}

impl PipelineOutcome {
    /// Every warning of the run, scan warnings first.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.scan.warnings.iter().chain(&self.emitted.warnings)
    }
}

/// A project root with its settings.
#[derive(Debug, Clone)]
pub struct Pipeline {
    root: PathBuf,
    settings: Settings,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    /// Use the settings discovered for `root`.
    pub fn discover(root: impl Into<PathBuf>) -> PipelineResult<Self> {
        let root = root.into();
        let settings = Settings::load(&root)?;
        Ok(Self::new(root, settings))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn output_dir(&self) -> PathBuf {
        Settings::resolve(&self.root, &self.settings.output.dir)
    }

    pub fn migrations_dir(&self) -> PathBuf {
        Settings::resolve(&self.root, &self.settings.output.migrations_dir)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir().join(SNAPSHOT_FILE_NAME)
    }

    /// Scan, then write every artifact.
    pub fn run_once(&self, trigger: MigrationTrigger) -> PipelineResult<PipelineOutcome> {
        let scan = self.scan()?;
        let emitted = self.emit(&scan, trigger)?;
        Ok(PipelineOutcome { scan, emitted })
    }

    /// Locate, read, and extract sources, then build and validate the model.
    pub fn scan(&self) -> PipelineResult<Scan> {
        let locator = Locator::new(&self.root, &self.settings.scan)?;
        let located = locator.locate()?;
        let loaded = locator.load(&located);

        let extraction = ExtractorSet::standard(&self.settings.model).extract_all(&loaded.files);
        for warning in &extraction.warnings {
            warn!(file = ?warning.file, line = ?warning.line, "{}", warning.message);
        }

        let mut warnings = loaded.warnings;
        warnings.extend(extraction.warnings);
        warnings.sort();

        let model = build_model(&self.settings.model, &extraction.facts);
        let validation = validate(&model, &self.settings.model);

        info!(
            files = loaded.files.len(),
            facts = extraction.facts.len(),
            tables = model.tables.len(),
            columns = model.column_count(),
            relationships = model.relationship_count(),
            warnings = warnings.len(),
            "scan complete"
        );

        Ok(Scan {
            files: loaded.files.len(),
            model,
            warnings,
            validation,
        })
    }

    /// Write the full schema, the migration (if any), the report, and the
    /// snapshot for a finished scan.
    pub fn emit(&self, scan: &Scan, trigger: MigrationTrigger) -> PipelineResult<Emitted> {
        let settings = &self.settings;
        let synth = Synthesizer::new(&settings.ddl, &settings.model);
        let output_dir = self.output_dir();
        let mut warnings = Vec::new();

        let full = synth.full_schema(&scan.model);
        let schema_path = output_dir.join(SCHEMA_FILE_NAME);
        write_artifact(&schema_path, &full.to_sql())?;

        let snapshot_path = output_dir.join(SNAPSHOT_FILE_NAME);
        let previous = match Snapshot::load(&snapshot_path) {
            Ok(previous) => previous,
            Err(e) if e.is_unusable() => {
                warn!(error = %e, "ignoring unusable snapshot");
                warnings.push(Warning::file(
                    snapshot_path.display().to_string(),
                    format!("{}; treated as absent", e),
                ));
                None
            }
            Err(e) => return Err(e.into()),
        };
        let current = Snapshot::new(scan.model.clone())?;
        let created_at = Utc::now();

        let (kind, drift, script) = match &previous {
            None => (MigrationKind::Full, None, full),
            Some(prev) if prev.fingerprint == current.fingerprint => {
                debug!(fingerprint = %current.fingerprint, "model unchanged");
                (MigrationKind::Incremental, Some(Drift::default()), Script::default())
            }
            Some(prev) => (
                MigrationKind::Incremental,
                Some(diff(&prev.model, &scan.model)),
                incremental(&synth, &prev.model, &scan.model),
            ),
        };

        let migration = Migration::new(kind, trigger, created_at, script);
        let (migration, migration_path) = if migration.is_empty() {
            (None, None)
        } else {
            let dir = self.migrations_dir();
            let path = migration.write_to(&dir).map_err(|source| PipelineError::Write {
                path: dir.join(migration.file_name()),
                source,
            })?;
            (Some(migration), Some(path))
        };

        let report = AnalysisReport {
            model: &scan.model,
            validation: &scan.validation,
            model_settings: &settings.model,
            ddl_settings: &settings.ddl,
            generated_at: created_at,
        };
        let report_path = output_dir.join(REPORT_FILE_NAME);
        write_artifact(&report_path, &report.to_markdown())?;

        current.save(&snapshot_path)?;

        info!(
            schema = %schema_path.display(),
            migration = ?migration_path.as_ref().map(|p| p.display().to_string()),
            fingerprint = %current.fingerprint,
            "artifacts written"
        );

        Ok(Emitted {
            schema_path,
            report_path,
            snapshot_path,
            fingerprint: current.fingerprint,
            previous_fingerprint: previous.map(|p| p.fingerprint),
            drift,
            migration,
            migration_path,
            warnings,
        })
    }
}

fn write_artifact(path: &Path, contents: &str) -> PipelineResult<()> {
    let write_err = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
