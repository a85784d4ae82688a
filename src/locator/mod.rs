//! Source locator.
//!
//! Walks the project root, keeps files matching the configured glob patterns,
//! and never descends into ignored directories. The result is sorted and
//! deduplicated by relative path so downstream stages see a stable order.
//!
//! Reading is a separate step ([`Locator::load`]) that runs in parallel and
//! turns unreadable or oversized files into warnings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ScanSettings;
use crate::facts::Warning;

/// Errors that prevent locating sources at all.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("source root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("source root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// A located source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub relative: String,
}

/// A source file with its contents.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub file: SourceFile,
    pub contents: String,
}

/// Result of walking the root.
#[derive(Debug, Default)]
pub struct Located {
    /// Matching files, sorted by relative path.
    pub files: Vec<SourceFile>,
    /// Directory entries the walk could not read.
    pub warnings: Vec<Warning>,
}

/// Result of loading located files.
#[derive(Debug, Default)]
pub struct LoadedSources {
    /// Readable files, sorted by relative path.
    pub files: Vec<LoadedFile>,
    pub warnings: Vec<Warning>,
}

/// Enumerates candidate source files under a root.
#[derive(Debug)]
pub struct Locator {
    root: PathBuf,
    include: GlobSet,
    ignore_globs: GlobSet,
    ignore_names: Vec<String>,
    max_file_size: u64,
}

impl Locator {
    /// Build a locator from scan settings.
    pub fn new(root: impl Into<PathBuf>, settings: &ScanSettings) -> Result<Self, LocatorError> {
        let mut include = GlobSetBuilder::new();
        for pattern in &settings.patterns {
            include.add(compile_glob(pattern)?);
        }

        let mut ignore_globs = GlobSetBuilder::new();
        let mut ignore_names = Vec::new();
        for entry in &settings.ignore {
            if entry.contains(['*', '?', '[']) {
                ignore_globs.add(compile_glob(entry)?);
            } else {
                ignore_names.push(entry.trim_matches('/').to_string());
            }
        }

        Ok(Self {
            root: root.into(),
            include: build_set(include)?,
            ignore_globs: build_set(ignore_globs)?,
            ignore_names,
            max_file_size: settings.max_file_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a path under the root would be located, ignoring whether it
    /// exists. Used to filter file-system events.
    pub fn is_candidate(&self, path: &Path) -> bool {
        match self.relative(path) {
            Some(relative) => self.include.is_match(&relative) && !self.is_ignored(path),
            None => false,
        }
    }

    /// Enumerate matching files.
    ///
    /// A pattern matching nothing is not an error. Directory entries that
    /// cannot be read are skipped and reported as warnings.
    pub fn locate(&self) -> Result<Located, LocatorError> {
        if !self.root.exists() {
            return Err(LocatorError::RootMissing(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(LocatorError::NotADirectory(self.root.clone()));
        }

        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    warnings.push(self.walk_warning(&e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };
            if self.include.is_match(&relative) {
                found.entry(relative).or_insert_with(|| entry.into_path());
            }
        }

        debug!(root = %self.root.display(), files = found.len(), "located sources");

        Ok(Located {
            files: found
                .into_iter()
                .map(|(relative, path)| SourceFile { path, relative })
                .collect(),
            warnings,
        })
    }

    /// Read files in parallel. Failures join the walk warnings.
    pub fn load(&self, located: &Located) -> LoadedSources {
        let results: Vec<Result<LoadedFile, Warning>> = located
            .files
            .par_iter()
            .map(|file| self.read(file))
            .collect();

        let mut loaded = LoadedSources {
            files: Vec::with_capacity(results.len()),
            warnings: located.warnings.clone(),
        };
        for result in results {
            match result {
                Ok(file) => loaded.files.push(file),
                Err(warning) => {
                    warn!(file = ?warning.file, "{}", warning.message);
                    loaded.warnings.push(warning);
                }
            }
        }
        loaded
    }

    fn read(&self, file: &SourceFile) -> Result<LoadedFile, Warning> {
        let metadata = fs::metadata(&file.path)
            .map_err(|e| Warning::file(&file.relative, format!("cannot stat file: {}", e)))?;
        if metadata.len() > self.max_file_size {
            return Err(Warning::file(
                &file.relative,
                format!(
                    "skipped: {} bytes exceeds max_file_size {}",
                    metadata.len(),
                    self.max_file_size
                ),
            ));
        }

        let contents = fs::read_to_string(&file.path)
            .map_err(|e| Warning::file(&file.relative, format!("unreadable file: {}", e)))?;

        Ok(LoadedFile {
            file: file.clone(),
            contents,
        })
    }

    fn walk_warning(&self, error: &walkdir::Error) -> Warning {
        let message = match error.io_error() {
            Some(io) => format!("unreadable directory entry: {}", io),
            None => format!("unreadable directory entry: {}", error),
        };
        match error.path().and_then(|path| self.relative(path)) {
            Some(relative) => Warning::file(relative, message),
            None => Warning::general(message),
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let Some(relative) = self.relative(path) else {
            return false;
        };
        if self.ignore_globs.is_match(&relative) {
            return true;
        }
        relative
            .split('/')
            .any(|segment| self.ignore_names.iter().any(|name| name == segment))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let stripped = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = stripped
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

fn compile_glob(pattern: &str) -> Result<Glob, LocatorError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| LocatorError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn build_set(builder: GlobSetBuilder) -> Result<GlobSet, LocatorError> {
    builder.build().map_err(|source| LocatorError::InvalidPattern {
        pattern: "<set>".to_string(),
        source,
    })
}
