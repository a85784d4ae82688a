//! Deployment boundary.
//!
//! ```text
//! Deployer::deploy_file(path)           stage into the migrations dir, then:
//! Deployer::deploy(sql)
//!   ├─ PrimaryApplier::apply()            migration CLI (e.g. `supabase db push`)
//!   └─ on failure, per statement:
//!        StatementExecutor::execute(stmt)  HTTP SQL endpoint
//! ```
//!
//! The fallback is not atomic: a failing statement is recorded in the
//! [`DeployReport`] and the remaining statements still run, so a partial
//! failure can leave a partially applied schema.

mod cli;
mod error;
mod rest;

pub use cli::CliApplier;
pub use error::{DeployError, DeployResult};
pub use rest::RestSqlExecutor;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DeploySettings;
use crate::migration;
use crate::sql::split_statements;

/// Applies pending migrations as a whole.
#[async_trait]
pub trait PrimaryApplier: Send + Sync {
    async fn apply(&self) -> DeployResult<()>;
}

/// Executes a single SQL statement.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> DeployResult<()>;
}

/// Which path applied a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployMethod {
    Primary,
    PerStatement,
}

impl fmt::Display for DeployMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMethod::Primary => write!(f, "migration command"),
            DeployMethod::PerStatement => write!(f, "per-statement fallback"),
        }
    }
}

/// A statement the fallback could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    /// Position in the split migration, from 0.
    pub index: usize,
    pub statement: String,
    pub error: String,
}

/// Outcome of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub method: DeployMethod,
    /// Statements known to be applied.
    pub applied: usize,
    pub failures: Vec<StatementFailure>,
}

impl DeployReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Primary path with an optional per-statement fallback.
pub struct Deployer {
    primary: Box<dyn PrimaryApplier>,
    fallback: Option<Box<dyn StatementExecutor>>,
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

impl Deployer {
    pub fn new(primary: impl PrimaryApplier + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl StatementExecutor + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// CLI primary, plus the HTTP fallback when its URL and credential resolve.
    pub fn from_settings(settings: &DeploySettings, root: &Path) -> Self {
        let deployer = Self::new(CliApplier::new(settings.command.clone(), root));
        match RestSqlExecutor::from_settings(settings) {
            Ok(executor) => deployer.with_fallback(executor),
            Err(e) => {
                info!(reason = %e, "per-statement fallback unavailable");
                deployer
            }
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Apply an existing SQL file.
    ///
    /// The migration command only reads `migrations_dir`, so the file is
    /// staged there first; the staged path is returned with the report.
    pub async fn deploy_file(
        &self,
        file: &Path,
        migrations_dir: &Path,
    ) -> DeployResult<(PathBuf, DeployReport)> {
        let stage_err = |source: std::io::Error| DeployError::Stage {
            path: file.to_path_buf(),
            source,
        };
        let staged = migration::stage(file, migrations_dir, Utc::now()).map_err(stage_err)?;
        let sql = std::fs::read_to_string(&staged).map_err(stage_err)?;

        let report = self.deploy(&sql).await?;
        Ok((staged, report))
    }

    /// Apply `sql`, falling back to per-statement execution if the primary
    /// path fails. Only fails when the primary path fails and there is no
    /// fallback.
    pub async fn deploy(&self, sql: &str) -> DeployResult<DeployReport> {
        let statements = split_statements(sql);

        let primary_err = match self.primary.apply().await {
            Ok(()) => {
                info!(statements = statements.len(), "migration applied");
                return Ok(DeployReport {
                    method: DeployMethod::Primary,
                    applied: statements.len(),
                    failures: Vec::new(),
                });
            }
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(DeployError::NoFallback(Box::new(primary_err)));
        };
        warn!(error = %primary_err, "migration command failed, applying statements one by one");

        let mut report = DeployReport {
            method: DeployMethod::PerStatement,
            applied: 0,
            failures: Vec::new(),
        };
        for (index, statement) in statements.iter().enumerate() {
            match fallback.execute(statement).await {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!(index, error = %e, "statement failed, continuing");
                    report.failures.push(StatementFailure {
                        index,
                        statement: statement.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            applied = report.applied,
            failed = report.failures.len(),
            "per-statement deployment finished"
        );
        Ok(report)
    }
}
