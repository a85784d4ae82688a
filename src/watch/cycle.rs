//! The pipeline as a driver cycle.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{CycleError, CycleRunner};
use crate::deploy::Deployer;
use crate::migration::{Migration, MigrationTrigger};
use crate::pipeline::{Pipeline, Scan};

/// Runs scans and artifact writes on the blocking pool and deploys the
/// resulting migration, if a deployer is configured.
#[derive(Debug, Clone)]
pub struct PipelineCycle {
    pipeline: Arc<Pipeline>,
    deployer: Option<Arc<Deployer>>,
}

impl PipelineCycle {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            deployer: None,
        }
    }

    pub fn with_deployer(mut self, deployer: Deployer) -> Self {
        self.deployer = Some(Arc::new(deployer));
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

async fn blocking<T, F>(f: F) -> Result<T, CycleError>
where
    F: FnOnce() -> Result<T, CycleError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CycleError::Task(e.to_string()))?
}

#[async_trait]
impl CycleRunner for PipelineCycle {
    type Scanned = Scan;
    type Pending = Migration;

    async fn scan(&self) -> Result<Scan, CycleError> {
        let pipeline = Arc::clone(&self.pipeline);
        blocking(move || Ok(pipeline.scan()?)).await
    }

    async fn diff(&self, scan: Scan) -> Result<Option<Migration>, CycleError> {
        let pipeline = Arc::clone(&self.pipeline);
        let emitted = blocking(move || Ok(pipeline.emit(&scan, MigrationTrigger::Watch)?)).await?;

        for warning in &emitted.warnings {
            warn!("{}", warning);
        }
        if emitted.is_unchanged() {
            info!(fingerprint = %emitted.fingerprint, "model unchanged");
            return Ok(None);
        }
        if let Some(path) = &emitted.migration_path {
            info!(path = %path.display(), "migration ready");
        }
        Ok(emitted.migration.filter(|_| self.deployer.is_some()))
    }

    async fn deploy(&self, migration: Migration) -> Result<(), CycleError> {
        let Some(deployer) = &self.deployer else {
            return Ok(());
        };
        let report = deployer.deploy(&migration.to_sql()).await?;
        if report.is_complete() {
            info!(method = %report.method, applied = report.applied, "deployed");
        } else {
            warn!(
                method = %report.method,
                applied = report.applied,
                failed = report.failures.len(),
                "deployed with failures"
            );
        }
        Ok(())
    }
}
