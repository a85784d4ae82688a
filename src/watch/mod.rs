//! Watch/deploy driver.
//!
//! ```text
//!              change event             debounce elapsed
//!   Watching ─────────────▶ (timer reset) ─────────────▶ Scanning
//!      ▲                                                    │
//!      │                                                    ▼
//!     Idle ◀──────────── Deploying ◀──────────────────── Diffing
//! ```
//!
//! Events arriving while a cycle runs stay queued in the channel and arm a
//! fresh debounce once the cycle is over, so at most one cycle runs at a
//! time. Stopping takes effect between cycles; an in-flight cycle always
//! finishes.

mod cycle;
mod fs;

pub use cycle::PipelineCycle;
pub use fs::{FsWatcher, WatchError};

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use crate::deploy::DeployError;
use crate::pipeline::PipelineError;

/// Phase of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    Idle,
    Scanning,
    Diffing,
    Deploying,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Idle => write!(f, "idle"),
            DriverState::Scanning => write!(f, "scanning"),
            DriverState::Diffing => write!(f, "diffing"),
            DriverState::Deploying => write!(f, "deploying"),
        }
    }
}

/// Published driver status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverStatus {
    pub state: DriverState,
    pub watching: bool,
    /// Completed cycles, successful or not.
    pub cycles: u64,
    pub last_error: Option<String>,
}

impl Default for DriverStatus {
    fn default() -> Self {
        Self {
            state: DriverState::Idle,
            watching: false,
            cycles: 0,
            last_error: None,
        }
    }
}

/// Failure of one cycle. Logged by the driver, never fatal to it.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("background task failed: {0}")]
    Task(String),
}

/// The three phases of one cycle.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    /// Result of a scan, handed to [`CycleRunner::diff`].
    type Scanned: Send;
    /// Something to deploy.
    type Pending: Send;

    async fn scan(&self) -> Result<Self::Scanned, CycleError>;

    /// Compare against the last snapshot and write artifacts. `None` means
    /// there is nothing to deploy.
    async fn diff(&self, scanned: Self::Scanned) -> Result<Option<Self::Pending>, CycleError>;

    async fn deploy(&self, pending: Self::Pending) -> Result<(), CycleError>;
}

/// Drives a [`CycleRunner`] from a stream of change events.
pub struct Driver<R> {
    runner: R,
    debounce: Duration,
    status: watch::Sender<DriverStatus>,
}

impl<R: CycleRunner> Driver<R> {
    pub fn new(runner: R, debounce: Duration) -> Self {
        let (status, _) = watch::channel(DriverStatus::default());
        Self {
            runner,
            debounce,
            status,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Current status and every later change.
    pub fn subscribe(&self) -> watch::Receiver<DriverStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> DriverStatus {
        self.status.borrow().clone()
    }

    /// Run until `stop` resolves or the event channel closes.
    pub async fn run<S>(&self, mut events: mpsc::UnboundedReceiver<PathBuf>, stop: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let timer = sleep_until(Instant::now());
        tokio::pin!(timer);
        let mut armed = false;

        self.status.send_modify(|s| s.watching = true);
        info!(debounce_ms = self.debounce.as_millis() as u64, "watching for changes");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                event = events.recv() => match event {
                    Some(path) => {
                        debug!(path = %path.display(), "change detected");
                        timer.as_mut().reset(Instant::now() + self.debounce);
                        armed = true;
                    }
                    None => break,
                },
                _ = &mut timer, if armed => {
                    armed = false;
                    self.cycle().await;
                }
            }
        }

        self.status.send_modify(|s| s.watching = false);
        info!("watcher stopped");
    }

    /// One scan, diff, and deploy. Errors are logged and published.
    pub async fn cycle(&self) {
        let result = self.run_phases().await;
        self.status.send_modify(|s| {
            s.state = DriverState::Idle;
            s.cycles += 1;
            s.last_error = result.as_ref().err().map(|e| e.to_string());
        });
        if let Err(e) = result {
            error!(error = %e, "cycle failed");
        }
    }

    async fn run_phases(&self) -> Result<(), CycleError> {
        self.set_state(DriverState::Scanning);
        let scanned = self.runner.scan().await?;

        self.set_state(DriverState::Diffing);
        let Some(pending) = self.runner.diff(scanned).await? else {
            debug!("nothing to deploy");
            return Ok(());
        };

        self.set_state(DriverState::Deploying);
        self.runner.deploy(pending).await
    }

    fn set_state(&self, state: DriverState) {
        self.status.send_modify(|s| s.state = state);
    }
}

impl<R> fmt::Debug for Driver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("debounce", &self.debounce)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}
