//! Deployment error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsError;

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors at the deployment boundary.
#[derive(Error, Debug)]
pub enum DeployError {
    /// No program configured for the primary path.
    #[error("deploy command is empty")]
    EmptyCommand,

    /// The migration CLI could not be started.
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The migration CLI ran and reported failure.
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Endpoint URL or credential could not be resolved.
    #[error("deploy configuration: {0}")]
    Config(#[from] SettingsError),

    /// Transport-level HTTP failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The SQL endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A SQL file could not be read or staged for the migration command.
    #[error("cannot stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No fallback is available and the primary path failed.
    #[error("primary deployment failed and no fallback is configured: {0}")]
    NoFallback(Box<DeployError>),
}

impl DeployError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the failure happened before anything reached the database.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyCommand | Self::SpawnFailed { .. } | Self::Config(_) | Self::Stage { .. }
        )
    }
}
