//! Primary path: the external migration CLI.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::{DeployError, DeployResult};
use super::PrimaryApplier;

/// Runs the configured migration command (e.g. `supabase db push`) from the
/// project root. The command picks up migration files on its own.
#[derive(Debug, Clone)]
pub struct CliApplier {
    command: Vec<String>,
    root: PathBuf,
}

impl CliApplier {
    pub fn new(command: Vec<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            command,
            root: root.into(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}

#[async_trait]
impl PrimaryApplier for CliApplier {
    async fn apply(&self) -> DeployResult<()> {
        let (program, args) = self.command.split_first().ok_or(DeployError::EmptyCommand)?;
        debug!(program = %program, ?args, root = %self.root.display(), "running migration command");

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DeployError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                program: program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(program = %program, "migration command succeeded");
        Ok(())
    }
}
