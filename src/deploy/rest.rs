//! Fallback path: one SQL statement per request to a remote endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::error::{DeployError, DeployResult};
use super::StatementExecutor;
use crate::config::DeploySettings;

#[derive(Serialize)]
struct ExecSqlRequest<'a> {
    sql: &'a str,
}

/// POSTs `{"sql": "..."}` to `<url><rpc_path>` with a bearer credential.
#[derive(Debug, Clone)]
pub struct RestSqlExecutor {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl RestSqlExecutor {
    pub fn new(
        base_url: &str,
        rpc_path: &str,
        key: impl Into<String>,
        timeout: Duration,
    ) -> DeployResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint(base_url, rpc_path),
            key: key.into(),
        })
    }

    /// Resolve URL and credential from settings and the environment.
    pub fn from_settings(settings: &DeploySettings) -> DeployResult<Self> {
        let url = settings.resolved_url()?;
        let key = settings.resolved_key()?;
        Self::new(&url, &settings.rpc_path, key, settings.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatementExecutor for RestSqlExecutor {
    async fn execute(&self, statement: &str) -> DeployResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .json(&ExecSqlRequest { sql: statement })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::status(status.as_u16(), body));
        }
        debug!(endpoint = %self.endpoint, "statement executed");
        Ok(())
    }
}

/// Join base URL and path with exactly one slash.
fn endpoint(base_url: &str, rpc_path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        rpc_path.trim_start_matches('/')
    )
}
