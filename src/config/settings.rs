//! TOML-based configuration for Quarry.
//!
//! Supports a config file (quarry.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [scan]
//! patterns = ["services/**/*.ts", "components/**/*.tsx"]
//! ignore = ["node_modules", ".git", "dist"]
//!
//! [model]
//! multi_tenant_tables = ["payments", "churches"]
//!
//! [[model.path_hints]]
//! keyword = "mass"
//! table = "mass_intentions"
//!
//! [output]
//! dir = "database"
//! migrations_dir = "supabase/migrations"
//!
//! [deploy]
//! command = ["supabase", "db", "push"]
//! url = "${SUPABASE_URL}"
//! key_env = "SUPABASE_SERVICE_ROLE_KEY"
//!
//! [watch]
//! debounce_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schema::Category;

/// Name of the config file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "quarry.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Which files are scanned.
    pub scan: ScanSettings,

    /// Model building rules.
    pub model: ModelSettings,

    /// DDL synthesis options.
    pub ddl: DdlSettings,

    /// Where artifacts are written.
    pub output: OutputSettings,

    /// Deployment boundary.
    pub deploy: DeploySettings,

    /// Watch mode.
    pub watch: WatchSettings,
}

/// Source locator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Glob patterns, relative to the project root.
    pub patterns: Vec<String>,

    /// Directory names (or globs) never descended into.
    pub ignore: Vec<String>,

    /// Files larger than this are skipped with a warning.
    pub max_file_size: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            patterns: [
                "types/**/*.ts",
                "services/**/*.ts",
                "hooks/**/*.ts",
                "lib/**/*.ts",
                "app/**/*.ts",
                "app/**/*.tsx",
                "components/**/*.ts",
                "components/**/*.tsx",
                "__tests__/**/*.ts",
                "__tests__/**/*.tsx",
                "supabase/**/*.ts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignore: ["node_modules", ".git", ".next", "dist", "build", "coverage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: 2 * 1024 * 1024,
        }
    }
}

/// Keyword → table lookup used when a table can only be inferred from a path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathHint {
    /// Lowercase keyword searched for in path segments.
    pub keyword: String,
    /// Table the keyword maps to.
    pub table: String,
}

impl PathHint {
    pub fn new(keyword: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            table: table.into(),
        }
    }
}

/// A table the project is known to need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpectedTable {
    pub name: String,
    pub reason: String,
}

impl ExpectedTable {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Model builder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Tables that always carry a tenant column.
    pub multi_tenant_tables: Vec<String>,

    /// Tenant column name.
    pub tenant_column: String,

    /// Owner column name.
    pub owner_column: String,

    /// Table the tenant column references.
    pub organization_table: String,

    /// Ordered keyword lookup for form/state extraction.
    pub path_hints: Vec<PathHint>,

    /// Explicit table categories.
    pub categories: BTreeMap<String, Category>,

    /// Declarations with these suffixes are not entities (e.g. `ButtonProps`).
    pub declaration_skip_suffixes: Vec<String>,

    /// Tables whose absence is reported by validation.
    pub expected_tables: Vec<ExpectedTable>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let categories = [
            ("users", Category::Auth),
            ("organizations", Category::Core),
            ("memberships", Category::Core),
            ("churches", Category::Core),
            ("payments", Category::Business),
            ("mass_intentions", Category::Business),
            ("oremus_candles", Category::Business),
            ("prayers", Category::Content),
            ("courses", Category::Content),
            ("quizzes", Category::Content),
            ("community_posts", Category::Content),
            ("prayer_requests", Category::Content),
            ("user_prayers", Category::Analytics),
            ("user_progress", Category::Analytics),
            ("notifications", Category::System),
        ]
        .into_iter()
        .map(|(name, category)| (name.to_string(), category))
        .collect();

        Self {
            multi_tenant_tables: [
                "mass_intentions",
                "oremus_candles",
                "churches",
                "community_posts",
                "prayer_requests",
                "payments",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            tenant_column: "organization_id".to_string(),
            owner_column: "user_id".to_string(),
            organization_table: "organizations".to_string(),
            path_hints: vec![
                PathHint::new("mass", "mass_intentions"),
                PathHint::new("payment", "payments"),
                PathHint::new("candle", "oremus_candles"),
                PathHint::new("church", "churches"),
                PathHint::new("prayer", "prayers"),
                PathHint::new("course", "courses"),
                PathHint::new("user", "users"),
            ],
            categories,
            declaration_skip_suffixes: vec!["Props".to_string(), "Context".to_string()],
            expected_tables: vec![
                ExpectedTable::new("users", "Authentication system requires users table"),
                ExpectedTable::new(
                    "organizations",
                    "Multi-tenant architecture requires organizations",
                ),
                ExpectedTable::new(
                    "memberships",
                    "Multi-tenant requires user-organization relationships",
                ),
                ExpectedTable::new("masses", "Core functionality - mass scheduling"),
                ExpectedTable::new("mass_intentions", "Core functionality - mass intentions"),
                ExpectedTable::new("payments", "Payment system integration"),
                ExpectedTable::new("candles", "Virtual candles functionality"),
                ExpectedTable::new("prayers", "Prayer library functionality"),
                ExpectedTable::new("churches", "Church location system"),
                ExpectedTable::new("courses", "Education system"),
                ExpectedTable::new("user_progress", "Course progress tracking"),
                ExpectedTable::new("notifications", "Notification system"),
            ],
        }
    }
}

/// DDL synthesis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DdlSettings {
    /// Extensions created before any table.
    pub extensions: Vec<String>,

    /// Table that models authenticated identities.
    pub identity_table: String,

    /// Table joining identities to organizations.
    pub membership_table: String,
}

impl Default for DdlSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["uuid-ossp".to_string()],
            identity_table: "users".to_string(),
            membership_table: "memberships".to_string(),
        }
    }
}

/// Artifact locations, relative to the project root unless absolute.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Full schema, report, and snapshot.
    pub dir: PathBuf,

    /// Timestamped migrations picked up by the migration CLI.
    pub migrations_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("database"),
            migrations_dir: PathBuf::from("supabase").join("migrations"),
        }
    }
}

/// Deployment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Primary migration-apply command, run from the project root.
    pub command: Vec<String>,

    /// Base URL of the SQL endpoint (supports ${ENV_VAR} expansion).
    pub url: String,

    /// Environment variable holding the bearer credential.
    pub key_env: String,

    /// Path of the statement-execution RPC below `url`.
    pub rpc_path: String,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            command: vec!["supabase".to_string(), "db".to_string(), "push".to_string()],
            url: "${SUPABASE_URL}".to_string(),
            key_env: "SUPABASE_SERVICE_ROLE_KEY".to_string(),
            rpc_path: "/rest/v1/rpc/exec_sql".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DeploySettings {
    /// Get the endpoint URL with environment variables expanded.
    pub fn resolved_url(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.url)
    }

    /// Read the bearer credential from the environment.
    pub fn resolved_key(&self) -> Result<String, SettingsError> {
        env::var(&self.key_env).map_err(|_| SettingsError::MissingEnvVar(self.key_env.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Watch mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Quiet period after the last change before a scan starts.
    pub debounce_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl WatchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings for a project.
    ///
    /// Searches in order:
    /// 1. Environment variable `QUARRY_CONFIG`
    /// 2. `<root>/quarry.toml`
    /// 3. `~/.config/quarry/config.toml`
    pub fn load(root: &Path) -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("QUARRY_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = root.join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("quarry").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.scan.patterns.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "scan.patterns must not be empty".to_string(),
            ));
        }
        if self.deploy.command.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "deploy.command must name a program".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&ch) = chars.peek() {
            if braced {
                chars.next();
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            } else if ch.is_alphanumeric() || ch == '_' {
                var_name.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if var_name.is_empty() && !braced {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
