//! Configuration module for Quarry.
//!
//! Handles the project config file, environment variables, and defaults.

mod settings;

pub use settings::{
    expand_env_vars, DdlSettings, DeploySettings, ExpectedTable, ModelSettings, OutputSettings,
    PathHint, ScanSettings, Settings, SettingsError, WatchSettings, CONFIG_FILE_NAME,
};
