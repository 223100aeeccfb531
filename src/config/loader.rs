//! Configuration file loading with precedence handling.
//!
//! Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)

use crate::config::ViewConfig;
use crate::engine::anchor::Px;
use crate::engine::timestamp::DEFAULT_DATE_FORMAT;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CHATVIEW_CONFIG";
pub const BATCH_SIZE_ENV: &str = "CHATVIEW_BATCH_SIZE";
pub const SCROLL_THRESHOLD_ENV: &str = "CHATVIEW_SCROLL_THRESHOLD";
pub const FILL_FACTOR_ENV: &str = "CHATVIEW_FILL_FACTOR";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting parsed but is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/chatview/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Pixels from the end still treated as "at the bottom".
    #[serde(default)]
    pub scroll_threshold: Option<Px>,

    /// History messages per lazy-load step.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Viewports of content to fill during initial loading.
    #[serde(default)]
    pub initial_fill_factor: Option<u32>,

    /// Scroll debounce in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Render image and video links inline.
    #[serde(default)]
    pub display_links: Option<bool>,

    /// `chrono` format for labels older than five days.
    #[serde(default)]
    pub date_format: Option<String>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub scroll_threshold: Px,
    pub batch_size: usize,
    pub initial_fill_factor: u32,
    pub debounce_ms: u64,
    pub display_links: bool,
    pub date_format: String,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let view = ViewConfig::default();
        Self {
            scroll_threshold: view.scroll_threshold,
            batch_size: view.batch_size,
            initial_fill_factor: view.initial_fill_factor,
            debounce_ms: view.debounce.as_millis() as u64,
            display_links: view.display_links,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.initial_fill_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_fill_factor",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "date_format",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Engine settings.
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            scroll_threshold: self.scroll_threshold,
            batch_size: self.batch_size,
            initial_fill_factor: self.initial_fill_factor,
            debounce: Duration::from_millis(self.debounce_ms),
            display_links: self.display_links,
            date_format: self.date_format.clone(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/chatview/chatview.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chatview").join("chatview.log")
    } else {
        PathBuf::from("chatview.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/chatview/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatview").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CHATVIEW_CONFIG` environment variable
/// 3. Default path `~/.config/chatview/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `CHATVIEW_BATCH_SIZE`
/// - `CHATVIEW_SCROLL_THRESHOLD`
/// - `CHATVIEW_FILL_FACTOR`
///
/// Unparsable values are ignored with a warning.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Some(batch_size) = env_number(BATCH_SIZE_ENV) {
        config.batch_size = batch_size;
    }
    if let Some(threshold) = env_number(SCROLL_THRESHOLD_ENV) {
        config.scroll_threshold = threshold;
    }
    if let Some(factor) = env_number(FILL_FACTOR_ENV) {
        config.initial_fill_factor = factor;
    }
    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        scroll_threshold: config.scroll_threshold.unwrap_or(defaults.scroll_threshold),
        batch_size: config.batch_size.unwrap_or(defaults.batch_size),
        initial_fill_factor: config
            .initial_fill_factor
            .unwrap_or(defaults.initial_fill_factor),
        debounce_ms: config.debounce_ms.unwrap_or(defaults.debounce_ms),
        display_links: config.display_links.unwrap_or(defaults.display_links),
        date_format: config.date_format.unwrap_or(defaults.date_format),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Overrides given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub batch_size: Option<usize>,
    pub scroll_threshold: Option<Px>,
    pub initial_fill_factor: Option<u32>,
    pub display_links: Option<bool>,
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
pub fn apply_cli_overrides(mut config: ResolvedConfig, cli: &CliOverrides) -> ResolvedConfig {
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(threshold) = cli.scroll_threshold {
        config.scroll_threshold = threshold;
    }
    if let Some(factor) = cli.initial_fill_factor {
        config.initial_fill_factor = factor;
    }
    if let Some(display_links) = cli.display_links {
        config.display_links = display_links;
    }
    config
}

/// Full resolution: file (by precedence), env, CLI, then validation.
pub fn resolve(
    config_path: Option<PathBuf>,
    cli: &CliOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    let config = apply_cli_overrides(apply_env_overrides(merge_config(file)), cli);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
