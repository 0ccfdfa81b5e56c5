//! Configuration loading for TuneMatch
//!
//! Config file resolution priority:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`TUNEMATCH_CONFIG`)
//! 3. User config directory (`~/.config/tunematch/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: a warning is logged and compiled
//! defaults are used. A config file that exists but does not parse is a
//! configuration error.
//!
//! After the file is loaded, a small set of environment variables override
//! individual fields (`TUNEMATCH_EMBEDDING_URL`, `TUNEMATCH_LOG_LEVEL`).

use crate::models::ModelVariant;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TUNEMATCH_CONFIG";
/// Environment override for `embedding.base_url`
pub const EMBEDDING_URL_ENV_VAR: &str = "TUNEMATCH_EMBEDDING_URL";
/// Environment override for `logging.level`
pub const LOG_LEVEL_ENV_VAR: &str = "TUNEMATCH_LOG_LEVEL";

/// Complete configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub mood: MoodConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Embedding service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the text vectorization service
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    /// Model variant used for every embedding in a request
    #[serde(default)]
    pub model: ModelVariant,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum concurrent in-flight embedding calls
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Retries for transient failures (network, timeout, 5xx)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model: ModelVariant::default(),
            timeout_ms: default_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

/// What the ranker does when an embedding call for a song fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Omit the song from the ranking and report it as a failure
    #[default]
    SkipSong,
    /// Substitute a neutral 0.5 similarity for the failed aspect
    Neutral,
    /// Abort the whole ranking request
    FailRequest,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::SkipSong => "skip_song",
            FailurePolicy::Neutral => "neutral",
            FailurePolicy::FailRequest => "fail_request",
        }
    }
}

/// Ranking orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Songs scored concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Overall deadline for a ranking request in milliseconds (none if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
            deadline_ms: None,
        }
    }
}

/// Dimensional mood strategy settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodConfig {
    /// TOML file holding the anchor vocabularies (built-in vocabularies if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_embedding_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_in_flight() -> usize {
    8
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_concurrency() -> usize {
    4
}

/// Where the config file path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
}

/// Resolve the config file path following the priority order in the module docs
///
/// Returns `None` when neither CLI nor environment name a file and the user
/// config file does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }

    // Priority 3: User config directory
    user_config_path()
        .filter(|p| p.exists())
        .map(|p| (p, ConfigSource::UserConfigDir))
}

/// Default per-user config file location for the platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunematch").join("config.toml"))
}

/// How [`load_config`] arrived at its configuration
///
/// Loading happens before logging is initialized, so the outcome is returned
/// and logged by the caller with [`ConfigOrigin::log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// No config file named or present
    Defaults,
    /// Parsed from this file
    File { path: PathBuf, source: ConfigSource },
    /// Named by CLI or environment but not found
    Missing { path: PathBuf, source: ConfigSource },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::Defaults => info!("No config file found, using compiled defaults"),
            ConfigOrigin::File { path, source } => {
                info!(path = %path.display(), source = ?source, "Loaded configuration");
            }
            ConfigOrigin::Missing { path, source } => {
                warn!(
                    path = %path.display(),
                    source = ?source,
                    "Config file not found, using compiled defaults"
                );
            }
        }
    }
}

/// Load configuration: resolve the file, fall back to defaults, apply env overrides
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigOrigin)> {
    let (mut config, origin) = match resolve_config_path(cli_arg) {
        Some((path, source)) if path.exists() => {
            let config = read_toml_config(&path)?;
            (config, ConfigOrigin::File { path, source })
        }
        Some((path, source)) => (TomlConfig::default(), ConfigOrigin::Missing { path, source }),
        None => (TomlConfig::default(), ConfigOrigin::Defaults),
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok((config, origin))
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

impl TomlConfig {
    /// Apply per-field environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(EMBEDDING_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.embedding.base_url = url;
            }
        }

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV_VAR) {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Reject values the scorer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.embedding.base_url.trim().is_empty() {
            return Err(Error::Config("embedding.base_url must not be empty".to_string()));
        }
        if self.embedding.max_in_flight == 0 {
            return Err(Error::Config("embedding.max_in_flight must be at least 1".to_string()));
        }
        if self.ranking.concurrency == 0 {
            return Err(Error::Config("ranking.concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}
