//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/inboxview/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/inboxview/` (~/.config/inboxview/)
//! - State/Logs: `$XDG_STATE_HOME/inboxview/` (~/.local/state/inboxview/)
//!
//! Nothing is ever written next to the archive itself.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Archive layout conventions
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Attachment display settings
    #[serde(default)]
    pub attachments: AttachmentConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Naming conventions of the export format.
///
/// The defaults match the format as exported today; they are configurable
/// so that a renamed or localized export can still be opened.
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Name of the folder holding one subfolder per conversation (case-insensitive)
    #[serde(default = "default_conversations_label")]
    pub conversations_label: String,

    /// How many levels below the granted folder to search for it
    #[serde(default = "default_max_search_depth")]
    pub max_search_depth: usize,

    /// File name prefix of numbered part files (`message_1.json`, ...)
    #[serde(default = "default_part_prefix")]
    pub part_prefix: String,

    /// Leading segment of attachment URIs, stripped before resolution
    #[serde(default = "default_attachment_prefix")]
    pub attachment_prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            conversations_label: default_conversations_label(),
            max_search_depth: default_max_search_depth(),
            part_prefix: default_part_prefix(),
            attachment_prefix: default_attachment_prefix(),
        }
    }
}

impl ArchiveConfig {
    /// File name of part `index` (1-based).
    pub fn part_file_name(&self, index: usize) -> String {
        format!("{}{}.json", self.part_prefix, index)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.conversations_label.trim().is_empty() {
            return Err(Error::Config(
                "archive.conversations_label must not be empty".to_string(),
            ));
        }
        if self.max_search_depth == 0 {
            return Err(Error::Config(
                "archive.max_search_depth must be at least 1".to_string(),
            ));
        }
        if self.part_prefix.is_empty() || self.part_prefix.contains('/') {
            return Err(Error::Config(
                "archive.part_prefix must be a non-empty file name prefix".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_conversations_label() -> String {
    "inbox".to_string()
}

fn default_max_search_depth() -> usize {
    3
}

fn default_part_prefix() -> String {
    "message_".to_string()
}

fn default_attachment_prefix() -> String {
    "messages/".to_string()
}

/// Attachment display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AttachmentConfig {
    /// Maximum number of live attachment handles kept by a handle pool
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
        }
    }
}

fn default_pool_capacity() -> usize {
    64
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.archive.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/inboxview/config.toml` (~/.config/inboxview/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("inboxview").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/inboxview/` (~/.local/state/inboxview/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("inboxview")
    }
}
