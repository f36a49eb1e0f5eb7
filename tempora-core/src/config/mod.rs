//! Configuration types for Tempora

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::TemporaError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How a document's cut advances on each externally visible mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// previous + 1
    Logical,
    /// max(previous + 1, milliseconds since the Unix epoch)
    Wall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file; defaults to `$TEMPORA_DATA_DIR/tempora.db`
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    #[serde(default = "default_clock")]
    pub clock: ClockMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Prefix of the id/from/to annotation attributes
    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,
    /// How an OPEN end is written in annotations
    #[serde(default = "default_open_label")]
    pub open_label: String,
    /// Spaces per nesting level; 0 renders on one line
    #[serde(default = "default_indent")]
    pub indent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

// Default value functions
fn default_busy_timeout_ms() -> u64 { 5000 }
fn default_journal_mode() -> String { "WAL".to_string() }
fn default_clock() -> ClockMode { ClockMode::Logical }
fn default_annotation_prefix() -> String { "t".to_string() }
fn default_open_label() -> String { "now".to_string() }
fn default_indent() -> usize { 0 }
fn default_log_level() -> String { "warn".to_string() }
fn default_with_target() -> bool { false }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
            clock: default_clock(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: default_annotation_prefix(),
            open_label: default_open_label(),
            indent: default_indent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: default_with_target(),
        }
    }
}

impl StorageConfig {
    /// The configured database file, or the default location under the data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::system::default_database_path)
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, TemporaError> {
    let path = path.as_ref();
    debug!("Loading config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| TemporaError::Configuration(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), TemporaError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| TemporaError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path.as_ref(), contents)?;
    debug!("Saved config to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.database_path, None);
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.storage.journal_mode, "WAL");
        assert_eq!(config.storage.clock, ClockMode::Logical);

        assert_eq!(config.render.annotation_prefix, "t");
        assert_eq!(config.render.open_label, "now");
        assert_eq!(config.render.indent, 0);

        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.with_target);
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[storage]
database_path = "/var/lib/tempora/catalog.db"
clock = "wall"

[render]
indent = 2
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.storage.database_path,
            Some("/var/lib/tempora/catalog.db".to_string())
        );
        assert_eq!(config.storage.clock, ClockMode::Wall);
        // Unspecified fields keep their defaults
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.render.indent, 2);
        assert_eq!(config.render.open_label, "now");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nclock = \"lunar\"").unwrap();

        match load_config(file.path()) {
            Err(TemporaError::Configuration(msg)) => assert!(msg.contains("Failed to parse")),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.render.annotation_prefix = "hist".to_string();
        config.logging.level = "debug".to_string();

        save_config(file.path(), &config).unwrap();
        let reloaded = load_config(file.path()).unwrap();

        assert_eq!(reloaded.render.annotation_prefix, "hist");
        assert_eq!(reloaded.logging.level, "debug");
        assert_eq!(reloaded.storage.clock, ClockMode::Logical);
    }

    #[test]
    fn test_resolved_database_path_prefers_explicit() {
        let storage = StorageConfig {
            database_path: Some("/tmp/explicit.db".to_string()),
            ..StorageConfig::default()
        };
        assert_eq!(storage.resolved_database_path(), PathBuf::from("/tmp/explicit.db"));
    }
}
