//! File-backed test environment
//!
//! Provides an isolated database directory with automatic cleanup using RAII.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use tempora_core::config::{ClockMode, Config};
use tempora_engine::Engine;

/// Isolated on-disk store with automatic cleanup
pub struct TestEnvironment {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnvironment {
    /// Create a new test environment with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_clock(ClockMode::Logical)
    }

    pub fn with_clock(clock: ClockMode) -> Result<Self> {
        let temp_dir = TempDir::with_prefix("tempora-test")
            .context("Failed to create temporary directory")?;

        let mut config = Config::default();
        config.storage.database_path = Some(
            temp_dir
                .path()
                .join("databases")
                .join("tempora.db")
                .to_string_lossy()
                .into_owned(),
        );
        config.storage.clock = clock;

        Ok(Self { temp_dir, config })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.storage.resolved_database_path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open an engine on the environment's database; every call sees the same file
    pub fn engine(&self) -> Result<Engine> {
        crate::init_test_logging();
        Engine::open(self.config.clone()).context("Failed to open test engine")
    }
}
