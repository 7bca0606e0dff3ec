//! Engine configuration.
//!
//! Settings are layered, lowest priority first: built-in defaults, the
//! per-user `config.toml`, an explicit file given on the command line, and
//! `SECURE_ERASER_*` environment variables. Command-line flags are applied by
//! the binary on top of the loaded value.

use crate::verification::DEFAULT_SAMPLE_BLOCKS;
use crate::DEFAULT_BLOCK_SIZE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of environment variables read by `EngineConfig::load`
pub const ENV_PREFIX: &str = "SECURE_ERASER";

/// Default number of blocks between progress callbacks
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Block size must be greater than zero")]
    ZeroBlockSize,

    #[error("Block size {0} is not a multiple of 512 bytes, required for direct I/O")]
    UnalignedBlockSize(usize),

    #[error("Progress interval must be at least one block")]
    ZeroProgressInterval,

    #[error("Verification sample must be at least one block")]
    ZeroSampleBlocks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bytes per write and read call
    pub block_size: usize,
    /// Blocks between progress callbacks within a pass
    pub progress_interval_blocks: u64,
    /// Leading blocks read back by verification
    pub verify_sample_blocks: u64,
    /// Bypass the page cache on block devices
    pub direct_io: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            progress_interval_blocks: DEFAULT_PROGRESS_INTERVAL,
            verify_sample_blocks: DEFAULT_SAMPLE_BLOCKS,
            direct_io: true,
        }
    }
}

impl EngineConfig {
    /// Load the layered configuration. `explicit` must exist if given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(Self::user_config_path().as_deref(), explicit)
    }

    /// Same as `load` with the per-user file location supplied by the caller
    pub fn load_from(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = user_file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let loaded: EngineConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        tracing::debug!(config = ?loaded, "Loaded engine configuration");
        Ok(loaded)
    }

    /// `config.toml` in the platform's per-user configuration directory
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "secure-eraser").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.direct_io && self.block_size % crate::io::SECTOR_SIZE != 0 {
            return Err(ConfigError::UnalignedBlockSize(self.block_size));
        }
        if self.progress_interval_blocks == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        if self.verify_sample_blocks == 0 {
            return Err(ConfigError::ZeroSampleBlocks);
        }
        Ok(())
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_direct_io(mut self, direct_io: bool) -> Self {
        self.direct_io = direct_io;
        self
    }
}
