pub mod algorithms;
pub mod config;
pub mod drives;
pub mod error;
pub mod io;
pub mod ui;
pub mod verification;
pub mod wipe_engine;

// Re-export the main entry points for convenience
pub use algorithms::{PassBuffer, PassPattern, PatternGenerator, WipeScheme};
pub use config::EngineConfig;
pub use drives::{DeviceCatalog, StaticCatalog, SysfsCatalog};
pub use error::{WipeError, WipeResult};
pub use wipe_engine::{CancelFlag, NoProgress, ProgressObserver, WipeEngine};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Default size of one write/read block (1 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Snapshot of a candidate device as reported by a `DeviceCatalog`.
///
/// Identity is the `path`. The engine reads it but never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub path: PathBuf,
    pub display_name: String,
    pub size_bytes: u64,
    pub removable: bool,
    pub mounted: bool,
}

impl DeviceDescriptor {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            display_name,
            size_bytes,
            removable: false,
            mounted: false,
        }
    }
}

/// Outcome of the optional post-wipe sample check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Verification was not requested
    Skipped,
    /// Every sampled block matched the final pass pattern
    Confirmed,
    /// A sampled block differed or could not be read back.
    /// The overwrite itself completed; this is advisory.
    Mismatch,
}

/// Mutable state of one wipe run.
///
/// Advances pass by pass and block by block, never backwards, and is dropped
/// when the run ends.
#[derive(Debug, Clone)]
pub struct WipeSession {
    id: Uuid,
    device: DeviceDescriptor,
    scheme: WipeScheme,
    current_pass: u32,
    passes_completed: u32,
    total_passes: u32,
    bytes_written_in_pass: u64,
    device_size_bytes: u64,
    started_at: DateTime<Utc>,
}

impl WipeSession {
    pub fn new(
        device: DeviceDescriptor,
        scheme: WipeScheme,
        total_passes: u32,
        device_size_bytes: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            device,
            scheme,
            current_pass: 0,
            passes_completed: 0,
            total_passes,
            bytes_written_in_pass: 0,
            device_size_bytes,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn scheme(&self) -> WipeScheme {
        self.scheme
    }

    /// Zero-based index of the pass in progress
    pub fn current_pass(&self) -> u32 {
        self.current_pass
    }

    pub fn passes_completed(&self) -> u32 {
        self.passes_completed
    }

    pub fn total_passes(&self) -> u32 {
        self.total_passes
    }

    pub fn bytes_written_in_pass(&self) -> u64 {
        self.bytes_written_in_pass
    }

    pub fn device_size_bytes(&self) -> u64 {
        self.device_size_bytes
    }

    pub fn remaining_in_pass(&self) -> u64 {
        self.device_size_bytes - self.bytes_written_in_pass
    }

    pub fn is_pass_complete(&self) -> bool {
        self.bytes_written_in_pass == self.device_size_bytes
    }

    /// Number of blocks one pass takes: `ceil(size / block_size)`
    pub fn total_blocks(&self, block_size: usize) -> u64 {
        self.device_size_bytes.div_ceil(block_size as u64)
    }

    /// Account for `bytes` just written in the current pass.
    ///
    /// Panics if the pass would run past the device size; the write loop
    /// sizes every chunk from `remaining_in_pass`, so this cannot happen.
    pub fn record_write(&mut self, bytes: u64) {
        assert!(
            bytes <= self.remaining_in_pass(),
            "write of {} bytes would pass the end of the device ({} remaining)",
            bytes,
            self.remaining_in_pass()
        );
        self.bytes_written_in_pass += bytes;
    }

    /// Close the current pass and move to the next one
    pub fn finish_pass(&mut self) {
        assert!(self.is_pass_complete(), "pass finished before covering the device");
        assert!(self.passes_completed < self.total_passes, "no pass left to finish");

        self.passes_completed += 1;
        if self.passes_completed < self.total_passes {
            self.current_pass += 1;
            self.bytes_written_in_pass = 0;
        }
    }

    /// Overall completion across all passes, 0.0..=100.0.
    ///
    /// Counted in whole blocks; the ratio is formed from integers so the last
    /// block of the last pass reports exactly 100.
    pub fn percent_complete(&self, blocks_in_pass: u64, total_blocks: u64) -> f64 {
        let total = u64::from(self.total_passes) * total_blocks;
        if total == 0 {
            return 100.0;
        }
        let done = u64::from(self.passes_completed) * total_blocks + blocks_in_pass;
        (done as f64 / total as f64) * 100.0
    }

    /// Seal the session into a report
    pub fn into_report(self, verification: VerificationStatus) -> WipeReport {
        WipeReport {
            session_id: self.id,
            bytes_written: u64::from(self.passes_completed) * self.device_size_bytes,
            device: self.device,
            scheme: self.scheme,
            device_size_bytes: self.device_size_bytes,
            passes_completed: self.passes_completed,
            verification,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Summary of a successful wipe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeReport {
    pub session_id: Uuid,
    pub device: DeviceDescriptor,
    pub scheme: WipeScheme,
    pub device_size_bytes: u64,
    pub passes_completed: u32,
    /// Bytes written across all passes
    pub bytes_written: u64,
    pub verification: VerificationStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WipeReport {
    pub fn elapsed(&self) -> std::time::Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
