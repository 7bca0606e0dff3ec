/// Error taxonomy for wipe sessions
///
/// Every fatal condition of a run maps to exactly one `WipeError` variant.
/// A verification mismatch is advisory and is reported through
/// `VerificationStatus::Mismatch` on the wipe report instead.
///
/// No variant is retried by the engine. Raw device I/O that failed at an
/// ambiguous offset is never re-issued.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WipeError {
    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Device {} is busy (held open exclusively by another process or mounted)", .path.display())]
    DeviceBusy { path: PathBuf },

    #[error("Cannot determine capacity of {}: {source}", .path.display())]
    SizeQuery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Device {} reports a capacity of 0 bytes", .path.display())]
    EmptyDevice { path: PathBuf },

    #[error(
        "Short write on {} at offset {offset}: {written} of {requested} bytes",
        .path.display()
    )]
    ShortWrite {
        path: PathBuf,
        offset: u64,
        requested: usize,
        written: usize,
    },

    #[error("Device {} is mounted; unmount it before wiping", .path.display())]
    MountedDevice { path: PathBuf },

    #[error(
        "I/O error during {operation} on {} at offset {offset}: {source}",
        .path.display()
    )]
    Io {
        operation: &'static str,
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "Wipe of {} cancelled during pass {pass} after {bytes_written} bytes",
        .path.display()
    )]
    Cancelled {
        path: PathBuf,
        pass: u32,
        bytes_written: u64,
    },
}

impl WipeError {
    /// Short stable name of the error kind, used in logs and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            WipeError::Open { .. } => "open",
            WipeError::DeviceBusy { .. } => "device_busy",
            WipeError::SizeQuery { .. } => "size_query",
            WipeError::EmptyDevice { .. } => "empty_device",
            WipeError::ShortWrite { .. } => "short_write",
            WipeError::MountedDevice { .. } => "mounted_device",
            WipeError::Io { .. } => "io",
            WipeError::Cancelled { .. } => "cancelled",
        }
    }

    /// Wrap an I/O failure for `operation` at `offset`
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        offset: u64,
        source: io::Error,
    ) -> Self {
        WipeError::Io {
            operation,
            path: path.into(),
            offset,
            source,
        }
    }
}

pub type WipeResult<T> = Result<T, WipeError>;
