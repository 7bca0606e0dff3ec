pub mod aligned_buffer;
pub mod memory;
pub mod platform_specific;


// Re-exports
pub use aligned_buffer::{AlignedBuffer, PAGE_SIZE, SECTOR_SIZE};
pub use memory::{FaultPlan, MemoryDevice, MemoryOpener, MemoryState};
pub use platform_specific::{
    get_platform_io, DeviceHandle, DeviceKind, HandleOptions, PlatformIO, PlatformOpener,
};

use crate::error::WipeResult;
use std::path::Path;

/// Access mode of a device handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Verification reads; no exclusive lock is taken
    ReadOnly,
    /// Overwrite passes; exclusive and synchronous
    ReadWrite,
}

/// An open, exclusively owned channel to a block device.
///
/// Writes are issued as one system call per block so that a short transfer
/// is visible to the caller instead of being silently completed.
pub trait BlockDevice {
    fn path(&self) -> &Path;

    /// Capacity in bytes as reported by the block layer
    fn size(&mut self) -> WipeResult<u64>;

    fn seek_to_start(&mut self) -> WipeResult<()>;

    /// Write `data` at the current position with a single write call and
    /// return the number of bytes the kernel accepted.
    fn write_block(&mut self, data: &[u8]) -> WipeResult<usize>;

    /// Read up to `capacity` bytes at the current position with a single
    /// read call. The returned buffer is shortened to what was read.
    fn read_block(&mut self, capacity: usize) -> WipeResult<AlignedBuffer>;

    /// Flush everything written so far to stable storage
    fn sync(&mut self) -> WipeResult<()>;

    /// Release the device and surface any close error. Closing an already
    /// closed handle is a no-op.
    fn close(&mut self) -> WipeResult<()>;
}

/// Capability to open devices by path.
///
/// The wipe engine is generic over this so platform code and test doubles
/// are chosen by the caller, never inside the write loop.
pub trait DeviceOpener {
    type Device: BlockDevice;

    fn open(&self, path: &Path, mode: OpenMode) -> WipeResult<Self::Device>;
}
