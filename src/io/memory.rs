//! In-memory block device with fault injection.
//!
//! Used by the test suites and benchmarks in place of real hardware. All
//! handles opened from one `MemoryOpener` share the same backing state, so a
//! test can inspect the bytes written, the size of every write call and how
//! often the device was closed after the engine has finished with it.

use super::{AlignedBuffer, BlockDevice, DeviceOpener, OpenMode};
use crate::error::{WipeError, WipeResult};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Failures to inject into the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Zero-based write call that transfers only half its data
    pub short_write_at_call: Option<u64>,
    /// Zero-based write call that fails with an I/O error
    pub fail_write_at_call: Option<u64>,
    /// `size()` fails
    pub fail_size_query: bool,
    /// Opens in this mode fail with a permission error
    pub fail_open: Option<OpenMode>,
    /// Read-write opens report the device as busy
    pub busy: bool,
    /// Byte offset flipped in every read that covers it
    pub corrupt_read_at: Option<u64>,
    /// Zero-based read call that returns only half the requested bytes
    pub short_read_at_call: Option<u64>,
    /// `close()` fails (the handle is still released)
    pub fail_close: bool,
}

/// Shared state behind every handle of one `MemoryOpener`
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub contents: Vec<u8>,
    /// Byte count accepted by each write call, in order
    pub write_sizes: Vec<usize>,
    /// Byte count returned by each read call, in order
    pub read_sizes: Vec<usize>,
    pub opens: Vec<OpenMode>,
    pub closes: usize,
    pub syncs: usize,
    /// Handles opened and not yet closed
    pub open_handles: usize,
}

#[derive(Debug, Clone)]
pub struct MemoryOpener {
    state: Arc<Mutex<MemoryState>>,
    faults: FaultPlan,
}

impl MemoryOpener {
    /// Zero-filled device of `size` bytes
    pub fn new(size: usize) -> Self {
        Self::with_contents(vec![0u8; size])
    }

    /// Device whose initial contents are `contents`
    pub fn with_contents(contents: Vec<u8>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                contents,
                ..MemoryState::default()
            })),
            faults: FaultPlan::default(),
        }
    }

    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Lock the shared state for inspection
    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }

    /// Copy of the shared state
    pub fn snapshot(&self) -> MemoryState {
        self.state().clone()
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DeviceOpener for MemoryOpener {
    type Device = MemoryDevice;

    fn open(&self, path: &Path, mode: OpenMode) -> WipeResult<MemoryDevice> {
        if self.faults.fail_open == Some(mode) {
            return Err(WipeError::Open {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "injected open failure"),
            });
        }
        if self.faults.busy && mode == OpenMode::ReadWrite {
            return Err(WipeError::DeviceBusy {
                path: path.to_path_buf(),
            });
        }

        let mut state = lock(&self.state);
        state.opens.push(mode);
        state.open_handles += 1;

        Ok(MemoryDevice {
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
            faults: self.faults.clone(),
            mode,
            position: 0,
            write_calls: 0,
            read_calls: 0,
            closed: false,
        })
    }
}

pub struct MemoryDevice {
    path: PathBuf,
    state: Arc<Mutex<MemoryState>>,
    faults: FaultPlan,
    mode: OpenMode,
    position: u64,
    write_calls: u64,
    read_calls: u64,
    closed: bool,
}

impl MemoryDevice {
    fn ensure_open(&self, operation: &'static str) -> WipeResult<()> {
        if self.closed {
            return Err(WipeError::io(
                operation,
                &self.path,
                self.position,
                io::Error::other("device handle is closed"),
            ));
        }
        Ok(())
    }
}

impl BlockDevice for MemoryDevice {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&mut self) -> WipeResult<u64> {
        if self.faults.fail_size_query {
            return Err(WipeError::SizeQuery {
                path: self.path.clone(),
                source: io::Error::other("injected size query failure"),
            });
        }
        Ok(lock(&self.state).contents.len() as u64)
    }

    fn seek_to_start(&mut self) -> WipeResult<()> {
        self.ensure_open("seek")?;
        self.position = 0;
        Ok(())
    }

    fn write_block(&mut self, data: &[u8]) -> WipeResult<usize> {
        self.ensure_open("write")?;
        if self.mode == OpenMode::ReadOnly {
            return Err(WipeError::io(
                "write",
                &self.path,
                self.position,
                io::Error::from_raw_os_error(libc::EBADF),
            ));
        }

        let call = self.write_calls;
        self.write_calls += 1;

        if self.faults.fail_write_at_call == Some(call) {
            return Err(WipeError::io(
                "write",
                &self.path,
                self.position,
                io::Error::from_raw_os_error(libc::EIO),
            ));
        }

        let mut state = lock(&self.state);
        let start = (self.position as usize).min(state.contents.len());
        let mut count = data.len().min(state.contents.len() - start);
        if self.faults.short_write_at_call == Some(call) {
            count /= 2;
        }

        state.contents[start..start + count].copy_from_slice(&data[..count]);
        state.write_sizes.push(count);
        self.position += count as u64;
        Ok(count)
    }

    fn read_block(&mut self, capacity: usize) -> WipeResult<AlignedBuffer> {
        self.ensure_open("read")?;

        let call = self.read_calls;
        self.read_calls += 1;

        let mut state = lock(&self.state);
        let start = (self.position as usize).min(state.contents.len());
        let mut count = capacity.min(state.contents.len() - start);
        if self.faults.short_read_at_call == Some(call) {
            count /= 2;
        }

        let mut buffer = AlignedBuffer::from_slice(&state.contents[start..start + count]);
        if let Some(corrupt) = self.faults.corrupt_read_at {
            let corrupt = corrupt as usize;
            if (start..start + count).contains(&corrupt) {
                buffer.as_mut_slice()[corrupt - start] ^= 0xFF;
            }
        }

        state.read_sizes.push(count);
        self.position += count as u64;
        Ok(buffer)
    }

    fn sync(&mut self) -> WipeResult<()> {
        self.ensure_open("sync")?;
        lock(&self.state).syncs += 1;
        Ok(())
    }

    fn close(&mut self) -> WipeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut state = lock(&self.state);
        state.closes += 1;
        state.open_handles -= 1;

        if self.faults.fail_close {
            return Err(WipeError::io(
                "close",
                &self.path,
                self.position,
                io::Error::from_raw_os_error(libc::EIO),
            ));
        }
        Ok(())
    }
}
