// Platform-specific device access
//
// Each supported OS gets a `PlatformIO` implementation that knows how to open
// a device without caching, size it and flush it. `DeviceHandle` is the
// portable `BlockDevice` built on top and `PlatformOpener` hands them out.

use super::{AlignedBuffer, BlockDevice, DeviceOpener, OpenMode};
use crate::error::{WipeError, WipeResult};
use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

/// What kind of node a handle was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    BlockDevice,
    /// Regular file standing in for a device (disk images, tests)
    ImageFile,
}

pub trait PlatformIO: Send + Sync {
    /// Open `path` with caching disabled and synchronous writes
    fn open_device(
        &self,
        path: &Path,
        mode: OpenMode,
        kind: DeviceKind,
        direct_io: bool,
    ) -> io::Result<File>;

    /// Capacity of an open block device in bytes
    fn block_device_size(&self, file: &File) -> io::Result<u64> {
        let mut file = file;
        let end = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;
        Ok(end)
    }

    /// Flush data and metadata to stable storage
    fn sync_device(&self, file: &File) -> io::Result<()> {
        file.sync_all()
    }

    /// Get platform name
    fn platform_name(&self) -> &str;
}

// ============= LINUX IMPLEMENTATION =============

#[cfg(target_os = "linux")]
mod linux_ioctl {
    // BLKGETSIZE64 = _IOR(0x12, 114, size_t)
    nix::ioctl_read!(blkgetsize64, 0x12, 114, u64);
}

#[cfg(target_os = "linux")]
pub struct LinuxIO;

#[cfg(target_os = "linux")]
impl LinuxIO {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
impl PlatformIO for LinuxIO {
    fn open_device(
        &self,
        path: &Path,
        mode: OpenMode,
        kind: DeviceKind,
        direct_io: bool,
    ) -> io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;

        let mut opts = OpenOptions::new();
        opts.read(true);

        let mut flags = 0;
        if kind == DeviceKind::BlockDevice && direct_io {
            // O_DIRECT for bypassing page cache
            flags |= libc::O_DIRECT;
        }
        if mode == OpenMode::ReadWrite {
            opts.write(true);
            flags |= libc::O_SYNC;
            if kind == DeviceKind::BlockDevice {
                // O_EXCL on a block device fails with EBUSY while it is in use
                flags |= libc::O_EXCL;
            }
        }
        opts.custom_flags(flags);

        opts.open(path)
    }

    fn block_device_size(&self, file: &File) -> io::Result<u64> {
        let mut size: u64 = 0;
        // SAFETY: the fd is valid for the lifetime of `file` and `size` is a
        // properly sized out-parameter for BLKGETSIZE64.
        unsafe { linux_ioctl::blkgetsize64(file.as_raw_fd(), &mut size) }.map_err(io::Error::from)?;
        Ok(size)
    }

    fn platform_name(&self) -> &str {
        "Linux"
    }
}

// ============= MACOS IMPLEMENTATION =============

#[cfg(target_os = "macos")]
mod macos_ioctl {
    // DKIOCGETBLOCKSIZE = _IOR('d', 24, uint32_t)
    nix::ioctl_read!(dkiocgetblocksize, b'd', 24, u32);
    // DKIOCGETBLOCKCOUNT = _IOR('d', 25, uint64_t)
    nix::ioctl_read!(dkiocgetblockcount, b'd', 25, u64);
}

#[cfg(target_os = "macos")]
pub struct MacOSIO;

#[cfg(target_os = "macos")]
impl MacOSIO {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl PlatformIO for MacOSIO {
    fn open_device(
        &self,
        path: &Path,
        mode: OpenMode,
        _kind: DeviceKind,
        direct_io: bool,
    ) -> io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;

        let mut opts = OpenOptions::new();
        opts.read(true);
        if mode == OpenMode::ReadWrite {
            opts.write(true).custom_flags(libc::O_SYNC);
        }

        let file = opts.open(path)?;

        if direct_io {
            // F_NOCACHE to bypass buffer cache on macOS
            // SAFETY: fcntl on a valid descriptor with an integer argument
            if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_NOCACHE, 1) } == -1 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(file)
    }

    fn block_device_size(&self, file: &File) -> io::Result<u64> {
        let mut block_size: u32 = 0;
        let mut block_count: u64 = 0;
        // SAFETY: valid descriptor and correctly typed out-parameters
        unsafe {
            macos_ioctl::dkiocgetblocksize(file.as_raw_fd(), &mut block_size)
                .map_err(io::Error::from)?;
            macos_ioctl::dkiocgetblockcount(file.as_raw_fd(), &mut block_count)
                .map_err(io::Error::from)?;
        }
        Ok(block_count * block_size as u64)
    }

    fn sync_device(&self, file: &File) -> io::Result<()> {
        // Use F_FULLFSYNC on macOS for guaranteed persistence
        // SAFETY: fcntl on a valid descriptor
        if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "macOS"
    }
}

// ============= OTHER UNIX IMPLEMENTATION =============

#[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
pub struct UnixIO;

#[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
impl UnixIO {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
impl PlatformIO for UnixIO {
    fn open_device(
        &self,
        path: &Path,
        mode: OpenMode,
        _kind: DeviceKind,
        _direct_io: bool,
    ) -> io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;

        let mut opts = OpenOptions::new();
        opts.read(true);
        if mode == OpenMode::ReadWrite {
            opts.write(true).custom_flags(libc::O_SYNC);
        }
        opts.open(path)
    }

    fn platform_name(&self) -> &str {
        "Unix"
    }
}

// ============= PLATFORM FACTORY =============

/// Get the appropriate platform I/O implementation
pub fn get_platform_io() -> Box<dyn PlatformIO> {
    #[cfg(target_os = "linux")]
    {
        Box::new(LinuxIO::new())
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(MacOSIO::new())
    }

    #[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
    {
        Box::new(UnixIO::new())
    }

    #[cfg(not(unix))]
    {
        compile_error!("Unsupported platform")
    }
}

// ============= DEVICE HANDLE =============

/// Options applied to every handle a `PlatformOpener` produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOptions {
    /// Bypass the page cache on block devices
    pub direct_io: bool,
    /// Accept regular files as targets
    pub allow_image_files: bool,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            direct_io: true,
            allow_image_files: false,
        }
    }
}

/// Opens real devices through the platform layer
#[derive(Debug, Clone, Default)]
pub struct PlatformOpener {
    options: HandleOptions,
}

impl PlatformOpener {
    pub fn new(options: HandleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> HandleOptions {
        self.options
    }
}

impl DeviceOpener for PlatformOpener {
    type Device = DeviceHandle;

    fn open(&self, path: &Path, mode: OpenMode) -> WipeResult<DeviceHandle> {
        DeviceHandle::open(path, mode, self.options)
    }
}

/// Open device. Read-write handles hold an exclusive advisory lock until
/// closed.
pub struct DeviceHandle {
    path: PathBuf,
    file: Option<File>,
    mode: OpenMode,
    kind: DeviceKind,
    position: u64,
    platform: Box<dyn PlatformIO>,
}

impl DeviceHandle {
    pub fn open(path: &Path, mode: OpenMode, options: HandleOptions) -> WipeResult<Self> {
        let open_error = |source: io::Error| WipeError::Open {
            path: path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(path).map_err(open_error)?;
        let kind = if metadata.file_type().is_block_device() {
            DeviceKind::BlockDevice
        } else if options.allow_image_files && metadata.is_file() {
            DeviceKind::ImageFile
        } else {
            return Err(open_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a block device",
            )));
        };

        let platform = get_platform_io();
        let file = platform
            .open_device(path, mode, kind, options.direct_io)
            .map_err(|source| match source.raw_os_error() {
                Some(libc::EBUSY) => WipeError::DeviceBusy {
                    path: path.to_path_buf(),
                },
                _ => open_error(source),
            })?;

        if mode == OpenMode::ReadWrite {
            match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
                Ok(()) => {}
                Err(e) if e == Errno::EWOULDBLOCK || e == Errno::EBUSY => {
                    return Err(WipeError::DeviceBusy {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) => return Err(open_error(io::Error::from(e))),
            }
        }

        tracing::debug!(
            device = %path.display(),
            mode = ?mode,
            kind = ?kind,
            platform = platform.platform_name(),
            direct_io = options.direct_io,
            "Opened device"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            mode,
            kind,
            position: 0,
            platform,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

fn active<'a>(
    file: &'a mut Option<File>,
    path: &Path,
    operation: &'static str,
    offset: u64,
) -> WipeResult<&'a mut File> {
    file.as_mut().ok_or_else(|| {
        WipeError::io(operation, path, offset, io::Error::other("device handle is closed"))
    })
}

impl BlockDevice for DeviceHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&mut self) -> WipeResult<u64> {
        let file = self.file.as_ref().ok_or_else(|| WipeError::SizeQuery {
            path: self.path.clone(),
            source: io::Error::other("device handle is closed"),
        })?;

        let size = match self.kind {
            DeviceKind::ImageFile => file.metadata().map(|m| m.len()),
            DeviceKind::BlockDevice => self.platform.block_device_size(file),
        };

        size.map_err(|source| WipeError::SizeQuery {
            path: self.path.clone(),
            source,
        })
    }

    fn seek_to_start(&mut self) -> WipeResult<()> {
        let file = active(&mut self.file, &self.path, "seek", self.position)?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| WipeError::io("seek", &self.path, self.position, e))?;
        self.position = 0;
        Ok(())
    }

    fn write_block(&mut self, data: &[u8]) -> WipeResult<usize> {
        let offset = self.position;
        let file = active(&mut self.file, &self.path, "write", offset)?;

        // Only EINTR is re-issued: nothing was transferred
        let written = loop {
            match file.write(data) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WipeError::io("write", &self.path, offset, e)),
            }
        };

        self.position += written as u64;
        Ok(written)
    }

    fn read_block(&mut self, capacity: usize) -> WipeResult<AlignedBuffer> {
        let offset = self.position;
        let file = active(&mut self.file, &self.path, "read", offset)?;
        let mut buffer = AlignedBuffer::page_aligned(capacity);

        let read = loop {
            match file.read(buffer.as_mut_slice()) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(WipeError::io("read", &self.path, offset, e)),
            }
        };

        buffer.truncate(read);
        self.position += read as u64;
        Ok(buffer)
    }

    fn sync(&mut self) -> WipeResult<()> {
        let file = active(&mut self.file, &self.path, "sync", self.position)?;
        self.platform
            .sync_device(file)
            .map_err(|e| WipeError::io("sync", &self.path, self.position, e))
    }

    fn close(&mut self) -> WipeResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        // Closing the descriptor also drops the flock
        nix::unistd::close(file.into_raw_fd())
            .map_err(|e| WipeError::io("close", &self.path, self.position, io::Error::from(e)))?;

        tracing::debug!(device = %self.path.display(), "Closed device");
        Ok(())
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.file.is_some() {
            tracing::debug!(
                device = %self.path.display(),
                "Device handle dropped without explicit close"
            );
        }
    }
}

#[cfg(test)]
mod platform_tests {
    use super::*;

    #[test]
    fn test_platform_io_creation() {
        let io = get_platform_io();
        assert!(!io.platform_name().is_empty());
    }

    #[test]
    fn test_default_options_refuse_image_files() {
        let options = HandleOptions::default();
        assert!(options.direct_io);
        assert!(!options.allow_image_files);
    }
}
