/// Mock drive infrastructure for testing
///
/// Regular files stand in for block devices. The wipe engine accepts them
/// when the opener is configured with `allow_image_files`.
use secure_eraser::io::{HandleOptions, PlatformOpener};
use secure_eraser::DeviceDescriptor;
use std::io::{Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

/// Byte used to fill fresh mock drives, simulating old data
pub const OLD_DATA: u8 = 0xAB;

/// Mock drive instance
pub struct MockDrive {
    pub temp_file: NamedTempFile,
    size_bytes: u64,
}

impl MockDrive {
    /// Create a mock drive of exactly `size_bytes`, filled with `OLD_DATA`
    pub fn with_size(size_bytes: u64) -> std::io::Result<Self> {
        let mut temp_file = NamedTempFile::new()?;

        let mut written = 0u64;
        let chunk_size = 1024 * 1024; // 1MB chunks

        while written < size_bytes {
            let write_size = (size_bytes - written).min(chunk_size);
            temp_file.write_all(&vec![OLD_DATA; write_size as usize])?;
            written += write_size;
        }

        temp_file.flush()?;
        temp_file.seek(SeekFrom::Start(0))?;

        Ok(Self {
            temp_file,
            size_bytes,
        })
    }

    /// Create a mock drive of `size_mb` mebibytes
    pub fn create(size_mb: u64) -> std::io::Result<Self> {
        Self::with_size(size_mb * 1024 * 1024)
    }

    /// Get the path to the mock drive file
    pub fn path(&self) -> &std::path::Path {
        self.temp_file.path()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Catalog entry for this drive
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(self.path(), self.size_bytes)
    }

    /// Opener that accepts image files with buffered I/O
    pub fn opener() -> PlatformOpener {
        PlatformOpener::new(HandleOptions {
            direct_io: false,
            allow_image_files: true,
        })
    }
}

#[cfg(target_os = "linux")]
pub mod loopback {
    //! Linux loopback device utilities for more realistic testing
    //!
    //! These require root privileges; tests using them are `#[ignore]`d.

    use std::path::Path;
    use std::process::Command;

    /// Attach `file_path` to a free loop device and return its path
    #[allow(dead_code)]
    pub fn create_loopback(file_path: &Path) -> std::io::Result<String> {
        let output = Command::new("losetup")
            .arg("-f")
            .arg("--show")
            .arg(file_path)
            .output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "Failed to create loop device: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Detach a loopback device
    #[allow(dead_code)]
    pub fn detach_loopback(loop_device: &str) -> std::io::Result<()> {
        let output = Command::new("losetup").args(["-d", loop_device]).output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "Failed to detach loop device: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(())
    }
}
