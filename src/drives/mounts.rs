// Mount and swap tables
//
// Collects the kernel names of every block device that backs a mounted
// filesystem or an active swap area, so the catalog can flag disks that are
// in use.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    names: BTreeSet<String>,
}

impl MountTable {
    /// Read `/proc/mounts` style and `/proc/swaps` style files.
    ///
    /// The mounts file must exist; a missing swaps file means no swap.
    pub fn load(mounts: &Path, swaps: &Path) -> io::Result<Self> {
        let mut table = Self::default();
        table.parse_mounts(&fs::read_to_string(mounts)?);

        match fs::read_to_string(swaps) {
            Ok(contents) => table.parse_swaps(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        Ok(table)
    }

    /// Add the sources of a mounts file (`source target fstype options ...`)
    pub fn parse_mounts(&mut self, contents: &str) {
        for line in contents.lines() {
            if let Some(source) = line.split_whitespace().next() {
                self.add_source(&unescape(source));
            }
        }
    }

    /// Add the active swap areas (`Filename Type Size Used Priority`)
    pub fn parse_swaps(&mut self, contents: &str) {
        for line in contents.lines().skip(1) {
            if let Some(source) = line.split_whitespace().next() {
                self.add_source(&unescape(source));
            }
        }
    }

    fn add_source(&mut self, source: &str) {
        let path = Path::new(source);
        if !path.is_absolute() {
            // proc, tmpfs, server:/export and friends
            return;
        }

        // Resolve /dev/disk/by-*/ and /dev/mapper/ symlinks to the kernel node
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        for candidate in [path, resolved.as_path()] {
            if let Some(name) = candidate.file_name() {
                self.names.insert(name.to_string_lossy().into_owned());
            }
        }
    }

    /// True if the device named `name` (e.g. `sda1`) is mounted or swapped on
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// True if `disk` or any of its partitions is in the table.
    ///
    /// `partitions` lists partitions known from sysfs; names following the
    /// kernel conventions (`sda1`, `nvme0n1p2`, `mmcblk0p1`) match even when
    /// not listed.
    pub fn disk_in_use(&self, disk: &str, partitions: &[String]) -> bool {
        self.contains(disk)
            || partitions.iter().any(|p| self.contains(p))
            || self.names.iter().any(|name| is_partition_name(disk, name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// `sda` + `1`, or `nvme0n1` + `p1`
pub(crate) fn is_partition_name(disk: &str, name: &str) -> bool {
    let Some(rest) = name.strip_prefix(disk) else {
        return false;
    };
    let digits = rest.strip_prefix('p').unwrap_or(rest);
    let disk_ends_in_digit = disk.chars().last().is_some_and(|c| c.is_ascii_digit());

    // sda1 style only when the disk name ends in a letter
    if rest == digits && disk_ends_in_digit {
        return false;
    }
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Decode the octal escapes the kernel uses for whitespace in mount fields
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
