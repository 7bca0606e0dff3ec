use super::catalog::{CatalogError, DeviceCatalog};
use super::mounts::MountTable;
use crate::DeviceDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bytes per sysfs `size` unit, independent of the logical block size
const SYSFS_SECTOR: u64 = 512;

/// Filesystem locations read by `SysfsCatalog`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsRoots {
    pub sys_block: PathBuf,
    pub dev_dir: PathBuf,
    pub mounts: PathBuf,
    pub swaps: PathBuf,
}

impl Default for SysfsRoots {
    fn default() -> Self {
        Self {
            sys_block: PathBuf::from("/sys/block"),
            dev_dir: PathBuf::from("/dev"),
            mounts: PathBuf::from("/proc/mounts"),
            swaps: PathBuf::from("/proc/swaps"),
        }
    }
}

/// Linux block device enumeration through sysfs
#[derive(Debug, Clone, Default)]
pub struct SysfsCatalog {
    roots: SysfsRoots,
}

impl SysfsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(roots: SysfsRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &SysfsRoots {
        &self.roots
    }

    /// Check if device should be skipped
    pub(crate) fn should_skip_device(device_name: &str) -> bool {
        // Skip loop devices, ram disks, device mapper, etc.
        device_name.starts_with("loop")
            || device_name.starts_with("ram")
            || device_name.starts_with("dm-")
            || device_name.starts_with("sr") // CD/DVD drives
            || device_name.starts_with("zram")
    }

    fn describe(&self, name: &str, table: &MountTable) -> Result<Option<DeviceDescriptor>, CatalogError> {
        let dev_path = self.roots.dev_dir.join(name);
        if !dev_path.exists() {
            tracing::debug!(device = name, "No device node, skipping");
            return Ok(None);
        }

        let sys_dir = self.roots.sys_block.join(name);

        let sectors = match read_attribute(&sys_dir.join("size"))? {
            Some(value) => value.parse::<u64>().map_err(|_| CatalogError::Parse {
                path: sys_dir.join("size"),
                value,
            })?,
            None => 0,
        };

        let removable = read_attribute(&sys_dir.join("removable"))?.as_deref() == Some("1");

        let display_name = read_attribute(&sys_dir.join("device").join("model"))?
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| name.to_string());

        let partitions = partitions_of(&sys_dir)?;
        let has_holders = has_holders(&sys_dir)?
            || partitions
                .iter()
                .map(|p| has_holders(&sys_dir.join(p)))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .any(|held| held);

        let mounted = table.disk_in_use(name, &partitions) || has_holders;

        Ok(Some(DeviceDescriptor {
            path: dev_path,
            display_name,
            size_bytes: sectors * SYSFS_SECTOR,
            removable,
            mounted,
        }))
    }
}

impl DeviceCatalog for SysfsCatalog {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, CatalogError> {
        let sys_block = &self.roots.sys_block;
        if !sys_block.exists() {
            tracing::warn!(path = %sys_block.display(), "sysfs block directory not present");
            return Ok(Vec::new());
        }

        let table = MountTable::load(&self.roots.mounts, &self.roots.swaps).map_err(|source| {
            CatalogError::Read {
                path: self.roots.mounts.clone(),
                source,
            }
        })?;

        let mut names = read_dir_names(sys_block)?;
        names.sort();

        let mut devices = Vec::new();
        for name in names {
            if Self::should_skip_device(&name) {
                continue;
            }
            if let Some(descriptor) = self.describe(&name, &table)? {
                tracing::debug!(
                    device = %descriptor.path.display(),
                    size = descriptor.size_bytes,
                    removable = descriptor.removable,
                    mounted = descriptor.mounted,
                    "Found block device"
                );
                devices.push(descriptor);
            }
        }

        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(devices)
    }

    /// Matches symlinked paths such as `/dev/disk/by-id/...` too
    fn find(&self, path: &Path) -> Result<Option<DeviceDescriptor>, CatalogError> {
        let wanted = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(self.devices()?.into_iter().find(|d| {
            d.path == path
                || fs::canonicalize(&d.path)
                    .map(|p| p == wanted)
                    .unwrap_or(false)
        }))
    }
}

/// Trimmed contents of a sysfs attribute, `None` if it does not exist
fn read_attribute(path: &Path) -> Result<Option<String>, CatalogError> {
    match fs::read_to_string(path) {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CatalogError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_dir_names(dir: &Path) -> Result<Vec<String>, CatalogError> {
    let read_error = |source| CatalogError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Partition subdirectories of a disk (those carrying a `partition` file)
fn partitions_of(sys_dir: &Path) -> Result<Vec<String>, CatalogError> {
    if !sys_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut partitions: Vec<String> = read_dir_names(sys_dir)?
        .into_iter()
        .filter(|name| sys_dir.join(name).join("partition").is_file())
        .collect();
    partitions.sort();
    Ok(partitions)
}

/// True if another block device (LVM, dm-crypt, md) is stacked on this one
fn has_holders(sys_dir: &Path) -> Result<bool, CatalogError> {
    let holders = sys_dir.join("holders");
    if !holders.is_dir() {
        return Ok(false);
    }
    Ok(!read_dir_names(&holders)?.is_empty())
}
