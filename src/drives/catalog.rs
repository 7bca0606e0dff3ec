use crate::DeviceDescriptor;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unexpected value '{value}' in {}", .path.display())]
    Parse { path: PathBuf, value: String },
}

/// Source of candidate devices.
///
/// Descriptors are snapshots; callers re-query for fresh mount state.
pub trait DeviceCatalog {
    /// All candidate devices, ordered by path
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, CatalogError>;

    /// Descriptor whose path equals `path`
    fn find(&self, path: &Path) -> Result<Option<DeviceDescriptor>, CatalogError> {
        Ok(self.devices()?.into_iter().find(|d| d.path == path))
    }
}

/// Catalog over a fixed list of descriptors
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    devices: Vec<DeviceDescriptor>,
}

impl StaticCatalog {
    pub fn new(mut devices: Vec<DeviceDescriptor>) -> Self {
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Self { devices }
    }
}

impl DeviceCatalog for StaticCatalog {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, CatalogError> {
        Ok(self.devices.clone())
    }
}
