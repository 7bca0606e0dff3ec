// Device enumeration
//
// - catalog.rs: DeviceCatalog trait and a fixed-list catalog
// - detection.rs: Linux sysfs scan
// - mounts.rs: mount and swap table parsing for in-use detection

pub mod catalog;
pub mod detection;
pub mod mounts;

// Tests
#[cfg(test)]
mod detection_tests;

pub use catalog::{CatalogError, DeviceCatalog, StaticCatalog};
pub use detection::{SysfsCatalog, SysfsRoots};
pub use mounts::MountTable;
