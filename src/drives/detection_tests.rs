/// Tests for sysfs device enumeration and in-use detection
/// Fixtures build a fake /sys/block, /dev, /proc/mounts and /proc/swaps in a
/// temporary directory.

#[cfg(test)]
mod drive_detection_tests {
    use super::super::catalog::{CatalogError, DeviceCatalog, StaticCatalog};
    use super::super::detection::{SysfsCatalog, SysfsRoots};
    use super::super::mounts::{is_partition_name, MountTable};
    use crate::DeviceDescriptor;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct FakeSystem {
        dir: TempDir,
    }

    impl FakeSystem {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("sys/block")).unwrap();
            fs::create_dir_all(dir.path().join("dev")).unwrap();
            fs::write(dir.path().join("mounts"), "proc /proc proc rw 0 0\n").unwrap();
            Self { dir }
        }

        fn disk(&self, name: &str, sectors: u64, removable: bool) -> PathBuf {
            let sys = self.dir.path().join("sys/block").join(name);
            fs::create_dir_all(sys.join("holders")).unwrap();
            fs::write(sys.join("size"), format!("{}\n", sectors)).unwrap();
            fs::write(sys.join("removable"), if removable { "1\n" } else { "0\n" }).unwrap();
            fs::write(self.dev(name), b"").unwrap();
            sys
        }

        fn partition(&self, disk: &str, name: &str) {
            let sys = self.dir.path().join("sys/block").join(disk).join(name);
            fs::create_dir_all(sys.join("holders")).unwrap();
            fs::write(sys.join("partition"), "1\n").unwrap();
            fs::write(self.dev(name), b"").unwrap();
        }

        fn dev(&self, name: &str) -> PathBuf {
            self.dir.path().join("dev").join(name)
        }

        fn mounts(&self, contents: &str) {
            fs::write(self.dir.path().join("mounts"), contents).unwrap();
        }

        fn swaps(&self, contents: &str) {
            fs::write(self.dir.path().join("swaps"), contents).unwrap();
        }

        fn catalog(&self) -> SysfsCatalog {
            SysfsCatalog::with_roots(SysfsRoots {
                sys_block: self.dir.path().join("sys/block"),
                dev_dir: self.dir.path().join("dev"),
                mounts: self.dir.path().join("mounts"),
                swaps: self.dir.path().join("swaps"),
            })
        }
    }

    // ==================== SKIP RULES ====================

    #[test]
    fn test_should_skip_virtual_devices() {
        for name in ["loop0", "loop99", "ram0", "dm-1", "sr0", "zram0"] {
            assert!(SysfsCatalog::should_skip_device(name), "{} should be skipped", name);
        }
    }

    #[test]
    fn test_should_not_skip_physical_drives() {
        for name in ["sda", "sdb", "nvme0n1", "hda", "vda", "mmcblk0"] {
            assert!(!SysfsCatalog::should_skip_device(name), "{} should be listed", name);
        }
    }

    // ==================== SYSFS PARSING ====================

    #[test]
    fn test_lists_disks_sorted_with_sizes() {
        let fake = FakeSystem::new();
        fake.disk("sdb", 2048, true);
        fake.disk("sda", 20480, false);
        fake.disk("loop0", 100, false);

        let devices = fake.catalog().devices().unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].path, fake.dev("sda"));
        assert_eq!(devices[0].size_bytes, 20480 * 512);
        assert!(!devices[0].removable);
        assert_eq!(devices[1].path, fake.dev("sdb"));
        assert_eq!(devices[1].size_bytes, 1024 * 1024);
        assert!(devices[1].removable);
        assert!(devices.iter().all(|d| !d.mounted));
    }

    #[test]
    fn test_display_name_from_model() {
        let fake = FakeSystem::new();
        let sys = fake.disk("sda", 8, false);
        fs::create_dir_all(sys.join("device")).unwrap();
        fs::write(sys.join("device/model"), "Samsung SSD 860   \n").unwrap();
        fake.disk("sdb", 8, false);

        let devices = fake.catalog().devices().unwrap();
        assert_eq!(devices[0].display_name, "Samsung SSD 860");
        assert_eq!(devices[1].display_name, "sdb");
    }

    #[test]
    fn test_missing_device_node_is_skipped() {
        let fake = FakeSystem::new();
        fake.disk("sda", 8, false);
        fs::remove_file(fake.dev("sda")).unwrap();

        assert!(fake.catalog().devices().unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_size_is_an_error() {
        let fake = FakeSystem::new();
        let sys = fake.disk("sda", 8, false);
        fs::write(sys.join("size"), "lots\n").unwrap();

        assert!(matches!(
            fake.catalog().devices(),
            Err(CatalogError::Parse { value, .. }) if value == "lots"
        ));
    }

    #[test]
    fn test_missing_sysfs_gives_empty_list() {
        let catalog = SysfsCatalog::with_roots(SysfsRoots {
            sys_block: PathBuf::from("/nonexistent/sys/block"),
            ..SysfsRoots::default()
        });
        assert!(catalog.devices().unwrap().is_empty());
    }

    // ==================== IN-USE DETECTION ====================

    #[test]
    fn test_mounted_partition_marks_disk() {
        let fake = FakeSystem::new();
        fake.disk("sda", 8, false);
        fake.partition("sda", "sda1");
        fake.disk("sdb", 8, false);
        fake.mounts(&format!(
            "{} / ext4 rw,relatime 0 0\nproc /proc proc rw 0 0\n",
            fake.dev("sda1").display()
        ));

        let devices = fake.catalog().devices().unwrap();
        assert!(devices[0].mounted);
        assert!(!devices[1].mounted);
    }

    #[test]
    fn test_whole_disk_mount() {
        let fake = FakeSystem::new();
        fake.disk("sdc", 8, true);
        fake.mounts(&format!("{} /media/usb vfat rw 0 0\n", fake.dev("sdc").display()));

        assert!(fake.catalog().devices().unwrap()[0].mounted);
    }

    #[test]
    fn test_swap_partition_marks_disk() {
        let fake = FakeSystem::new();
        fake.disk("nvme0n1", 8, false);
        fake.partition("nvme0n1", "nvme0n1p3");
        fake.swaps(&format!(
            "Filename\tType\tSize\tUsed\tPriority\n{}\tpartition\t8388604\t0\t-2\n",
            fake.dev("nvme0n1p3").display()
        ));

        assert!(fake.catalog().devices().unwrap()[0].mounted);
    }

    #[test]
    fn test_holders_mark_disk() {
        let fake = FakeSystem::new();
        fake.disk("sda", 8, false);
        fake.partition("sda", "sda2");
        let holders = fake.dir.path().join("sys/block/sda/sda2/holders");
        fs::create_dir_all(holders.join("dm-0")).unwrap();

        assert!(fake.catalog().devices().unwrap()[0].mounted);
    }

    #[test]
    fn test_find_by_path() {
        let fake = FakeSystem::new();
        fake.disk("sda", 8, false);
        fake.disk("sdb", 16, false);

        let catalog = fake.catalog();
        let found = catalog.find(&fake.dev("sdb")).unwrap().unwrap();
        assert_eq!(found.size_bytes, 16 * 512);
        assert!(catalog.find(Path::new("/dev/nope")).unwrap().is_none());
    }

    // ==================== MOUNT TABLE ====================

    #[test]
    fn test_partition_names() {
        assert!(is_partition_name("sda", "sda1"));
        assert!(is_partition_name("sda", "sda12"));
        assert!(is_partition_name("nvme0n1", "nvme0n1p2"));
        assert!(is_partition_name("mmcblk0", "mmcblk0p1"));
        assert!(!is_partition_name("sda", "sda"));
        assert!(!is_partition_name("sda", "sdaa"));
        assert!(!is_partition_name("sda", "sdb1"));
        assert!(!is_partition_name("nvme0n1", "nvme0n10"));
    }

    #[test]
    fn test_mount_table_ignores_virtual_sources() {
        let mut table = MountTable::default();
        table.parse_mounts("proc /proc proc rw 0 0\ntmpfs /run tmpfs rw 0 0\nnas:/export /mnt nfs rw 0 0\n");
        assert!(table.is_empty());
    }

    #[test]
    fn test_mount_table_unescapes_sources() {
        let mut table = MountTable::default();
        table.parse_mounts("/dev/disk\\040one /mnt ext4 rw 0 0\n");
        assert!(table.contains("disk one"));
    }

    #[test]
    fn test_mount_table_requires_mounts_file() {
        let missing = Path::new("/nonexistent/mounts");
        assert!(MountTable::load(missing, missing).is_err());
    }

    // ==================== STATIC CATALOG ====================

    #[test]
    fn test_static_catalog_orders_by_path() {
        let catalog = StaticCatalog::new(vec![
            DeviceDescriptor::new("/dev/sdc", 1),
            DeviceDescriptor::new("/dev/sda", 2),
        ]);
        let devices = catalog.devices().unwrap();
        assert_eq!(devices[0].path, PathBuf::from("/dev/sda"));
        assert_eq!(
            catalog.find(Path::new("/dev/sdc")).unwrap().map(|d| d.size_bytes),
            Some(1)
        );
    }
}
