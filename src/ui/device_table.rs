use crate::DeviceDescriptor;
use std::fmt::Write;

const MIB: u64 = 1024 * 1024;

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Fixed-width table of devices as printed by `--list`
pub fn render_device_table(devices: &[DeviceDescriptor]) -> String {
    let mut out = String::from("\nAvailable storage devices:\n\n");

    let _ = writeln!(
        out,
        "{:<20} {:<15} {:<15} {:<12} {:<10}",
        "Device", "Name", "Size (MB)", "Removable", "Mounted"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));

    if devices.is_empty() {
        out.push_str("(no devices found)\n");
    }

    for device in devices {
        let _ = writeln!(
            out,
            "{:<20} {:<15} {:<15} {:<12} {:<10}",
            device.path.display().to_string(),
            device.display_name,
            device.size_bytes / MIB,
            yes_no(device.removable),
            yes_no(device.mounted)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows() {
        let mut usb = DeviceDescriptor::new("/dev/sdb", 16 * 1024 * MIB);
        usb.display_name = "Cruzer".to_string();
        usb.removable = true;
        let mut system = DeviceDescriptor::new("/dev/nvme0n1", 512 * 1024 * MIB);
        system.mounted = true;

        let table = render_device_table(&[system, usb]);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[3].starts_with("Device"));
        assert!(lines[3].contains("Size (MB)"));
        assert_eq!(lines[4], "-".repeat(70));
        assert!(lines[5].starts_with("/dev/nvme0n1"));
        assert!(lines[5].contains("524288"));
        assert!(lines[5].trim_end().ends_with("No           Yes"));
        assert!(lines[6].contains("Cruzer"));
        assert!(lines[6].contains("16384"));
        assert!(lines[6].trim_end().ends_with("Yes          No"));
    }

    #[test]
    fn test_empty_table() {
        assert!(render_device_table(&[]).contains("no devices found"));
    }
}
