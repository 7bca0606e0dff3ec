/// Common test helper functions

use std::fs;
use std::io::Read;
use std::path::Path;

/// Verify that a file contains only `byte`
pub fn verify_all_bytes(path: &Path, byte: u8) -> std::io::Result<bool> {
    let mut file = fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        if buffer[..bytes_read].iter().any(|&b| b != byte) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Verify that a file contains only zeros
#[allow(dead_code)]
pub fn verify_all_zeros(path: &Path) -> std::io::Result<bool> {
    verify_all_bytes(path, 0x00)
}

/// Calculate Shannon entropy of a file in bits per byte
#[allow(dead_code)]
pub fn calculate_file_entropy(path: &Path) -> std::io::Result<f64> {
    let data = fs::read(path)?;
    if data.is_empty() {
        return Ok(0.0);
    }

    let mut counts = [0u64; 256];
    for &b in &data {
        counts[b as usize] += 1;
    }

    let len = data.len() as f64;
    Ok(counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum())
}

/// Collects progress callbacks for later assertions
#[derive(Debug, Default)]
pub struct ProgressLog {
    pub updates: Vec<(u32, u32, f64)>,
}

impl secure_eraser::ProgressObserver for ProgressLog {
    fn on_progress(&mut self, pass_index: u32, pass_count: u32, percent: f64) {
        self.updates.push((pass_index, pass_count, percent));
    }
}
