use crate::io::BlockDevice;

/// Number of leading blocks read back by default
pub const DEFAULT_SAMPLE_BLOCKS: u64 = 10;

/// Spot-check of the first blocks of a device.
///
/// Reads `min(sample_blocks, ceil(size / block_size))` blocks from offset 0
/// and compares them byte for byte with the expected pass content. The final
/// block of a device that is not a whole number of blocks is compared against
/// the matching prefix of `expected`.
///
/// A `true` result only says the sample matched. It does not prove that the
/// rest of the device was overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledVerifier {
    block_size: usize,
    sample_blocks: u64,
}

impl SampledVerifier {
    pub fn new(block_size: usize, sample_blocks: u64) -> Self {
        Self {
            block_size,
            sample_blocks,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Blocks that will be read for a device of `device_size` bytes
    pub fn sample_len(&self, device_size: u64) -> u64 {
        self.sample_blocks
            .min(device_size.div_ceil(self.block_size as u64))
    }

    /// Read the sample from `device` and compare it with `expected`.
    ///
    /// Returns false on the first differing byte, on any read error and on a
    /// read that returns fewer bytes than requested.
    pub fn verify<D: BlockDevice>(&self, device: &mut D, expected: &[u8]) -> bool {
        let path = device.path().display().to_string();

        let size = match device.size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(device = %path, error = %e, "Verification could not size device");
                return false;
            }
        };

        if let Err(e) = device.seek_to_start() {
            tracing::warn!(device = %path, error = %e, "Verification seek failed");
            return false;
        }

        let blocks = self.sample_len(size);
        let block_size = self.block_size as u64;

        for block in 0..blocks {
            let offset = block * block_size;
            let chunk = block_size.min(size - offset) as usize;

            let Some(want) = expected.get(..chunk) else {
                tracing::warn!(
                    device = %path,
                    expected_len = expected.len(),
                    chunk,
                    "Expected pattern shorter than verification block"
                );
                return false;
            };

            let data = match device.read_block(chunk) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(device = %path, offset, error = %e, "Verification read failed");
                    return false;
                }
            };

            if data.len() != chunk {
                tracing::warn!(
                    device = %path,
                    offset,
                    requested = chunk,
                    read = data.len(),
                    "Short read during verification"
                );
                return false;
            }

            if let Some(pos) = data.as_slice().iter().zip(want).position(|(a, b)| a != b) {
                tracing::warn!(
                    device = %path,
                    offset = offset + pos as u64,
                    "Verification mismatch"
                );
                return false;
            }
        }

        tracing::debug!(device = %path, blocks, "Verification sample matched");
        true
    }
}
