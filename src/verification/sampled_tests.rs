#[cfg(test)]
mod tests {
    use crate::io::{DeviceOpener, FaultPlan, MemoryOpener, OpenMode};
    use crate::verification::SampledVerifier;
    use std::path::Path;

    const BLOCK: usize = 1024;

    fn open(opener: &MemoryOpener) -> crate::io::MemoryDevice {
        opener
            .open(Path::new("/dev/mem0"), OpenMode::ReadOnly)
            .expect("memory device opens")
    }

    #[test]
    fn test_matching_content_verifies() {
        let opener = MemoryOpener::with_contents(vec![0xAA; 20 * BLOCK]);
        let verifier = SampledVerifier::new(BLOCK, 10);

        assert!(verifier.verify(&mut open(&opener), &[0xAA; BLOCK]));
        // Only the sample is read
        assert_eq!(opener.state().read_sizes, vec![BLOCK; 10]);
    }

    #[test]
    fn test_single_differing_byte_fails() {
        let mut contents = vec![0x00; 20 * BLOCK];
        contents[3 * BLOCK + 17] = 0x01;
        let opener = MemoryOpener::with_contents(contents);
        let verifier = SampledVerifier::new(BLOCK, 10);

        assert!(!verifier.verify(&mut open(&opener), &[0x00; BLOCK]));
        // Stops at the first mismatching block
        assert_eq!(opener.state().read_sizes.len(), 4);
    }

    #[test]
    fn test_difference_outside_sample_is_not_seen() {
        let mut contents = vec![0x00; 20 * BLOCK];
        contents[15 * BLOCK] = 0x01;
        let opener = MemoryOpener::with_contents(contents);

        assert!(SampledVerifier::new(BLOCK, 10).verify(&mut open(&opener), &[0x00; BLOCK]));
    }

    #[test]
    fn test_small_device_clips_sample() {
        // 2.5 blocks: reads 1024, 1024, 512
        let opener = MemoryOpener::with_contents(vec![0xFF; 2 * BLOCK + BLOCK / 2]);
        let verifier = SampledVerifier::new(BLOCK, 10);

        assert_eq!(verifier.sample_len(2 * BLOCK as u64 + 512), 3);
        assert!(verifier.verify(&mut open(&opener), &[0xFF; BLOCK]));
        assert_eq!(opener.state().read_sizes, vec![BLOCK, BLOCK, BLOCK / 2]);
    }

    #[test]
    fn test_read_corruption_fails() {
        let opener = MemoryOpener::with_contents(vec![0x55; 4 * BLOCK]).with_faults(FaultPlan {
            corrupt_read_at: Some(BLOCK as u64 + 1),
            ..FaultPlan::default()
        });
        assert!(!SampledVerifier::new(BLOCK, 10).verify(&mut open(&opener), &[0x55; BLOCK]));
    }

    #[test]
    fn test_short_read_fails() {
        let opener = MemoryOpener::with_contents(vec![0x55; 4 * BLOCK]).with_faults(FaultPlan {
            short_read_at_call: Some(2),
            ..FaultPlan::default()
        });
        assert!(!SampledVerifier::new(BLOCK, 10).verify(&mut open(&opener), &[0x55; BLOCK]));
    }

    #[test]
    fn test_size_failure_fails() {
        let opener = MemoryOpener::with_contents(vec![0x55; 4 * BLOCK]).with_faults(FaultPlan {
            fail_size_query: true,
            ..FaultPlan::default()
        });
        assert!(!SampledVerifier::new(BLOCK, 10).verify(&mut open(&opener), &[0x55; BLOCK]));
    }

    #[test]
    fn test_expected_shorter_than_block_fails() {
        let opener = MemoryOpener::with_contents(vec![0x55; 4 * BLOCK]);
        assert!(!SampledVerifier::new(BLOCK, 10).verify(&mut open(&opener), &[0x55; 16]));
    }
}
