/// Tests for the reduced Gutmann scheme
///
/// The scheme emits 4 random passes then 0x55, 0xAA, 0x92, 0x49, 0x24.

#[cfg(test)]
mod gutmann_algorithm_tests {
    use crate::algorithms::gutmann::GutmannWipe;
    use crate::algorithms::{PassPattern, PatternGenerator, WipeScheme};

    #[test]
    fn test_gutmann_constants() {
        assert_eq!(GutmannWipe::RANDOM_PASSES, 4);
        assert_eq!(GutmannWipe::FIXED_PATTERNS, [0x55, 0xAA, 0x92, 0x49, 0x24]);
        assert_eq!(GutmannWipe::PASS_COUNT, 9);
    }

    #[test]
    fn test_gutmann_plan() {
        let plan = WipeScheme::Gutmann35.plan();
        assert_eq!(plan.len(), 9);
        assert!(plan[..4].iter().all(|p| p.is_random()));
        assert_eq!(
            &plan[4..],
            &[
                PassPattern::Fixed(0x55),
                PassPattern::Fixed(0xAA),
                PassPattern::Fixed(0x92),
                PassPattern::Fixed(0x49),
                PassPattern::Fixed(0x24),
            ]
        );
    }

    #[test]
    fn test_gutmann_random_passes_differ() {
        let mut generator = PatternGenerator::with_seed(8192, 42);
        let passes = generator.generate(WipeScheme::Gutmann35);

        // Each random pass draws fresh bytes
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(
                    passes[i].as_slice(),
                    passes[j].as_slice(),
                    "random passes {} and {} should differ",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_gutmann_fixed_buffers() {
        let mut generator = PatternGenerator::with_seed(512, 1);
        let passes = generator.generate(WipeScheme::Gutmann35);

        for (pass, byte) in passes[4..].iter().zip(GutmannWipe::FIXED_PATTERNS) {
            assert_eq!(pass.pattern(), PassPattern::Fixed(byte));
            assert!(pass.as_slice().iter().all(|&b| b == byte));
        }
    }
}
