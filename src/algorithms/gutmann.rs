use super::PassPattern;

/// Reduced Gutmann overwrite.
///
/// Nine passes: four random passes followed by five single-byte patterns from
/// the MFM/RLL part of the Gutmann table. This is the documented pass list of
/// the `gutmann35` scheme; the remaining passes of the 1996 table are not
/// emitted.
pub struct GutmannWipe;

impl GutmannWipe {
    pub const RANDOM_PASSES: usize = 4;

    pub const FIXED_PATTERNS: [u8; 5] = [
        0x55, // 01010101
        0xAA, // 10101010
        0x92, // 10010010
        0x49, // 01001001
        0x24, // 00100100
    ];

    pub const PASS_COUNT: usize = Self::RANDOM_PASSES + Self::FIXED_PATTERNS.len();

    pub const PLAN: [PassPattern; Self::PASS_COUNT] = [
        PassPattern::Random,
        PassPattern::Random,
        PassPattern::Random,
        PassPattern::Random,
        PassPattern::Fixed(Self::FIXED_PATTERNS[0]),
        PassPattern::Fixed(Self::FIXED_PATTERNS[1]),
        PassPattern::Fixed(Self::FIXED_PATTERNS[2]),
        PassPattern::Fixed(Self::FIXED_PATTERNS[3]),
        PassPattern::Fixed(Self::FIXED_PATTERNS[4]),
    ];
}
