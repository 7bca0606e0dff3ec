// Zero / Ones Wipe - Single pass of a constant byte
//
// Fast fills, not suitable for high-security requirements but useful for:
// - Quick sanitization
// - Drive testing
// - Preparing drives for reuse in same organization

use super::PassPattern;

pub struct ZeroWipe;

impl ZeroWipe {
    pub const PATTERN: u8 = 0x00;

    pub const PLAN: [PassPattern; 1] = [PassPattern::Fixed(Self::PATTERN)];
}

pub struct OnesWipe;

impl OnesWipe {
    pub const PATTERN: u8 = 0xFF;

    pub const PLAN: [PassPattern; 1] = [PassPattern::Fixed(Self::PATTERN)];
}
