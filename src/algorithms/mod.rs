// Wipe schemes and pass buffer generation
//
// A scheme is a static plan of passes (`PassPattern`). The `PatternGenerator`
// turns that plan into block-sized buffers, drawing fresh random bytes for
// every random pass.

pub mod dod;
pub mod gutmann;
pub mod random;
pub mod zero;

#[cfg(test)]
mod gutmann_test;

// Re-export the scheme plans
pub use dod::DoDWipe;
pub use gutmann::GutmannWipe;
pub use random::RandomWipe;
pub use zero::{OnesWipe, ZeroWipe};

use crate::io::AlignedBuffer;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Content of a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPattern {
    /// Every byte set to the given value
    Fixed(u8),
    /// Freshly generated pseudo-random bytes
    Random,
}

impl PassPattern {
    pub fn is_random(&self) -> bool {
        matches!(self, PassPattern::Random)
    }
}

impl fmt::Display for PassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassPattern::Fixed(byte) => write!(f, "0x{:02X}", byte),
            PassPattern::Random => write!(f, "random"),
        }
    }
}

/// Named, ordered set of passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WipeScheme {
    #[serde(rename = "zeros")]
    Zeros,
    #[serde(rename = "ones")]
    Ones,
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "dod3")]
    DoD3Pass,
    #[serde(rename = "gutmann35")]
    Gutmann35,
}

impl WipeScheme {
    pub const ALL: [WipeScheme; 5] = [
        WipeScheme::Zeros,
        WipeScheme::Ones,
        WipeScheme::Random,
        WipeScheme::DoD3Pass,
        WipeScheme::Gutmann35,
    ];

    /// The passes of this scheme, in execution order
    pub fn plan(&self) -> &'static [PassPattern] {
        match self {
            WipeScheme::Zeros => &ZeroWipe::PLAN,
            WipeScheme::Ones => &OnesWipe::PLAN,
            WipeScheme::Random => &RandomWipe::PLAN,
            WipeScheme::DoD3Pass => &DoDWipe::PLAN,
            WipeScheme::Gutmann35 => &GutmannWipe::PLAN,
        }
    }

    pub fn pass_count(&self) -> u32 {
        self.plan().len() as u32
    }

    /// Name accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            WipeScheme::Zeros => "zeros",
            WipeScheme::Ones => "ones",
            WipeScheme::Random => "random",
            WipeScheme::DoD3Pass => "dod3",
            WipeScheme::Gutmann35 => "gutmann35",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WipeScheme::Zeros => "single pass of 0x00",
            WipeScheme::Ones => "single pass of 0xFF",
            WipeScheme::Random => "single pass of pseudo-random data",
            WipeScheme::DoD3Pass => "DoD 5220.22-M style: 0x00, 0xFF, random",
            WipeScheme::Gutmann35 => "reduced Gutmann: 4 random passes, then 0x55 0xAA 0x92 0x49 0x24",
        }
    }
}

impl fmt::Display for WipeScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown wipe pattern '{0}' (expected zeros, ones, random, dod3 or gutmann35)")]
pub struct UnknownScheme(pub String);

impl FromStr for WipeScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        WipeScheme::ALL
            .into_iter()
            .find(|scheme| scheme.name() == wanted)
            .ok_or_else(|| UnknownScheme(s.to_string()))
    }
}

/// Fill content for one pass, one block long.
///
/// Backed by page-aligned memory so it can be handed to a device opened for
/// direct I/O.
pub struct PassBuffer {
    pattern: PassPattern,
    data: AlignedBuffer,
}

impl PassBuffer {
    pub fn pattern(&self) -> PassPattern {
        self.pattern
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for PassBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassBuffer")
            .field("pattern", &self.pattern)
            .field("len", &self.len())
            .finish()
    }
}

/// Produces the pass buffers of a scheme.
///
/// Owns its random generator; nothing is shared between instances.
pub struct PatternGenerator {
    block_size: usize,
    rng: StdRng,
}

impl PatternGenerator {
    /// Generator seeded from the monotonic clock
    pub fn new(block_size: usize) -> Self {
        Self::with_seed(block_size, random::monotonic_seed())
    }

    /// Deterministic generator, for reproducible tests and benchmarks
    pub fn with_seed(block_size: usize, seed: u64) -> Self {
        Self {
            block_size,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Build one buffer per pass of `scheme`, in pass order
    pub fn generate(&mut self, scheme: WipeScheme) -> Vec<PassBuffer> {
        scheme
            .plan()
            .iter()
            .map(|pattern| self.buffer_for(*pattern))
            .collect()
    }

    /// Build a single buffer for `pattern`
    pub fn buffer_for(&mut self, pattern: PassPattern) -> PassBuffer {
        let mut data = AlignedBuffer::page_aligned(self.block_size);
        match pattern {
            PassPattern::Fixed(byte) => data.as_mut_slice().fill(byte),
            PassPattern::Random => self.rng.fill_bytes(data.as_mut_slice()),
        }
        PassBuffer { pattern, data }
    }
}
