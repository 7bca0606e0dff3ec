// Post-wipe verification
//
// A bounded sample read back from the start of the device and compared with
// the content of the final pass.

pub mod sampled;

#[cfg(test)]
mod sampled_tests;

pub use sampled::{SampledVerifier, DEFAULT_SAMPLE_BLOCKS};
