use super::PassPattern;
use nix::time::{clock_gettime, ClockId};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct RandomWipe;

impl RandomWipe {
    pub const PLAN: [PassPattern; 1] = [PassPattern::Random];
}

/// Seed for the pattern generator, taken from the monotonic clock.
///
/// The data only needs to be statistically uniform, not unpredictable, so a
/// clock seed is enough. Falls back to wall-clock time if the monotonic clock
/// cannot be read.
pub(crate) fn monotonic_seed() -> u64 {
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => (ts.tv_sec() as u64)
            .wrapping_mul(1_000_000_000)
            .wrapping_add(ts.tv_nsec() as u64),
        Err(e) => {
            tracing::debug!(error = %e, "Monotonic clock unavailable, seeding from wall clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        }
    }
}
