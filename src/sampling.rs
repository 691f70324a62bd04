//! # Deterministic Sampling
//!
//! Turns a per-client seed into a stable position in `[0, 1)` so that the
//! same client always lands on the same side of a rollout threshold, while
//! the selected share of a large population converges to the configured
//! rate.
//!
//! Both sampling functions share one hash: the first 48 bits of the SHA-256
//! digest of the seed text, read big-endian. The value depends on nothing but
//! the seed, so assignments survive process restarts and never drift between
//! runs. Because [`bucket_sample`] slices the same 48-bit space that
//! [`stable_sample`] thresholds, the bucket range `[0, k - 1]` of `n` selects
//! the same clients as a stable sample at rate `k / n`.
//!
//! Seeds are built by the caller, typically `"<experiment>-<client id>"`, so
//! different experiments over the same client look independent.

use ring::digest::{digest, SHA256};
use thiserror::Error;

/// Number of digest bits used for the sample position.
const HASH_BITS: u32 = 48;
const HASH_SPACE: u64 = 1 << HASH_BITS;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("Sample rate must be within [0, 1], got {rate}")]
    RateOutOfRange { rate: f64 },
    #[error("Total bucket count must be positive")]
    NoBuckets,
    #[error("Bucket range {low}..={high} is not inside [0, {total})")]
    BucketOutOfRange { low: u64, high: u64, total: u64 },
    #[error("Bucket range start {low} is after its end {high}")]
    InvertedBucketRange { low: u64, high: u64 },
}

/// An inclusive range of bucket indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    pub low: u64,
    pub high: u64,
}

impl BucketRange {
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, index: u64) -> bool {
        self.low <= index && index <= self.high
    }

    pub fn validate(&self, total: u64) -> Result<(), SamplingError> {
        if total == 0 {
            return Err(SamplingError::NoBuckets);
        }
        if self.low > self.high {
            return Err(SamplingError::InvertedBucketRange {
                low: self.low,
                high: self.high,
            });
        }
        if self.high >= total {
            return Err(SamplingError::BucketOutOfRange {
                low: self.low,
                high: self.high,
                total,
            });
        }
        Ok(())
    }
}

fn hash_position(seed: &str) -> u64 {
    let hash = digest(&SHA256, seed.as_bytes());
    let mut prefix = [0u8; 8];
    prefix[2..].copy_from_slice(&hash.as_ref()[..6]);
    u64::from_be_bytes(prefix)
}

/// The seed's position in `[0, 1)`.
pub fn fraction(seed: &str) -> f64 {
    hash_position(seed) as f64 / HASH_SPACE as f64
}

/// Returns true for roughly `rate` of all seeds, always the same ones.
pub fn stable_sample(seed: &str, rate: f64) -> Result<bool, SamplingError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(SamplingError::RateOutOfRange { rate });
    }
    Ok(fraction(seed) < rate)
}

/// The bucket in `[0, total)` the seed hashes into.
pub fn bucket_index(seed: &str, total: u64) -> Result<u64, SamplingError> {
    if total == 0 {
        return Err(SamplingError::NoBuckets);
    }
    // Scaling in integer space keeps the result strictly below `total`.
    let index = (u128::from(hash_position(seed)) * u128::from(total)) >> HASH_BITS;
    Ok(index as u64)
}

/// Returns whether the seed's bucket falls inside `range`.
pub fn bucket_sample(seed: &str, range: BucketRange, total: u64) -> Result<bool, SamplingError> {
    range.validate(total)?;
    Ok(range.contains(bucket_index(seed, total)?))
}
