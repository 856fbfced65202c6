//! Unique-user cardinality tracking.
//!
//! Per-bucket user-id sets can grow without bound on large deployments, so
//! the exact set is swapped for a HyperLogLog++ estimator (standard error
//! well under 1% at precision 14) once it crosses the threshold.

use std::collections::hash_map::RandomState;
use std::collections::HashSet;

use hyperloglogplus::{HyperLogLog, HyperLogLogPlus};

/// Exact set size above which counting switches to estimation.
pub const EXACT_THRESHOLD: usize = 10_000;

/// HyperLogLog++ precision; 2^14 registers give ~0.8% standard error.
const HLL_PRECISION: u8 = 14;

/// Distinct user-id counter for one bucket key.
pub enum UniqueUsers {
    Exact(HashSet<String>),
    Estimated(HyperLogLogPlus<String, RandomState>),
}

impl UniqueUsers {
    pub fn new() -> Self {
        Self::Exact(HashSet::new())
    }

    pub fn insert(&mut self, user_id: &str) {
        match self {
            Self::Exact(set) => {
                if !set.contains(user_id) {
                    set.insert(user_id.to_string());
                    if set.len() > EXACT_THRESHOLD {
                        self.degrade();
                    }
                }
            }
            Self::Estimated(hll) => hll.insert(&user_id.to_string()),
        }
    }

    /// Distinct count; exact below the threshold, estimated above.
    pub fn cardinality(&mut self) -> u64 {
        match self {
            Self::Exact(set) => set.len() as u64,
            Self::Estimated(hll) => hll.count().round() as u64,
        }
    }

    fn degrade(&mut self) {
        if let Self::Exact(set) = self {
            let mut hll: HyperLogLogPlus<String, RandomState> =
                HyperLogLogPlus::new(HLL_PRECISION, RandomState::new())
                    .expect("valid HyperLogLog precision");
            for user_id in set.iter() {
                hll.insert(user_id);
            }
            *self = Self::Estimated(hll);
        }
    }
}

impl Default for UniqueUsers {
    fn default() -> Self {
        Self::new()
    }
}
