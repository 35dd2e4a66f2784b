//! Injectable randomness for the turn's tie-breaking decisions.
//!
//! The coordinator never calls `rand` directly: coin flips, the reaction
//! roll and per-part word jitter all draw from a [`RandomSource`], so tests
//! and replays can pin every branch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// A source of uniform values in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;

    /// True with probability `p`.
    fn chance(&self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Thread-local OS-seeded randomness. The production default.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic randomness from a fixed seed.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random::<f64>()
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
///
/// An empty sequence always yields `0.0`.
pub struct FixedRandom {
    values: Vec<f64>,
    cursor: Mutex<usize>,
}

impl FixedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let value = self.values[*cursor % self.values.len()];
        *cursor += 1;
        value
    }
}
