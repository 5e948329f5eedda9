//! Random sources
//!
//! Every stochastic decision in the engine draws from a [`RandomSource`].
//! Draws are strictly sequential, so two sources producing the same float
//! stream reproduce the same grids, cascades and feature outcomes.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Uniform random source contract
pub trait RandomSource {
    /// Uniform float in `[0, 1)`
    fn next_float(&mut self) -> f64;

    /// Uniform integer in `[min, max]` (inclusive on both ends)
    ///
    /// Derived from [`next_float`](Self::next_float) so that scripted and
    /// seeded sources map identical float streams to identical integers.
    /// A degenerate range returns `min` without consuming a draw.
    fn next_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        let offset = (self.next_float() * span as f64).floor() as i64;
        min + offset.clamp(0, span - 1)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_float(&mut self) -> f64 {
        (**self).next_float()
    }

    fn next_int(&mut self, min: i64, max: i64) -> i64 {
        (**self).next_int(min, max)
    }
}

/// Seedable, resettable ChaCha8 random source
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl SeededRandom {
    /// Create a source with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Create a source seeded from the thread RNG
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    /// Seed this source was created (or last reseeded) with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of floats drawn since creation or the last reset
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Rewind to the start of the stream for deterministic replay
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.draws = 0;
    }

    /// Switch to a new seed and rewind
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.reset();
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&mut self) -> f64 {
        self.draws += 1;
        self.rng.random::<f64>()
    }
}

/// Replays a fixed float sequence
///
/// Once the script is exhausted every draw returns `0.0`, which selects the
/// first entry of any weighted table.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Append more values to the script
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Float that makes `next_int(min, max)` return `value`
    pub fn int_draw(value: i64, min: i64, max: i64) -> f64 {
        let span = (max - min + 1).max(1) as f64;
        ((value - min) as f64 + 0.5) / span
    }

    /// Number of draws consumed so far
    pub fn draws(&self) -> usize {
        self.cursor
    }

    /// Draws left before the script is exhausted
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_float(&mut self) -> f64 {
        let value = self.values.get(self.cursor).copied().unwrap_or(0.0);
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
