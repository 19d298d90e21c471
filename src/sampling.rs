//! Gate for detail page fetches.
//!
//! Only a fraction of incomplete records get a detail fetch so the request
//! volume stays bounded; callers must tolerate the rest keeping absent fields.

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

pub trait SupplementPolicy {
    /// Called once per eligible (incomplete, linked) record.
    fn should_supplement(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl SupplementPolicy for Always {
    fn should_supplement(&mut self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl SupplementPolicy for Never {
    fn should_supplement(&mut self) -> bool {
        false
    }
}

/// Bernoulli draw with probability `rate`.
#[derive(Debug, Clone)]
pub struct Sampled {
    rate: f64,
    rng: StdRng,
}

impl Sampled {
    /// `rate` is clamped to `0.0..=1.0`. A seed makes the draws reproducible.
    pub fn new(rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rate: rate.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl SupplementPolicy for Sampled {
    fn should_supplement(&mut self) -> bool {
        self.rng.gen_bool(self.rate)
    }
}
