use rand::{Rng as _, SeedableRng as _, rngs::SmallRng};

/// Source of the stochastic perturbations used by the tone-mapping stage.
///
/// Injected into the pipeline so noise-bearing renders are reproducible
/// from a seed.
pub trait NoiseSource {
    /// Bernoulli draw. Must be `false` for `probability <= 0` and `true`
    /// for `probability >= 1`.
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform draw in `[lo, hi]`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;
}

/// Seedable production noise source.
pub struct SeededNoise {
    rng: SmallRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn chance(&mut self, probability: f64) -> bool {
        // NaN falls through to false.
        if !(probability > 0.0) {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.rng.gen_range(lo..=hi)
    }
}
