// mcl_core/src/rng.rs

//! Random sample generation for motion noise, sensor noise and resampling.
//!
//! Nothing in this crate touches a global generator. Every operation that needs
//! randomness takes a `&mut dyn NoiseSource`, so a run is fully reproducible
//! from its seed and parallel workers can each own an independent stream.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{FilterError, Result};

/// The entropy contract used by every stochastic step of the filter.
pub trait NoiseSource: Send {
    /// A uniform sample in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// A sample from `Normal(mu, sigma)`. `sigma == 0` returns `mu` exactly.
    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64;

    /// A uniform sample in `[min, max)`. Both bounds and the span must be
    /// finite.
    fn uniform_range(&mut self, min: f64, max: f64) -> Result<f64> {
        if !(min.is_finite() && max.is_finite() && (max - min).is_finite()) || max <= min {
            return Err(FilterError::InvalidRange { min, max });
        }
        loop {
            // `min + span * u` can round up to `max` when `u` is just below 1.
            let value = min + (max - min) * self.uniform();
            if value < max {
                return Ok(value);
            }
        }
    }

    /// A uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "NoiseSource::index called with an empty range");
        ((self.uniform() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// A seed for deriving child streams from this source.
    fn fork_seed(&mut self) -> u64 {
        (self.uniform() * (1u64 << 53) as f64) as u64
    }
}

/// Box–Muller sampler (trigonometric form) that caches the second deviate of each pair.
///
/// Every pair of uniform draws yields two independent standard normals; the
/// cosine branch is returned immediately and the sine branch is parked in
/// `spare` for the next `gaussian` call. The cache belongs to this object only,
/// so two samplers never observe each other's pending deviate. A single sampler
/// is not meant to be shared between threads; give each worker its own.
#[derive(Debug, Clone)]
pub struct BoxMuller<R = ChaCha8Rng> {
    rng: R,
    spare: Option<f64>,
}

impl<R: RngCore> BoxMuller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, spare: None }
    }

    /// The standard normal that the next `gaussian` call will consume, if any.
    pub fn pending(&self) -> Option<f64> {
        self.spare
    }

    /// Drops the cached deviate so the next draw starts a fresh pair.
    pub fn discard_pending(&mut self) {
        self.spare = None;
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl BoxMuller<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// An independent stream of the same seed, used to hand one generator to
    /// each parallel worker.
    pub fn stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self::new(rng)
    }
}

impl<R: RngCore + Send> NoiseSource for BoxMuller<R> {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fork_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        let z = match self.spare.take() {
            Some(z) => z,
            None => {
                let angle = TAU * self.uniform();
                // 1 - u lies in (0, 1], keeping the logarithm finite.
                let radius = (-2.0 * (1.0 - self.uniform()).ln()).sqrt();
                self.spare = Some(radius * angle.sin());
                radius * angle.cos()
            }
        };
        mu + z * sigma
    }
}

/// Sampler that draws a fresh `StandardNormal` for every call and keeps no
/// state beyond the underlying generator.
#[derive(Debug, Clone)]
pub struct Ziggurat<R = ChaCha8Rng> {
    rng: R,
}

impl<R: RngCore> Ziggurat<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Ziggurat<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> NoiseSource for Ziggurat<R> {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fork_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mu + z * sigma
    }
}

/// Replays fixed uniform and standard-normal sequences, cycling when exhausted.
///
/// An empty sequence behaves as a constant zero, so `ReplaySource::quiet()`
/// turns every noisy operation into its noiseless counterpart.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    uniforms: Vec<f64>,
    normals: Vec<f64>,
    next_uniform: usize,
    next_normal: usize,
}

impl ReplaySource {
    pub fn new(uniforms: Vec<f64>, normals: Vec<f64>) -> Self {
        Self {
            uniforms,
            normals,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self::default()
    }

    fn next(values: &[f64], cursor: &mut usize) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let value = values[*cursor % values.len()];
        *cursor += 1;
        value
    }
}

impl NoiseSource for ReplaySource {
    fn uniform(&mut self) -> f64 {
        Self::next(&self.uniforms, &mut self.next_uniform)
    }

    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        mu + Self::next(&self.normals, &mut self.next_normal) * sigma
    }
}

/// Which normal sampler a run should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaussianKind {
    #[default]
    BoxMuller,
    Ziggurat,
}

impl GaussianKind {
    pub fn build(self, seed: u64) -> Box<dyn NoiseSource> {
        match self {
            GaussianKind::BoxMuller => Box::new(BoxMuller::seeded(seed)),
            GaussianKind::Ziggurat => Box::new(Ziggurat::seeded(seed)),
        }
    }

    /// Builds the sampler for one independent stream of `seed`.
    pub fn build_stream(self, seed: u64, stream: u64) -> Box<dyn NoiseSource> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        match self {
            GaussianKind::BoxMuller => Box::new(BoxMuller::new(rng)),
            GaussianKind::Ziggurat => Box::new(Ziggurat::new(rng)),
        }
    }
}
