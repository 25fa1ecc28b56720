// mcl_core/src/resample.rs

//! Importance resampling: draw a new population of the same size, with
//! replacement, each member chosen with probability proportional to its weight.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::warn;

use crate::error::{FilterError, Result};
use crate::pose::Pose;
use crate::rng::NoiseSource;

/// Index of the first element of `sorted` that is not less than `x`.
///
/// Equal elements resolve to the leftmost position; values past the end
/// return `sorted.len()`.
pub fn bisect_left(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|&v| v < x)
}

/// Index just past the last element of `sorted` that is not greater than `x`.
pub fn bisect_right(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|&v| v <= x)
}

/// Weights must be finite and non-negative.
pub fn check_weights(weights: &[f64]) -> Result<()> {
    match weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
    {
        Some((index, &value)) => Err(FilterError::InvalidWeight { index, value }),
        None => Ok(()),
    }
}

/// A resampling algorithm.
///
/// `select` returns, for each of the `weights.len()` output slots, the index of
/// the input particle copied into it. When every weight is zero the draw
/// degenerates to a uniform choice over the population.
pub trait Resampler: Debug + Send + Sync {
    /// Picks `weights.len()` indices. `weights` has already been validated.
    fn select(&self, weights: &[f64], rng: &mut dyn NoiseSource) -> Vec<usize>;

    fn name(&self) -> &'static str;

    /// Draws a new population of the same size as `particles`.
    fn resample(
        &self,
        particles: &[Pose],
        weights: &[f64],
        rng: &mut dyn NoiseSource,
    ) -> Result<Vec<Pose>> {
        if particles.len() != weights.len() {
            return Err(FilterError::LengthMismatch {
                expected: particles.len(),
                actual: weights.len(),
            });
        }
        check_weights(weights)?;
        if particles.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .select(weights, rng)
            .into_iter()
            .map(|i| particles[i])
            .collect())
    }
}

fn uniform_selection(len: usize, rng: &mut dyn NoiseSource) -> Vec<usize> {
    warn!(particles = len, "all weights are zero, resampling uniformly");
    (0..len).map(|_| rng.index(len)).collect()
}

/// Inverse-CDF resampling: normalize, accumulate, then binary-search the
/// cumulative table once per output slot. O(N log N).
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseCdf;

impl InverseCdf {
    /// Normalized running sum of `weights`, or `None` when they sum to zero.
    ///
    /// Weights are divided by their maximum before summing, so the total stays
    /// finite for any finite input.
    pub fn cumulative(weights: &[f64]) -> Option<Vec<f64>> {
        let max = weights.iter().copied().fold(0.0, f64::max);
        if !(max > 0.0) {
            return None;
        }
        let total: f64 = weights.iter().map(|w| w / max).sum();
        let mut running = 0.0;
        Some(
            weights
                .iter()
                .map(|w| {
                    running += w / max / total;
                    running
                })
                .collect(),
        )
    }

    /// Maps a draw `r` in `(0, 1]` to its slot in the cumulative table.
    fn locate(cumulative: &[f64], last_positive: usize, r: f64) -> usize {
        // Rounding can leave the final entry a hair below 1.
        bisect_left(cumulative, r).min(last_positive)
    }
}

impl Resampler for InverseCdf {
    fn select(&self, weights: &[f64], rng: &mut dyn NoiseSource) -> Vec<usize> {
        let Some(cumulative) = Self::cumulative(weights) else {
            return uniform_selection(weights.len(), rng);
        };
        let last_positive = weights.iter().rposition(|&w| w > 0.0).unwrap_or(0);

        (0..weights.len())
            .map(|_| {
                // Drawing from (0, 1] keeps zero-weight entries at the front of
                // the table out of reach.
                let r = 1.0 - rng.uniform();
                Self::locate(&cumulative, last_positive, r)
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "inverse_cdf"
    }
}

/// The resampling "wheel": a single linear walk around the weights with random
/// steps of up to twice the largest weight. O(N), no normalization needed.
///
/// The walk runs in units of the largest weight, so steps are drawn from
/// `[0, 2)` whatever the magnitude of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wheel;

impl Wheel {
    /// Runs the wheel with a precomputed maximum weight.
    pub fn select_with_max(
        &self,
        weights: &[f64],
        max_weight: f64,
        rng: &mut dyn NoiseSource,
    ) -> Vec<usize> {
        let n = weights.len();
        if n == 0 {
            return Vec::new();
        }
        if !(max_weight > 0.0) {
            return uniform_selection(n, rng);
        }

        let mut index = rng.index(n);
        let mut beta = 0.0;
        let mut picks = Vec::with_capacity(n);
        for _ in 0..n {
            beta += 2.0 * rng.uniform();
            while beta > weights[index] / max_weight {
                beta -= weights[index] / max_weight;
                index = (index + 1) % n;
            }
            picks.push(index);
        }
        picks
    }
}

impl Resampler for Wheel {
    fn select(&self, weights: &[f64], rng: &mut dyn NoiseSource) -> Vec<usize> {
        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        self.select_with_max(weights, max_weight, rng)
    }

    fn name(&self) -> &'static str {
        "wheel"
    }
}

/// Configuration-level choice between the two algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingStrategy {
    InverseCdf,
    #[default]
    Wheel,
}

impl ResamplingStrategy {
    pub fn build(self) -> Box<dyn Resampler> {
        match self {
            ResamplingStrategy::InverseCdf => Box::new(InverseCdf),
            ResamplingStrategy::Wheel => Box::new(Wheel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{BoxMuller, ReplaySource};

    const SORTED: [f64; 10] = [0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.4, 0.4, 0.5, 0.5];

    #[test]
    fn bisect_boundaries() {
        assert_eq!(bisect_left(&SORTED, 0.0), 0);
        assert_eq!(bisect_right(&SORTED, 0.0), 0);
        assert_eq!(bisect_left(&SORTED, 0.1), 0);
        assert_eq!(bisect_right(&SORTED, 0.1), 2);
        assert_eq!(bisect_left(&SORTED, 0.3), 4);
        assert_eq!(bisect_right(&SORTED, 0.3), 6);
        assert_eq!(bisect_left(&SORTED, 0.5), 8);
        assert_eq!(bisect_right(&SORTED, 0.5), 10);
        assert_eq!(bisect_left(&SORTED, 0.6), 10);
        assert_eq!(bisect_right(&SORTED, 0.6), 10);
    }

    #[test]
    fn cumulative_table_is_normalized() {
        let table = InverseCdf::cumulative(&[1.0, 3.0, 0.0, 4.0]).unwrap();
        assert_eq!(table, vec![0.125, 0.5, 0.5, 1.0]);
        assert_eq!(InverseCdf::cumulative(&[0.0, 0.0]), None);
    }

    #[test]
    fn inverse_cdf_maps_draws_onto_buckets() {
        // r = 1 - u: 0.9 -> 0.1, 0.5 -> 0.5, 0.4 -> 0.6, 0.0 -> 1.0
        let mut replay = ReplaySource::new(vec![0.9, 0.5, 0.4, 0.0], vec![]);
        let picks = InverseCdf.select(&[1.0, 3.0, 0.0, 4.0], &mut replay);
        assert_eq!(picks, vec![0, 1, 3, 3]);
    }

    #[test]
    fn wheel_walks_forward_from_a_random_start() {
        // start index 0.5 * 4 = 2, then steps of 0.25 * 2 = 0.5 in units of the
        // largest weight, which scales the weights to [0.25, 0.75, 0, 1]
        let mut replay = ReplaySource::new(vec![0.5, 0.25, 0.25, 0.25, 0.25], vec![]);
        let picks = Wheel.select(&[1.0, 3.0, 0.0, 4.0], &mut replay);
        // beta 0.5 at index 2 (w 0) -> index 3 (w 1): pick 3
        // beta 1.0 at index 3: pick 3
        // beta 1.5 -> 0.5 at index 0 -> 0.25 at index 1: pick 1
        // beta 0.75 at index 1: pick 1
        assert_eq!(picks, vec![3, 3, 1, 1]);
    }

    #[test]
    fn cumulative_table_survives_weights_near_f64_max() {
        let table = InverseCdf::cumulative(&[f64::MAX, f64::MAX]).unwrap();
        assert_eq!(table, vec![0.5, 1.0]);
        let table = InverseCdf::cumulative(&[f64::MAX, 0.0, f64::MAX / 2.0]).unwrap();
        assert!(table.iter().all(|c| c.is_finite()));
        assert!((table[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn huge_equal_weights_are_drawn_evenly() {
        let particles = vec![Pose::new(0.0, 0.0, 0.0), Pose::new(1.0, 0.0, 0.0)];
        let mut rng = BoxMuller::seeded(4);
        for strategy in [ResamplingStrategy::InverseCdf, ResamplingStrategy::Wheel] {
            let resampler = strategy.build();
            let mut counts = [0usize; 2];
            for _ in 0..500 {
                for pose in resampler
                    .resample(&particles, &[f64::MAX, f64::MAX], &mut rng)
                    .unwrap()
                {
                    counts[pose.x as usize] += 1;
                }
            }
            assert!(counts.iter().all(|&c| c > 300), "{}: {counts:?}", resampler.name());
        }
    }

    #[test]
    fn wheel_terminates_on_weights_near_f64_max() {
        let particles = vec![Pose::new(0.0, 0.0, 0.0), Pose::new(1.0, 0.0, 0.0)];
        let mut rng = BoxMuller::seeded(1);
        let out = Wheel
            .resample(&particles, &[f64::MAX, 1.0], &mut rng)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| p.x == 0.0));
    }

    #[test]
    fn resample_rejects_mismatched_lengths() {
        let particles = vec![Pose::new(0.0, 0.0, 0.0); 3];
        let mut rng = BoxMuller::seeded(0);
        for strategy in [ResamplingStrategy::InverseCdf, ResamplingStrategy::Wheel] {
            assert_eq!(
                strategy.build().resample(&particles, &[1.0, 1.0], &mut rng),
                Err(FilterError::LengthMismatch {
                    expected: 3,
                    actual: 2
                })
            );
        }
    }

    #[test]
    fn resample_rejects_invalid_weights() {
        let particles = vec![Pose::new(0.0, 0.0, 0.0); 3];
        let mut rng = BoxMuller::seeded(0);
        assert_eq!(
            Wheel.resample(&particles, &[1.0, -1.0, 1.0], &mut rng),
            Err(FilterError::InvalidWeight {
                index: 1,
                value: -1.0
            })
        );
        assert!(InverseCdf
            .resample(&particles, &[1.0, f64::NAN, 1.0], &mut rng)
            .is_err());
    }

    #[test]
    fn empty_population_resamples_to_empty() {
        let mut rng = BoxMuller::seeded(0);
        assert!(Wheel.resample(&[], &[], &mut rng).unwrap().is_empty());
        assert!(InverseCdf.resample(&[], &[], &mut rng).unwrap().is_empty());
    }

    #[test]
    fn zero_weights_fall_back_to_uniform_draws() {
        let particles: Vec<Pose> = (0..50).map(|i| Pose::new(i as f64, 0.0, 0.0)).collect();
        let weights = vec![0.0; 50];
        let mut rng = BoxMuller::seeded(8);
        for strategy in [ResamplingStrategy::InverseCdf, ResamplingStrategy::Wheel] {
            let out = strategy.build().resample(&particles, &weights, &mut rng).unwrap();
            assert_eq!(out.len(), 50);
            let distinct = out
                .iter()
                .map(|p| p.x as usize)
                .collect::<std::collections::HashSet<_>>();
            assert!(distinct.len() > 1);
        }
    }

    #[test]
    fn strategy_names_round_trip_through_build() {
        assert_eq!(ResamplingStrategy::InverseCdf.build().name(), "inverse_cdf");
        assert_eq!(ResamplingStrategy::Wheel.build().name(), "wheel");
    }
}
