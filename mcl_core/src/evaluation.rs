// mcl_core/src/evaluation.rs

//! Diagnostics for estimation quality. Nothing here feeds back into filtering.

use nalgebra::Vector2;

use crate::pose::{wrap, Pose, World};

/// Signed shortest difference `to - from` on a torus of side `size`.
pub fn toroidal_delta(from: f64, to: f64, size: f64) -> f64 {
    let half = size / 2.0;
    wrap(to - from + half, 0.0, size) - half
}

/// Average distance from each particle to `truth`, measured across the wrap
/// boundary of `world` when that is shorter. Returns 0 for an empty set.
pub fn mean_error(truth: &Pose, particles: &[Pose], world: &World) -> f64 {
    if particles.is_empty() {
        return 0.0;
    }
    let total: f64 = particles
        .iter()
        .map(|p| {
            Vector2::new(
                toroidal_delta(truth.x, p.x, world.size),
                toroidal_delta(truth.y, p.y, world.size),
            )
            .norm()
        })
        .sum();
    total / particles.len() as f64
}

/// `1 / Σ ŵ²` over the normalized weights: N for uniform weights, 1 when a
/// single particle carries all the mass, 0 when every weight is zero.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let max = weights.iter().copied().fold(0.0, f64::max);
    if !(max > 0.0) {
        return 0.0;
    }
    let total: f64 = weights.iter().map(|w| w / max).sum();
    let sum_sq: f64 = weights.iter().map(|w| (w / max / total).powi(2)).sum();
    1.0 / sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(100.0).unwrap()
    }

    #[test]
    fn delta_takes_the_short_way_around() {
        assert_relative_eq!(toroidal_delta(95.0, 5.0, 100.0), 10.0);
        assert_relative_eq!(toroidal_delta(5.0, 95.0, 100.0), -10.0);
        assert_relative_eq!(toroidal_delta(40.0, 60.0, 100.0), 20.0);
    }

    #[test]
    fn mean_error_of_exact_particles_is_zero() {
        let truth = Pose::new(30.0, 50.0, 1.0);
        let particles = vec![truth; 10];
        assert_relative_eq!(mean_error(&truth, &particles, &world()), 0.0);
    }

    #[test]
    fn mean_error_averages_euclidean_distances() {
        let truth = Pose::new(50.0, 50.0, 0.0);
        let particles = vec![Pose::new(53.0, 54.0, 0.0), Pose::new(50.0, 40.0, 2.0)];
        assert_relative_eq!(mean_error(&truth, &particles, &world()), 7.5);
    }

    #[test]
    fn mean_error_measures_across_the_boundary() {
        let truth = Pose::new(1.0, 99.0, 0.0);
        let particles = vec![Pose::new(99.0, 1.0, 0.0)];
        assert_relative_eq!(
            mean_error(&truth, &particles, &world()),
            8.0_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn mean_error_of_no_particles_is_zero() {
        assert_eq!(mean_error(&Pose::new(0.0, 0.0, 0.0), &[], &world()), 0.0);
    }

    #[test]
    fn effective_sample_size_bounds() {
        assert_relative_eq!(effective_sample_size(&[0.2; 5]), 5.0, epsilon = 1e-9);
        assert_relative_eq!(effective_sample_size(&[0.0, 3.0, 0.0]), 1.0);
        assert_eq!(effective_sample_size(&[0.0, 0.0]), 0.0);
        assert_relative_eq!(effective_sample_size(&[f64::MAX; 4]), 4.0, epsilon = 1e-9);
    }
}
