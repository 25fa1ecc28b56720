// mcl_core/src/sensor.rs

use nalgebra::{distance, Point2};
use std::f64::consts::TAU;

use crate::error::{FilterError, Result};
use crate::pose::Pose;
use crate::rng::NoiseSource;

/// Normal probability density of `x` under `Normal(mu, sigma)`.
pub fn gaussian_density(mu: f64, sigma: f64, x: f64) -> f64 {
    let variance = sigma * sigma;
    (-(x - mu).powi(2) / (2.0 * variance)).exp() / (sigma * TAU.sqrt())
}

/// Natural log of [`gaussian_density`], finite wherever `sigma > 0` and the
/// squared error does not overflow.
pub fn log_gaussian_density(mu: f64, sigma: f64, x: f64) -> f64 {
    -0.5 * ((x - mu) / sigma).powi(2) - (sigma * TAU.sqrt()).ln()
}

/// Range sensor against a fixed, known set of landmarks.
///
/// `sense` produces one noisy Euclidean range per landmark, in landmark order;
/// `likelihood` scores a pose against such a reading.
#[derive(Debug, Clone)]
pub struct RangeSensor {
    landmarks: Vec<Point2<f64>>,
}

impl RangeSensor {
    pub fn new(landmarks: Vec<Point2<f64>>) -> Result<Self> {
        if landmarks.is_empty() {
            return Err(FilterError::InvalidConfig(
                "a range sensor needs at least one landmark".into(),
            ));
        }
        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Point2<f64>] {
        &self.landmarks
    }

    /// Noise-free ranges from `pose` to every landmark.
    pub fn ranges(&self, pose: &Pose) -> Vec<f64> {
        let position = pose.position();
        self.landmarks
            .iter()
            .map(|landmark| distance(&position, landmark))
            .collect()
    }

    /// Ranges perturbed by the pose's sense noise.
    pub fn sense(&self, pose: &Pose, rng: &mut dyn NoiseSource) -> Vec<f64> {
        self.ranges(pose)
            .into_iter()
            .map(|range| range + rng.gaussian(0.0, pose.noise.sense))
            .collect()
    }

    /// Unnormalized importance weight of `pose` given `observed` ranges.
    ///
    /// This is a product of densities and is routinely far below 1; it is not a
    /// probability. With many landmarks or a small sense noise the product
    /// leaves the range of `f64`; weigh with [`Self::log_likelihood`] instead.
    pub fn likelihood(&self, pose: &Pose, observed: &[f64]) -> Result<f64> {
        Ok(self.log_likelihood(pose, observed)?.exp())
    }

    /// Sum of per-landmark log densities. May be `-inf` for a hopeless pose,
    /// never NaN or `+inf` for finite input.
    pub fn log_likelihood(&self, pose: &Pose, observed: &[f64]) -> Result<f64> {
        self.check_observation(observed)?;
        let sigma = pose.noise.sense;
        if !(sigma > 0.0) {
            return Err(FilterError::InvalidNoise {
                name: "sense",
                value: sigma,
            });
        }
        Ok(self
            .ranges(pose)
            .into_iter()
            .zip(observed)
            .map(|(expected, &measured)| log_gaussian_density(expected, sigma, measured))
            .sum())
    }

    pub fn check_observation(&self, observed: &[f64]) -> Result<()> {
        if observed.len() != self.landmarks.len() {
            return Err(FilterError::LengthMismatch {
                expected: self.landmarks.len(),
                actual: observed.len(),
            });
        }
        Ok(())
    }
}
