// mcl_core/src/filter.rs

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{FilterError, Result};
use crate::evaluation::effective_sample_size;
use crate::motion::{Control, MotionModel};
use crate::pose::{NoiseParams, Pose, World};
use crate::resample::Resampler;
use crate::rng::{GaussianKind, NoiseSource};
use crate::sensor::RangeSensor;

/// Importance weights of one weighing pass, parallel to the particle set.
///
/// `values` are relative: each is divided by the largest weight of the pass,
/// so the best particle scores 1. `log_max` is the log-likelihood of that
/// particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub values: Vec<f64>,
    pub max: f64,
    pub log_max: f64,
}

impl Weights {
    /// Exponentiates log-likelihoods relative to their maximum.
    ///
    /// Every value lands in `[0, 1]` however large or small the likelihoods
    /// were. When no particle has a finite log-likelihood all weights are zero.
    /// NaN passes through so resampling can reject it.
    pub fn from_log(log_values: &[f64]) -> Self {
        let log_max = log_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let values: Vec<f64> = log_values
            .iter()
            .map(|&l| {
                if log_max.is_finite() {
                    (l - log_max).exp()
                } else if l.is_nan() {
                    l
                } else {
                    0.0
                }
            })
            .collect();
        let max = values.iter().copied().fold(0.0, f64::max);
        Self {
            values,
            max,
            log_max,
        }
    }

    pub fn effective_sample_size(&self) -> f64 {
        effective_sample_size(&self.values)
    }
}

/// How the per-particle motion pass draws its noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// All particles share the caller's generator, in particle order.
    #[default]
    Sequential,
    /// Each particle gets its own stream of a seed forked from the caller's
    /// generator. The result does not depend on how the work is scheduled.
    Streams(GaussianKind),
}

/// Draws `count` uniformly placed particles carrying `noise` (and `wheelbase`
/// for the bicycle model).
pub fn scatter(
    count: usize,
    world: &World,
    noise: NoiseParams,
    wheelbase: Option<f64>,
    rng: &mut dyn NoiseSource,
) -> Result<Vec<Pose>> {
    noise.validate()?;
    (0..count)
        .map(|_| {
            let pose = Pose::random(world, rng).with_noise(noise);
            match wheelbase {
                Some(l) => pose.with_wheelbase(l),
                None => Ok(pose),
            }
        })
        .collect()
}

/// Monte Carlo localization over a fixed landmark map.
///
/// One step is: move every particle by the robot's control, weigh each against
/// the robot's range reading, and resample the population in proportion to
/// those weights.
#[derive(Debug)]
pub struct ParticleFilter {
    particles: Vec<Pose>,
    motion_model: Box<dyn MotionModel>,
    sensor: RangeSensor,
    resampler: Box<dyn Resampler>,
    execution: Execution,
}

impl ParticleFilter {
    pub fn new(
        particles: Vec<Pose>,
        motion_model: Box<dyn MotionModel>,
        sensor: RangeSensor,
        resampler: Box<dyn Resampler>,
    ) -> Result<Self> {
        if particles.is_empty() {
            return Err(FilterError::InvalidConfig(
                "a particle filter needs at least one particle".into(),
            ));
        }
        // Weighing divides by the sense noise; reject it here rather than
        // midway through a step.
        if let Some(p) = particles.iter().find(|p| !(p.noise.sense > 0.0)) {
            return Err(FilterError::InvalidNoise {
                name: "sense",
                value: p.noise.sense,
            });
        }
        debug!(
            particles = particles.len(),
            motion = motion_model.name(),
            resampler = resampler.name(),
            "particle filter created"
        );
        Ok(Self {
            particles,
            motion_model,
            sensor,
            resampler,
            execution: Execution::default(),
        })
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn particles(&self) -> &[Pose] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn sensor(&self) -> &RangeSensor {
        &self.sensor
    }

    pub fn motion_model(&self) -> &(dyn MotionModel + 'static) {
        &*self.motion_model
    }

    /// Moves every particle by `control`.
    ///
    /// The control is checked against every particle before the first noise
    /// draw, so an error leaves both the population and `rng` untouched.
    pub fn predict(&mut self, control: &Control, rng: &mut dyn NoiseSource) -> Result<()> {
        self.particles = self.propagate(control, rng)?;
        Ok(())
    }

    fn propagate(&self, control: &Control, rng: &mut dyn NoiseSource) -> Result<Vec<Pose>> {
        for particle in &self.particles {
            self.motion_model.check(particle, control)?;
        }

        let moved = match self.execution {
            Execution::Sequential => self
                .particles
                .iter()
                .map(|p| self.motion_model.move_pose(p, control, rng))
                .collect::<Result<Vec<_>>>()?,
            Execution::Streams(kind) => {
                let seed = rng.fork_seed();
                trace!(seed, "forked per-particle noise streams");
                self.predict_streams(control, seed, kind)?
            }
        };
        Ok(moved)
    }

    fn predict_streams(&self, control: &Control, seed: u64, kind: GaussianKind) -> Result<Vec<Pose>> {
        let motion_model = &*self.motion_model;
        let advance = |(i, p): (usize, &Pose)| {
            let mut stream = kind.build_stream(seed, i as u64);
            motion_model.move_pose(p, control, &mut *stream)
        };

        #[cfg(feature = "parallel")]
        {
            self.particles.par_iter().enumerate().map(advance).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.particles.iter().enumerate().map(advance).collect()
        }
    }

    /// Importance weight of every particle given the robot's `observation`.
    ///
    /// Likelihoods are combined in log space and rescaled by the best one, so
    /// the weights stay finite for any number of landmarks.
    pub fn weigh(&self, observation: &[f64]) -> Result<Weights> {
        self.weigh_population(&self.particles, observation)
    }

    fn weigh_population(&self, particles: &[Pose], observation: &[f64]) -> Result<Weights> {
        self.sensor.check_observation(observation)?;
        let log_likelihood = |p: &Pose| self.sensor.log_likelihood(p, observation);

        #[cfg(feature = "parallel")]
        let log_values: Vec<f64> = match self.execution {
            Execution::Sequential => particles.iter().map(log_likelihood).collect::<Result<_>>()?,
            Execution::Streams(_) => particles
                .par_iter()
                .map(log_likelihood)
                .collect::<Result<_>>()?,
        };
        #[cfg(not(feature = "parallel"))]
        let log_values: Vec<f64> = particles.iter().map(log_likelihood).collect::<Result<_>>()?;

        let weights = Weights::from_log(&log_values);
        trace!(log_max = weights.log_max, "weighed particles");
        Ok(weights)
    }

    /// Replaces the population with a weighted draw of the same size.
    pub fn resample(&mut self, weights: &Weights, rng: &mut dyn NoiseSource) -> Result<()> {
        self.particles = self
            .resampler
            .resample(&self.particles, &weights.values, rng)?;
        Ok(())
    }

    /// One full predict → weigh → resample cycle. Returns the weights the
    /// population was resampled with.
    ///
    /// The new population is only stored once every stage has succeeded; on
    /// error the particles are those of the previous step.
    pub fn step(
        &mut self,
        control: &Control,
        observation: &[f64],
        rng: &mut dyn NoiseSource,
    ) -> Result<Weights> {
        self.sensor.check_observation(observation)?;
        let moved = self.propagate(control, rng)?;
        let weights = self.weigh_population(&moved, observation)?;
        self.particles = self.resampler.resample(&moved, &weights.values, rng)?;
        Ok(weights)
    }
}
