// mcl_sim/src/simulation/config/structs.rs

use mcl_core::motion::{Bicycle, MotionModel, Unicycle, DEFAULT_MAX_STEERING_ANGLE};
use mcl_core::pose::{NoiseParams, World};
use mcl_core::resample::ResamplingStrategy;
use mcl_core::rng::GaussianKind;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a scenario TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Control commands `[angle, distance]`, applied in order and repeated
    /// when the run has more steps than commands.
    #[serde(default)]
    pub controls: Vec<[f64; 2]>,

    #[serde(default)] // Use defaults if the [simulation] section is missing
    pub simulation: SimulationConfig,

    pub world: WorldConfig,

    pub robot: RobotConfig,

    pub particles: ParticleConfig,
}

impl ScenarioConfig {
    /// Structural checks that serde cannot express. Numeric ranges are
    /// validated by the filter types themselves when the run is built.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.controls.is_empty() {
            return Err(SimError::Scenario("at least one control is required".into()));
        }
        if self.world.landmarks.is_empty() {
            return Err(SimError::Scenario("at least one landmark is required".into()));
        }
        if self.particles.count == 0 {
            return Err(SimError::Scenario("particle count must be positive".into()));
        }
        Ok(())
    }

    /// The fully resolved scenario, in the same format it was read from.
    pub fn to_toml(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// =========================================================================
// == Sections ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed of the run's generator. Runs without one use a fixed seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default)]
    pub gaussian: GaussianKind,
    /// Draw per-particle motion noise from independent streams and spread the
    /// work over a thread pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_steps() -> usize {
    10
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            steps: default_steps(),
            gaussian: GaussianKind::default(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    /// Side length of the square world.
    pub size: f64,
    pub landmarks: Vec<[f64; 2]>,
}

impl WorldConfig {
    pub fn build(&self) -> Result<World, SimError> {
        Ok(World::new(self.size)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobotConfig {
    /// `[x, y, orientation]`. Without it the robot is placed at random.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<[f64; 3]>,
    #[serde(default)]
    pub noise: NoiseParams,
    #[serde(default)]
    pub model: MotionModelConfig,
}

// The `tag = "type"` tells Serde to look for a `type = "..."` field in the TOML
// to decide which variant to parse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase", deny_unknown_fields)]
pub enum MotionModelConfig {
    #[default]
    Unicycle,
    Bicycle {
        wheelbase: f64,
        #[serde(default = "default_max_steering_angle")]
        max_steering_angle: f64,
    },
}

fn default_max_steering_angle() -> f64 {
    DEFAULT_MAX_STEERING_ANGLE
}

impl MotionModelConfig {
    pub fn build(&self, world: World) -> Result<Box<dyn MotionModel>, SimError> {
        Ok(match self {
            MotionModelConfig::Unicycle => Box::new(Unicycle::new(world)),
            MotionModelConfig::Bicycle {
                max_steering_angle,
                ..
            } => Box::new(Bicycle::new(*max_steering_angle)?),
        })
    }

    pub fn wheelbase(&self) -> Option<f64> {
        match self {
            MotionModelConfig::Unicycle => None,
            MotionModelConfig::Bicycle { wheelbase, .. } => Some(*wheelbase),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleConfig {
    pub count: usize,
    /// Noise carried by every particle. Defaults to the robot's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseParams>,
    #[serde(default)]
    pub resampler: ResamplingStrategy,
}
