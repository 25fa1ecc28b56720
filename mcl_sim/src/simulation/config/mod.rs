// mcl_sim/src/simulation/config/mod.rs

//! Loading and validating scenario configuration.
//!
//! Sources are layered, later ones winning: the scenario TOML file, then
//! `MCL_`-prefixed environment variables (`__` separates nested keys, e.g.
//! `MCL_SIMULATION__STEPS=50`), then command-line overrides.

pub mod structs;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::{debug, info};

use crate::error::SimError;
pub use structs::{
    MotionModelConfig, ParticleConfig, RobotConfig, ScenarioConfig, SimulationConfig, WorldConfig,
};

/// Values given on the command line that replace those in the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub steps: Option<usize>,
}

/// Builds the layered figment for a scenario file without extracting it.
pub fn figment(path: &Path, overrides: &Overrides) -> Figment {
    let mut figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MCL_").split("__"));
    if let Some(seed) = overrides.seed {
        figment = figment.merge(Serialized::default("simulation.seed", seed));
    }
    if let Some(steps) = overrides.steps {
        figment = figment.merge(Serialized::default("simulation.steps", steps));
    }
    figment
}

/// Loads, merges and validates the scenario at `path`.
pub fn load_scenario(path: &Path, overrides: &Overrides) -> Result<ScenarioConfig, SimError> {
    // A missing file is an empty provider to figment; fail loudly instead.
    if !path.is_file() {
        return Err(SimError::Scenario(format!(
            "scenario file not found: {}",
            path.display()
        )));
    }
    info!("Loading scenario from: {}", path.display());

    let config: ScenarioConfig = figment(path, overrides).extract()?;
    config.validate()?;

    if let Ok(resolved) = config.to_toml() {
        debug!("Resolved scenario:\n{resolved}");
    }
    Ok(config)
}
