// mcl_sim/src/simulation/core/mod.rs

pub mod prng;
pub mod runner;

pub use prng::{SimulationRng, DEFAULT_SEED};
pub use runner::Simulation;
