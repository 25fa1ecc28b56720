// mcl_sim/src/prelude.rs

// Re-export the entire mcl_core prelude so you can easily access
// pure types like `Pose`, `MotionModel`, `ParticleFilter`, etc.
pub use mcl_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::error::SimError;
pub use crate::simulation::config::{load_scenario, Overrides, ScenarioConfig};
pub use crate::simulation::core::{Simulation, SimulationRng};
pub use crate::simulation::debugging::{RunSummary, StepReport};
