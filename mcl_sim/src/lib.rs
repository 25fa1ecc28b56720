// mcl_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the mcl_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;

pub use error::SimError;
pub use simulation::core::Simulation;
