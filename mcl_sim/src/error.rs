// mcl_sim/src/error.rs

use mcl_core::error::FilterError;
use thiserror::Error;

/// Everything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to serialize scenario: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The scenario parsed but describes something that cannot be run.
    #[error("invalid scenario: {0}")]
    Scenario(String),
}
