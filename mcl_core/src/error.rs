// mcl_core/src/error.rs

use thiserror::Error;

/// Every way a localization operation can refuse its input.
///
/// All checks happen before any random draw or state change, so an `Err` always
/// leaves the caller's poses, weights and generator untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("cannot move a negative distance ({distance})")]
    InvalidMotion { distance: f64 },

    #[error("steering angle {angle} exceeds the limit of ±{max} rad")]
    InvalidSteering { angle: f64, max: f64 },

    #[error("expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("empty uniform range: max ({max}) must be greater than min ({min})")]
    InvalidRange { min: f64, max: f64 },

    #[error("noise parameter `{name}` must be a finite, non-negative value (got {value})")]
    InvalidNoise { name: &'static str, value: f64 },

    #[error("weight #{index} is {value}; weights must be finite and non-negative")]
    InvalidWeight { index: usize, value: f64 },

    #[error("the bicycle model requires a pose with a wheelbase")]
    MissingWheelbase,

    #[error("position ({x}, {y}) lies outside a world of size {size}")]
    OutOfBounds { x: f64, y: f64, size: f64 },

    #[error("invalid filter configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
