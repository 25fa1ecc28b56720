// mcl_core/src/prelude.rs

// --- Errors ---
pub use crate::error::{FilterError, Result};

// --- Core data ---
pub use crate::motion::Control;
pub use crate::pose::{wrap, wrap_angle, NoiseParams, Pose, World};

// --- Contracts ---
pub use crate::motion::MotionModel;
pub use crate::resample::Resampler;
pub use crate::rng::NoiseSource;

// --- Concrete implementations ---
pub use crate::motion::{Bicycle, Unicycle};
pub use crate::resample::{InverseCdf, ResamplingStrategy, Wheel};
pub use crate::rng::{BoxMuller, GaussianKind, ReplaySource, Ziggurat};
pub use crate::sensor::RangeSensor;

// --- Filtering and diagnostics ---
pub use crate::evaluation::{effective_sample_size, mean_error};
pub use crate::filter::{scatter, Execution, ParticleFilter, Weights};
pub use crate::histogram::{HistogramFilter, HistogramParams};
