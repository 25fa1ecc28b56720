// mcl_core/src/lib.rs

//! Monte Carlo localization of a planar robot against known range landmarks.

pub mod error;
pub mod evaluation;
pub mod filter;
pub mod histogram;
pub mod motion;
pub mod pose;
pub mod prelude;
pub mod resample;
pub mod rng;
pub mod sensor;
