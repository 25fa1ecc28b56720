// mcl_sim/src/simulation/debugging/state_error.rs

use mcl_core::pose::Pose;
use serde::Serialize;
use tracing::{debug, info};

/// What happened in one step of the run, measured against ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: usize,
    /// The robot's true pose after moving.
    pub robot: Pose,
    /// Ranges the robot measured to each landmark.
    pub observation: Vec<f64>,
    /// Mean wrap-aware distance from the resampled particles to the robot.
    pub mean_error: f64,
    /// Effective sample size of the weights used for resampling.
    pub effective_sample_size: f64,
    /// Log-likelihood of the best particle of the step.
    pub log_max_likelihood: f64,
}

impl StepReport {
    pub fn log(&self) {
        info!(
            "Step {:>3} | Robot: ({:.3}, {:.3}, {:.4}) | Mean Err: {:.3} | ESS: {:.1}",
            self.step,
            self.robot.x,
            self.robot.y,
            self.robot.orientation(),
            self.mean_error,
            self.effective_sample_size
        );
        debug!(
            step = self.step,
            log_max_likelihood = self.log_max_likelihood,
            observation = ?self.observation,
            "step details"
        );
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub initial_error: f64,
    pub final_error: f64,
}

impl RunSummary {
    pub fn from_reports(initial_error: f64, reports: &[StepReport]) -> Self {
        Self {
            steps: reports.len(),
            initial_error,
            final_error: reports.last().map_or(initial_error, |r| r.mean_error),
        }
    }

    pub fn log(&self) {
        info!(
            "Run complete | Steps: {} | Initial Err: {:.3} | Final Err: {:.3}",
            self.steps, self.initial_error, self.final_error
        );
    }
}
