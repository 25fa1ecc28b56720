use clap::Parser;
use std::path::PathBuf;

use crate::simulation::config::Overrides;

/// mcl_sim: Monte Carlo localization of a simulated robot.
///
/// This struct defines the command-line arguments accepted by the simulation
/// runner. Values given here take precedence over the scenario file and over
/// `MCL_*` environment variables.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/unicycle.toml")]
    pub scenario: PathBuf,

    /// Seed for the run's random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of simulation steps to run.
    #[arg(long)]
    pub steps: Option<usize>,

    /// Log filter directive (e.g. `debug` or `mcl_core=trace`). Overrides `RUST_LOG`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the fully resolved scenario as TOML and exit without running it.
    #[arg(long, default_value_t = false)]
    pub dump_config: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            steps: self.steps,
        }
    }
}
