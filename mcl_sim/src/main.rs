// mcl_sim/src/main.rs

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcl_sim::cli::Cli;
use mcl_sim::simulation::config::load_scenario;
use mcl_sim::Simulation;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `--log-level` wins over RUST_LOG, which wins over the default.
    let filter = match &cli.log_level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_scenario(&cli.scenario, &cli.overrides())
        .with_context(|| format!("could not load {}", cli.scenario.display()))?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mut simulation = Simulation::from_config(&config)?;
    simulation.run()?;
    Ok(())
}
