// mcl_sim/tests/scenario.rs

use figment::Jail;
use mcl_sim::prelude::*;
use mcl_sim::simulation::config::MotionModelConfig;
use std::path::{Path, PathBuf};

const MINIMAL: &str = r#"
controls = [[0.1, 5.0], [0.0, 2.0]]

[world]
size = 100.0
landmarks = [[20.0, 20.0], [80.0, 80.0]]

[robot]
start = [30.0, 50.0, 0.0]
noise = { motion = 0.05, turn = 0.05, sense = 5.0 }

[particles]
count = 200
"#;

fn shipped(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets/scenarios")
        .join(name)
}

#[test]
fn minimal_scenario_fills_in_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", MINIMAL)?;
        let config = load_scenario(Path::new("scenario.toml"), &Overrides::default())
            .map_err(|e| e.to_string())?;

        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.simulation.steps, 10);
        assert_eq!(config.simulation.gaussian, GaussianKind::BoxMuller);
        assert!(!config.simulation.parallel);
        assert_eq!(config.robot.model, MotionModelConfig::Unicycle);
        assert_eq!(config.particles.resampler, ResamplingStrategy::Wheel);
        assert_eq!(config.particles.noise, None);
        assert_eq!(config.controls, vec![[0.1, 5.0], [0.0, 2.0]]);
        Ok(())
    });
}

#[test]
fn environment_overrides_file_and_cli_overrides_both() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", MINIMAL)?;
        jail.set_env("MCL_SIMULATION__STEPS", "3");
        jail.set_env("MCL_SIMULATION__SEED", "5");
        jail.set_env("MCL_PARTICLES__RESAMPLER", "inverse_cdf");

        let path = Path::new("scenario.toml");
        let config = load_scenario(path, &Overrides::default()).map_err(|e| e.to_string())?;
        assert_eq!(config.simulation.steps, 3);
        assert_eq!(config.simulation.seed, Some(5));
        assert_eq!(config.particles.resampler, ResamplingStrategy::InverseCdf);

        let overrides = Overrides {
            seed: Some(11),
            steps: Some(4),
        };
        let config = load_scenario(path, &overrides).map_err(|e| e.to_string())?;
        assert_eq!(config.simulation.steps, 4);
        assert_eq!(config.simulation.seed, Some(11));
        Ok(())
    });
}

#[test]
fn bicycle_model_is_selected_by_type_tag() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "scenario.toml",
            &format!("{MINIMAL}\n[robot.model]\ntype = \"Bicycle\"\nwheelbase = 12.5\n"),
        )?;
        let config = load_scenario(Path::new("scenario.toml"), &Overrides::default())
            .map_err(|e| e.to_string())?;
        assert_eq!(
            config.robot.model,
            MotionModelConfig::Bicycle {
                wheelbase: 12.5,
                max_steering_angle: std::f64::consts::FRAC_PI_4,
            }
        );
        Ok(())
    });
}

#[test]
fn malformed_scenarios_are_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("typo.toml", &MINIMAL.replace("count = 200", "cuont = 200"))?;
        jail.create_file("empty.toml", &MINIMAL.replace("[[0.1, 5.0], [0.0, 2.0]]", "[]"))?;
        jail.create_file(
            "model.toml",
            &format!("{MINIMAL}\n[robot.model]\ntype = \"Tank\"\n"),
        )?;

        let none = Overrides::default();
        assert!(matches!(
            load_scenario(Path::new("typo.toml"), &none),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            load_scenario(Path::new("model.toml"), &none),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            load_scenario(Path::new("empty.toml"), &none),
            Err(SimError::Scenario(_))
        ));
        assert!(matches!(
            load_scenario(Path::new("missing.toml"), &none),
            Err(SimError::Scenario(_))
        ));
        Ok(())
    });
}

#[test]
fn resolved_scenario_round_trips_through_toml() {
    Jail::expect_with(|jail| {
        let config = load_scenario(&shipped("bicycle.toml"), &Overrides::default())
            .map_err(|e| e.to_string())?;
        jail.create_file("resolved.toml", &config.to_toml().map_err(|e| e.to_string())?)?;
        let reloaded = load_scenario(Path::new("resolved.toml"), &Overrides::default())
            .map_err(|e| e.to_string())?;
        assert_eq!(reloaded, config);
        Ok(())
    });
}

#[test]
fn shipped_scenarios_run_to_completion() {
    Jail::expect_with(|_| {
        for name in ["unicycle.toml", "bicycle.toml"] {
            let config = load_scenario(&shipped(name), &Overrides::default())
                .map_err(|e| e.to_string())?;
            let mut sim = Simulation::from_config(&config).map_err(|e| e.to_string())?;
            let (summary, reports) = sim.run().map_err(|e| e.to_string())?;
            assert_eq!(reports.len(), config.simulation.steps, "{name}");
            assert!(
                summary.final_error < summary.initial_error,
                "{name}: {summary:?}"
            );
        }
        Ok(())
    });
}
