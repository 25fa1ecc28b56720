// mcl_sim/src/simulation/core/runner.rs

use mcl_core::evaluation::mean_error;
use mcl_core::filter::{scatter, Execution, ParticleFilter};
use mcl_core::motion::{Control, MotionModel};
use mcl_core::pose::{Pose, World};
use mcl_core::sensor::RangeSensor;
use nalgebra::Point2;
use tracing::info;

use crate::error::SimError;
use crate::simulation::config::ScenarioConfig;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::debugging::{RunSummary, StepReport};

/// A ground-truth robot driven through a scenario, tracked by a particle
/// filter.
///
/// Each step: move the robot, let it sense the landmarks, then run one
/// predict → weigh → resample cycle of the filter with the same control and
/// the robot's observation. The robot's new pose is kept only if the filter
/// step succeeds.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    robot: Pose,
    robot_model: Box<dyn MotionModel>,
    filter: ParticleFilter,
    controls: Vec<Control>,
    rng: SimulationRng,
    steps: usize,
    completed: usize,
}

impl Simulation {
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;

        // --- 1. Deterministic noise source ---
        let mut rng = SimulationRng::new(config.simulation.seed, config.simulation.gaussian);

        // --- 2. World, robot and its motion model ---
        let world = config.world.build()?;
        let robot_config = &config.robot;
        robot_config.noise.validate()?;
        let robot_model = robot_config.model.build(world)?;
        let wheelbase = robot_config.model.wheelbase();

        let robot = match robot_config.start {
            Some([x, y, orientation]) => Pose::place(x, y, orientation, &world)?,
            None => Pose::random(&world, rng.source()),
        }
        .with_noise(robot_config.noise);
        let robot = match wheelbase {
            Some(l) => robot.with_wheelbase(l)?,
            None => robot,
        };

        // --- 3. Particle filter ---
        let particle_noise = config.particles.noise.unwrap_or(robot_config.noise);
        let particles = scatter(
            config.particles.count,
            &world,
            particle_noise,
            wheelbase,
            rng.source(),
        )?;
        let sensor = RangeSensor::new(
            config
                .world
                .landmarks
                .iter()
                .map(|&[x, y]| Point2::new(x, y))
                .collect(),
        )?;
        let execution = if config.simulation.parallel {
            Execution::Streams(config.simulation.gaussian)
        } else {
            Execution::Sequential
        };
        let filter = ParticleFilter::new(
            particles,
            robot_model.clone(),
            sensor,
            config.particles.resampler.build(),
        )?
        .with_execution(execution);

        info!(
            "Simulation ready | Model: {} | Particles: {} | Landmarks: {} | Seed: {}",
            robot_model.name(),
            filter.len(),
            config.world.landmarks.len(),
            rng.seed()
        );

        Ok(Self {
            world,
            robot,
            robot_model,
            filter,
            controls: config.controls.iter().copied().map(Control::from).collect(),
            rng,
            steps: config.simulation.steps,
            completed: 0,
        })
    }

    pub fn robot(&self) -> &Pose {
        &self.robot
    }

    pub fn filter(&self) -> &ParticleFilter {
        &self.filter
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.steps
    }

    /// Current mean distance from the particles to the robot.
    pub fn mean_error(&self) -> f64 {
        mean_error(&self.robot, self.filter.particles(), &self.world)
    }

    /// The control for the next step. Controls repeat once exhausted.
    fn next_control(&self) -> Control {
        self.controls[self.completed % self.controls.len()]
    }

    /// Runs one step, even past the configured step count.
    pub fn step(&mut self) -> Result<StepReport, SimError> {
        let control = self.next_control();

        let robot = self
            .robot_model
            .move_pose(&self.robot, &control, self.rng.source())?;
        let observation = self.filter.sensor().sense(&robot, self.rng.source());
        let weights = self.filter.step(&control, &observation, self.rng.source())?;

        self.robot = robot;
        self.completed += 1;
        let report = StepReport {
            step: self.completed,
            robot,
            observation,
            mean_error: self.mean_error(),
            effective_sample_size: weights.effective_sample_size(),
            log_max_likelihood: weights.log_max,
        };
        report.log();
        Ok(report)
    }

    /// Runs the remaining configured steps.
    pub fn run(&mut self) -> Result<(RunSummary, Vec<StepReport>), SimError> {
        let initial_error = self.mean_error();
        let mut reports = Vec::with_capacity(self.steps.saturating_sub(self.completed));
        while !self.is_finished() {
            reports.push(self.step()?);
        }
        let summary = RunSummary::from_reports(initial_error, &reports);
        summary.log();
        Ok((summary, reports))
    }
}
