// mcl_core/src/motion.rs

use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use std::fmt::Debug;

use crate::error::{FilterError, Result};
use crate::pose::{wrap_angle, Pose, World};
use crate::rng::NoiseSource;

/// Heading changes below this are integrated as a straight segment.
pub const STRAIGHT_LINE_TOLERANCE: f64 = 1e-4;

/// Default steering limit of the bicycle model (45°).
pub const DEFAULT_MAX_STEERING_ANGLE: f64 = FRAC_PI_4;

/// One control command.
///
/// For the unicycle model `angle` is the turn applied before driving; for the
/// bicycle model it is the front-wheel steering angle held over the segment.
/// `distance` is the forward travel and must be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub angle: f64,
    pub distance: f64,
}

impl Control {
    pub fn new(angle: f64, distance: f64) -> Self {
        Self { angle, distance }
    }
}

impl From<[f64; 2]> for Control {
    fn from([angle, distance]: [f64; 2]) -> Self {
        Self::new(angle, distance)
    }
}

/// A kinematic state-transition model used to advance the robot and every
/// particle by the same control.
///
/// Implementations never mutate their input: `move_pose` returns a new pose
/// that carries the input's noise parameters and wheelbase forward.
pub trait MotionModel: DynClone + Debug + Send + Sync {
    /// Checks that `control` can be applied to `pose` without drawing any
    /// noise. `move_pose` performs the same checks first.
    fn check(&self, pose: &Pose, control: &Control) -> Result<()>;

    /// Applies `control` to `pose`, perturbed by the pose's motion noise.
    fn move_pose(&self, pose: &Pose, control: &Control, rng: &mut dyn NoiseSource)
        -> Result<Pose>;

    fn name(&self) -> &'static str;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn MotionModel>`.
dyn_clone::clone_trait_object!(MotionModel);

fn check_distance(distance: f64) -> Result<()> {
    if distance >= 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidMotion { distance })
    }
}

/// Turn-then-drive model on a toroidal world.
///
/// The pose first rotates by `angle` plus turn noise, then drives `distance`
/// plus motion noise along the new heading. Both coordinates wrap modulo the
/// world size.
#[derive(Debug, Clone)]
pub struct Unicycle {
    pub world: World,
}

impl Unicycle {
    pub fn new(world: World) -> Self {
        Self { world }
    }
}

impl MotionModel for Unicycle {
    fn check(&self, _pose: &Pose, control: &Control) -> Result<()> {
        check_distance(control.distance)
    }

    fn move_pose(
        &self,
        pose: &Pose,
        control: &Control,
        rng: &mut dyn NoiseSource,
    ) -> Result<Pose> {
        self.check(pose, control)?;

        let orientation = wrap_angle(
            pose.orientation() + control.angle + rng.gaussian(0.0, pose.noise.turn),
        );
        let dist = control.distance + rng.gaussian(0.0, pose.noise.motion);
        let x = self.world.wrap_coordinate(pose.x + orientation.cos() * dist);
        let y = self.world.wrap_coordinate(pose.y + orientation.sin() * dist);

        Ok(pose.moved_to(x, y, orientation))
    }

    fn name(&self) -> &'static str {
        "unicycle"
    }
}

/// Kinematic bicycle (Ackermann) model.
///
/// The rear axle follows a circular arc whose curvature is set by the steering
/// angle and the pose's wheelbase. Coordinates are not wrapped: the world is
/// bounded only for initial placement.
#[derive(Debug, Clone)]
pub struct Bicycle {
    /// Maximum allowable steering angle (radians).
    pub max_steering_angle: f64,
}

impl Default for Bicycle {
    fn default() -> Self {
        Self {
            max_steering_angle: DEFAULT_MAX_STEERING_ANGLE,
        }
    }
}

impl Bicycle {
    pub fn new(max_steering_angle: f64) -> Result<Self> {
        if !(max_steering_angle.is_finite() && max_steering_angle > 0.0) {
            return Err(FilterError::InvalidConfig(format!(
                "max steering angle must be positive, got {max_steering_angle}"
            )));
        }
        Ok(Self { max_steering_angle })
    }
}

impl MotionModel for Bicycle {
    fn check(&self, pose: &Pose, control: &Control) -> Result<()> {
        if !(control.angle.abs() <= self.max_steering_angle) {
            return Err(FilterError::InvalidSteering {
                angle: control.angle,
                max: self.max_steering_angle,
            });
        }
        check_distance(control.distance)?;
        if pose.wheelbase.is_none() {
            return Err(FilterError::MissingWheelbase);
        }
        Ok(())
    }

    fn move_pose(
        &self,
        pose: &Pose,
        control: &Control,
        rng: &mut dyn NoiseSource,
    ) -> Result<Pose> {
        self.check(pose, control)?;
        let wheelbase = pose.wheelbase.ok_or(FilterError::MissingWheelbase)?;

        let steering = rng.gaussian(control.angle, pose.noise.turn);
        let distance = rng.gaussian(control.distance, pose.noise.motion);

        let theta = pose.orientation();
        let beta = steering.tan() * distance / wheelbase;

        let (x, y) = if beta.abs() >= STRAIGHT_LINE_TOLERANCE {
            let radius = distance / beta;
            // Center of the turning circle.
            let cx = pose.x - theta.sin() * radius;
            let cy = pose.y + theta.cos() * radius;
            (
                cx + (theta + beta).sin() * radius,
                cy - (theta + beta).cos() * radius,
            )
        } else {
            (
                pose.x + distance * theta.cos(),
                pose.y + distance * theta.sin(),
            )
        };

        Ok(pose.moved_to(x, y, theta + beta))
    }

    fn name(&self) -> &'static str {
        "bicycle"
    }
}
