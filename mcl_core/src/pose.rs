// mcl_core/src/pose.rs

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{FilterError, Result};
use crate::rng::NoiseSource;

/// Wraps `value` into `[lo, hi)` by modulo arithmetic (not clamping).
///
/// Values already inside the range are returned untouched.
pub fn wrap(value: f64, lo: f64, hi: f64) -> f64 {
    debug_assert!(hi > lo, "wrap: empty range [{lo}, {hi})");
    if value >= lo && value < hi {
        return value;
    }
    let span = hi - lo;
    let wrapped = value - ((value - lo) / span).floor() * span;
    // A tiny negative input can round up to exactly `hi`.
    if wrapped >= hi || wrapped < lo {
        lo
    } else {
        wrapped
    }
}

/// Normalizes a heading into `[0, 2π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    wrap(angle, 0.0, TAU)
}

/// A square world of side `size` with its origin at the corner.
///
/// The world itself has no edge rule: each motion model decides whether its
/// coordinates wrap around (`wrap_coordinate`) or may leave the square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub size: f64,
}

impl World {
    pub fn new(size: f64) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(FilterError::InvalidConfig(format!(
                "world size must be positive, got {size}"
            )));
        }
        Ok(Self { size })
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..self.size).contains(&x) && (0.0..self.size).contains(&y)
    }

    /// Wraps a coordinate onto the torus `[0, size)`.
    pub fn wrap_coordinate(&self, coordinate: f64) -> f64 {
        wrap(coordinate, 0.0, self.size)
    }
}

/// Standard deviations injected by motion and sensing.
///
/// `motion` is the forward (unicycle) or distance (bicycle) noise, `turn` the
/// turn or steering noise, and `sense` the range-measurement noise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseParams {
    #[serde(default)]
    pub motion: f64,
    #[serde(default)]
    pub turn: f64,
    #[serde(default)]
    pub sense: f64,
}

impl NoiseParams {
    pub fn new(motion: f64, turn: f64, sense: f64) -> Result<Self> {
        let params = Self {
            motion,
            turn,
            sense,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("motion", self.motion),
            ("turn", self.turn),
            ("sense", self.sense),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FilterError::InvalidNoise { name, value });
            }
        }
        Ok(())
    }
}

/// Position and heading of the robot or of one particle, plus the noise it
/// carries into every derived pose.
///
/// Poses are values: motion produces a new `Pose` and never edits the old one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    orientation: f64,
    pub noise: NoiseParams,
    /// Axle-to-axle distance; only the bicycle model reads it.
    pub wheelbase: Option<f64>,
}

impl Pose {
    /// A noiseless pose. The heading is wrapped into `[0, 2π)`.
    pub fn new(x: f64, y: f64, orientation: f64) -> Self {
        Self {
            x,
            y,
            orientation: wrap_angle(orientation),
            noise: NoiseParams::default(),
            wheelbase: None,
        }
    }

    /// Places a pose at an explicit location, which must lie inside `world`.
    pub fn place(x: f64, y: f64, orientation: f64, world: &World) -> Result<Self> {
        if !world.contains(x, y) {
            return Err(FilterError::OutOfBounds {
                x,
                y,
                size: world.size,
            });
        }
        Ok(Self::new(x, y, orientation))
    }

    /// Uniformly random position inside `world` and uniformly random heading.
    pub fn random(world: &World, rng: &mut dyn NoiseSource) -> Self {
        let x = rng.uniform() * world.size;
        let y = rng.uniform() * world.size;
        let orientation = rng.uniform() * TAU;
        Self::new(x, y, orientation)
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn with_noise(self, noise: NoiseParams) -> Self {
        Self { noise, ..self }
    }

    pub fn with_wheelbase(self, wheelbase: f64) -> Result<Self> {
        if !(wheelbase.is_finite() && wheelbase > 0.0) {
            return Err(FilterError::InvalidConfig(format!(
                "wheelbase must be positive, got {wheelbase}"
            )));
        }
        Ok(Self {
            wheelbase: Some(wheelbase),
            ..self
        })
    }

    /// A new pose at `(x, y, orientation)` that inherits this pose's noise and
    /// wheelbase.
    pub fn moved_to(&self, x: f64, y: f64, orientation: f64) -> Self {
        Self {
            x,
            y,
            orientation: wrap_angle(orientation),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::BoxMuller;
    use approx::assert_relative_eq;

    #[test]
    fn wrap_keeps_values_in_range() {
        let m = 100.0;
        for v in [-250.0, -100.0, -0.5, 0.0, 12.5, 99.999, 100.0, 100.5, 1e6, -1e-17] {
            let w = wrap(v, 0.0, m);
            assert!((0.0..m).contains(&w), "wrap({v}) = {w}");
        }
    }

    #[test]
    fn wrap_is_identity_inside_range() {
        for v in [0.0, 0.1, 42.0, 99.9] {
            assert_eq!(wrap(v, 0.0, 100.0), v);
        }
    }

    #[test]
    fn wrap_is_modulo_not_clamp() {
        assert_relative_eq!(wrap(105.0, 0.0, 100.0), 5.0);
        assert_relative_eq!(wrap(-5.0, 0.0, 100.0), 95.0);
        assert_relative_eq!(wrap(7.0, 2.0, 4.0), 3.0);
        assert_relative_eq!(wrap_angle(-std::f64::consts::FRAC_PI_2), 1.5 * std::f64::consts::PI);
    }

    #[test]
    fn place_rejects_positions_outside_the_world() {
        let world = World::new(100.0).unwrap();
        assert!(Pose::place(10.0, 20.0, 0.0, &world).is_ok());
        assert_eq!(
            Pose::place(100.0, 20.0, 0.0, &world),
            Err(FilterError::OutOfBounds {
                x: 100.0,
                y: 20.0,
                size: 100.0
            })
        );
        assert!(Pose::place(-0.1, 20.0, 0.0, &world).is_err());
    }

    #[test]
    fn random_poses_fall_inside_the_world() {
        let world = World::new(50.0).unwrap();
        let mut rng = BoxMuller::seeded(9);
        for _ in 0..1000 {
            let pose = Pose::random(&world, &mut rng);
            assert!(world.contains(pose.x, pose.y));
            assert!((0.0..TAU).contains(&pose.orientation()));
        }
    }

    #[test]
    fn noise_params_reject_negative_values() {
        assert!(NoiseParams::new(0.05, 0.05, 5.0).is_ok());
        assert_eq!(
            NoiseParams::new(0.05, -1.0, 5.0),
            Err(FilterError::InvalidNoise {
                name: "turn",
                value: -1.0
            })
        );
        assert!(NoiseParams::new(f64::INFINITY, 0.0, 0.0).is_err());
    }

    #[test]
    fn moved_to_inherits_noise_and_wheelbase() {
        let noise = NoiseParams::new(1.0, 2.0, 3.0).unwrap();
        let pose = Pose::new(1.0, 2.0, 0.5)
            .with_noise(noise)
            .with_wheelbase(20.0)
            .unwrap();
        let next = pose.moved_to(4.0, 5.0, 7.0);
        assert_eq!(next.noise, noise);
        assert_eq!(next.wheelbase, Some(20.0));
        assert_relative_eq!(next.orientation(), 7.0 - TAU);
    }

    #[test]
    fn world_rejects_non_positive_size() {
        assert!(World::new(0.0).is_err());
        assert!(World::new(-3.0).is_err());
        assert!(World::new(f64::NAN).is_err());
    }
}
