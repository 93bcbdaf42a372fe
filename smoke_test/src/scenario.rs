//! # Test Scenarios
//!
//! A scenario fixes everything that differs between the two known versions of the grasp test:
//!
//! | Variant | World protocol              | Perturbation (x, y, z)               | Proximity | Lift check                 |
//! |---------|-----------------------------|--------------------------------------|-----------|----------------------------|
//! | A       | `[get]`, `[set x y z]`      | [-0.02, 0], [-0.05, 0.05], 0         | 0.10 m    | height gain >= 0.02 m      |
//! | B       | `[world get ball]`, ...     | [0, 0.4], 0, [-0.02, 0.02]           | 0.15 m    | displacement > 0.01 m      |
//!
//! A run uses exactly one scenario.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of one test scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub variant: ScenarioVariant,

    /// Message shapes used to talk to the world.
    pub world_protocol: WorldProtocol,

    /// Per-axis `(min, max)` bounds of the random offset added to the initial ball position.
    ///
    /// Units: meters
    pub perturbation_m: [(f64, f64); 3],

    /// Transform from the simulator world frame to the robot root frame.
    pub world_to_root: FrameTransform,

    /// Distance below which a hand is considered to have reached the ball.
    ///
    /// Units: meters
    pub proximity_threshold_m: f64,

    pub lift_check: LiftCheck,
}

/// Rigid transform `p_root = rotation * p_world + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioVariant {
    A,
    B,
}

/// Shape of the messages exchanged with the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldProtocol {
    /// `[get]` replied with `[ack x y z]`, `[set x y z]` replied with `[ack]`.
    Plain,

    /// `[world get ball]` replied with `[x y z]`, `[world set ball x y z]` replied with `[ack]`.
    Addressed,
}

/// Evidence that the ball has been lifted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiftCheck {
    /// The final height exceeds the initial one by at least `min_m`.
    HeightGain { min_m: f64 },

    /// The ball moved by more than `min_m` overall.
    Displacement { min_m: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Scenario {
    /// The preset for a variant.
    pub fn preset(variant: ScenarioVariant) -> Self {
        match variant {
            ScenarioVariant::A => Self {
                variant,
                world_protocol: WorldProtocol::Plain,
                perturbation_m: [(-0.02, 0.0), (-0.05, 0.05), (0.0, 0.0)],
                world_to_root: FrameTransform {
                    rotation: Matrix3::identity(),
                    translation: Vector3::new(0.0, 0.0, -0.63),
                },
                proximity_threshold_m: 0.10,
                lift_check: LiftCheck::HeightGain { min_m: 0.02 },
            },
            ScenarioVariant::B => Self {
                variant,
                world_protocol: WorldProtocol::Addressed,
                perturbation_m: [(0.0, 0.4), (0.0, 0.0), (-0.02, 0.02)],
                world_to_root: FrameTransform {
                    rotation: Matrix3::new(
                        0.0, 0.0, -1.0, //
                        -1.0, 0.0, 0.0, //
                        0.0, 1.0, 0.0,
                    ),
                    translation: Vector3::new(-0.026, 0.0, -0.5976),
                },
                proximity_threshold_m: 0.15,
                lift_check: LiftCheck::Displacement { min_m: 0.01 },
            },
        }
    }

    /// Add a random offset, uniform within [`Scenario::perturbation_m`], to `pos`.
    pub fn perturb<R: Rng>(&self, pos: &Vector3<f64>, rng: &mut R) -> Vector3<f64> {
        let mut offset = Vector3::zeros();

        for (i, &(min, max)) in self.perturbation_m.iter().enumerate() {
            offset[i] = if max > min {
                rng.gen_range(min..=max)
            } else {
                min
            };
        }

        pos + offset
    }
}

impl FrameTransform {
    pub fn apply(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }
}

impl LiftCheck {
    /// Evaluate the check, returning whether it passed and the measured lift.
    pub fn evaluate(&self, initial: &Vector3<f64>, last: &Vector3<f64>) -> (bool, f64) {
        match *self {
            LiftCheck::HeightGain { min_m } => {
                let d = last.z - initial.z;
                (d >= min_m, d)
            }
            LiftCheck::Displacement { min_m } => {
                let d = (last - initial).norm();
                (d > min_m, d)
            }
        }
    }

    /// Description of the check for the report.
    pub fn describe(&self, measured_m: f64) -> String {
        match self {
            LiftCheck::HeightGain { min_m } => format!(
                "Ball has been lifted by {:.3} [m] (at least {} [m] required)",
                measured_m, min_m
            ),
            LiftCheck::Displacement { min_m } => format!(
                "Ball has been moved by {:.3} [m] (more than {} [m] required)",
                measured_m, min_m
            ),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
