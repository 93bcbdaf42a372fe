//! Grasp control module
//!
//! Orchestrates the devices to pick up an object in a single pass:
//!
//! ```text
//! Idle -> Locating -> HandSelected -> Reaching -> Shaping -> Approaching -> Grasping -> Lifting -> Done
//!            |
//!            +-> Aborted (object not found)
//! ```
//!
//! There is no retry or backtracking. A device failure at any stage is returned as an error and
//! ends the attempt.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod orientation;
mod params;
mod state;

#[cfg(test)]
pub(crate) mod fake;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eqpt::EqptError;

pub use orientation::compute_hand_orientation;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Vergence the eyes are locked at when looking down. The stereo localisation is calibrated in
/// this configuration only.
pub const LOOK_DOWN_VERGENCE_DEG: f64 = 5.0;

/// Absolute (azimuth, elevation, vergence) gaze angles used to look down at the table.
pub const LOOK_DOWN_ANGLES_DEG: [f64; 3] = [0.0, -60.0, 0.0];

/// Height of the approach via-point above the target.
pub const VIA_POINT_HEIGHT_M: f64 = 0.05;

/// Extra rotation of the hand about the root -y axis, keeps the thumb off the table.
pub const HAND_TILT_DEG: f64 = 30.0;

/// Degrees of freedom enabled while approaching: torso (pitch, roll, yaw) then the 7 arm joints.
/// Everything but the torso roll.
pub const APPROACH_DOFS: [bool; 10] = [
    true, false, true, true, true, true, true, true, true, true,
];

/// Hand joint abducting the fingers.
pub const ABDUCTION_JOINTS: [usize; 1] = [7];

/// Hand joint opposing the thumb.
pub const THUMB_JOINTS: [usize; 1] = [8];

/// Remaining finger joints.
pub const FINGER_JOINTS: [usize; 7] = [9, 10, 11, 12, 13, 14, 15];

/// Pre-grasp hand shape, applied in this order before moving the arm.
pub const PRE_GRASP_SHAPE: [(FingerGroup, f64); 3] = [
    (FingerGroup::Abduction, 0.7),
    (FingerGroup::Thumb, 1.0),
    (FingerGroup::Fingers, 0.0),
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// How far to close a set of finger joints, 0 is the joint minimum and 1 the joint maximum.
///
/// Values are clamped into `[0, 1]` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosureFraction(f64);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Named sets of hand joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerGroup {
    Abduction,
    Thumb,
    Fingers,
}

/// Result of a grasp attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraspOutcome {
    Success,
    ObjectNotFound,
}

/// Stage of the grasp pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraspState {
    Idle,
    /// Asking the locator where the object is.
    Locating,
    /// A hand has been chosen from the object's lateral position.
    HandSelected,
    /// Fixating the object, refining its location for the chosen hand and computing the hand
    /// orientation.
    Reaching,
    /// Putting the hand in the pre-grasp shape.
    Shaping,
    /// Moving the hand over and onto the object.
    Approaching,
    /// Closing the fingers.
    Grasping,
    /// Raising the hand.
    Lifting,
    Done,
    Aborted,
}

/// Possible errors that can occur during GraspCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum GraspCtrlError {
    #[error("Equipment error while looking down: {0}")]
    LookDownError(EqptError),

    #[error("Equipment error while {0:?}: {1}")]
    EqptError(GraspState, EqptError),

    #[error("Could not save the startup context of the {0}: {1}")]
    StoreContextError(String, EqptError),

    #[error("Could not restore the startup context of the {0}: {1}")]
    RestoreContextError(String, EqptError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ClosureFraction {
    /// Fully open.
    pub const OPEN: ClosureFraction = ClosureFraction(0.0);

    /// Fully closed.
    pub const CLOSED: ClosureFraction = ClosureFraction(1.0);

    pub fn new(closure: f64) -> Self {
        Self(util::maths::clamp(closure, 0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Joint set-point for this closure, interpolating linearly between the joint limits.
    pub fn joint_target(&self, min: f64, max: f64) -> f64 {
        util::maths::lin_map((0.0, 1.0), (min, max), self.0)
    }
}

impl Default for ClosureFraction {
    fn default() -> Self {
        Self::OPEN
    }
}

impl fmt::Display for ClosureFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl FingerGroup {
    /// The hand joints in this group.
    pub fn joints(&self) -> &'static [usize] {
        match self {
            FingerGroup::Abduction => &ABDUCTION_JOINTS,
            FingerGroup::Thumb => &THUMB_JOINTS,
            FingerGroup::Fingers => &FINGER_JOINTS,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
