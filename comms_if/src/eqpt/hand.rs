//! # Hand Equipment Commands
//!
//! Demands sent to the joint-level controller of an arm, used to actuate the hand's finger joints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands sent to a hand.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HandDems {
    /// Get the position limits of a joint.
    GetLimits {
        joint: usize,
    },

    /// Put the given joints in position control mode.
    SetPositionMode {
        joints: Vec<usize>,
    },

    /// Move a joint to the given position (degrees).
    PositionMove {
        joint: usize,
        ref_deg: f64,
    },

    /// Ask whether all the given joints reached their set-points.
    CheckMotionDone {
        joints: Vec<usize>,
    },
}

/// Responses from a hand.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HandResponse {
    /// The demand was executed.
    Done,

    /// Joint limits in degrees.
    Limits {
        min_deg: f64,
        max_deg: f64,
    },

    /// Whether the queried joints are done moving.
    MotionDone(bool),

    /// The demand could not be executed.
    Failed(String),
}
