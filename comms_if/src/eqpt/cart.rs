//! # Cartesian Controller Equipment Commands
//!
//! Demands sent to a per-arm Cartesian controller, which moves the arm's end-effector to a target
//! pose in the robot root frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ContextId;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An end-effector pose in the robot root frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CartPose {
    /// Position in meters.
    pub position_m: [f64; 3],

    /// Orientation as an axis-angle, the first three elements are the unit axis and the last is the
    /// angle in radians.
    pub orientation_aa: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands sent to a Cartesian controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CartDems {
    /// Snapshot the controller's configuration, replying with its context ID.
    StoreContext,

    /// Restore a previously stored configuration.
    RestoreContext(ContextId),

    /// Enable (`true`) or disable (`false`) each degree of freedom of the chain, torso first.
    SetDofs(Vec<bool>),

    /// Get the current end-effector pose.
    GetPose,

    /// Move to the given pose, replying once the motion has been accepted.
    GoToPose(CartPose),

    /// Block until the current motion completes.
    WaitMotionDone {
        /// Polling period in seconds
        period_s: f64,
    },
}

/// Responses from a Cartesian controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CartResponse {
    /// The demand was executed.
    Done,

    /// The ID of the stored context.
    Context(ContextId),

    /// The resulting degrees of freedom after a `SetDofs`.
    Dofs(Vec<bool>),

    /// The current end-effector pose.
    Pose(CartPose),

    /// The demand could not be executed.
    Failed(String),
}
