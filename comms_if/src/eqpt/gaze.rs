//! # Gaze Controller Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ContextId;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the gaze controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum GazeDems {
    /// Snapshot the controller's configuration, replying with its context ID.
    StoreContext,

    /// Restore a previously stored configuration.
    RestoreContext(ContextId),

    /// Lock the eyes vergence at the given angle.
    BlockEyes {
        vergence_deg: f64,
    },

    /// In tracking mode the controller keeps fixating the target after the motion is over.
    SetTrackingMode(bool),

    /// Look at a cartesian point in the root frame, replying once the motion has been accepted.
    LookAtFixationPoint([f64; 3]),

    /// Look at the given absolute (azimuth, elevation, vergence) angles in degrees, replying once
    /// the motion has been accepted.
    LookAtAbsAngles([f64; 3]),

    /// Block until the current motion completes.
    WaitMotionDone {
        /// Polling period in seconds
        period_s: f64,
    },
}

/// Responses from the gaze controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum GazeResponse {
    /// The demand was executed.
    Done,

    /// The ID of the stored context.
    Context(ContextId),

    /// The demand could not be executed.
    Failed(String),
}
