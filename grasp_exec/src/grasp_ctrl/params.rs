//! Parameters structure for GraspCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Grasp control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- MOTION ----

    /// How far the hand is raised once the object is grasped.
    ///
    /// Units: meters
    pub lift_height_m: f64,

    // ---- TIMING ----

    /// Period between two checks that the finger joints have reached their set-points.
    ///
    /// Units: seconds
    pub finger_poll_period_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lift_height_m: 0.1,
            finger_poll_period_s: 0.1,
        }
    }
}
