//! # Equipment Interface
//!
//! This module defines the interface structures which will be sent to equipment servers/clients.
//! All equipment speaks JSON over request/reply sockets, one demand per request and one response
//! per reply.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cart;
pub mod gaze;
pub mod hand;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Identifies a controller configuration snapshot stored on the equipment side.
pub type ContextId = i32;

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// One of the robot's two hands (and the arm it is mounted on).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl HandSide {
    /// Both sides, right first.
    pub const ALL: [HandSide; 2] = [HandSide::Right, HandSide::Left];

    /// Select the hand on the same side as an object at lateral coordinate `y` (root frame).
    ///
    /// Positive `y` is the robot's right, zero or negative selects the left hand.
    pub fn from_lateral(y_m: f64) -> Self {
        if y_m > 0.0 {
            HandSide::Right
        } else {
            HandSide::Left
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }

    /// Name of the arm the hand is mounted on, as used in port names.
    pub fn arm_name(&self) -> &'static str {
        match self {
            HandSide::Left => "left_arm",
            HandSide::Right => "right_arm",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
