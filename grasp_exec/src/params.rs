//! # Grasp Executable Parameters
//!
//! This module provide parameters for the grasp executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::grasp_ctrl;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GraspExecParams {
    /// Name of the robot (or simulator instance) whose devices are used
    #[serde(default = "default_robot")]
    pub robot: String,

    /// Name of the service port
    #[serde(default = "default_service_port")]
    pub service_port: String,

    /// Name of the object retriever port
    pub locator_port: String,

    /// Maximum time to wait for a device connection
    ///
    /// Units: seconds
    pub device_connect_timeout_s: f64,

    /// Maximum time to wait for a device response, must exceed the longest motion
    ///
    /// Units: seconds
    pub device_timeout_s: f64,

    /// Time during which opening a Cartesian controller is retried
    ///
    /// Units: seconds
    pub cart_warmup_window_s: f64,

    /// Period between two attempts to open a Cartesian controller
    ///
    /// Units: seconds
    pub cart_warmup_retry_s: f64,

    /// Period between two checks that a device motion is over
    ///
    /// Units: seconds
    pub motion_poll_period_s: f64,

    /// Period between two checks for service requests
    ///
    /// Units: seconds
    pub svc_poll_period_s: f64,

    /// Grasp control parameters
    #[serde(default)]
    pub grasp_ctrl: grasp_ctrl::Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GraspExecParams {
    /// Name of the Cartesian controller port of an arm.
    pub fn cart_port(&self, arm: &str) -> String {
        format!("/{}/cartesianController/{}", self.robot, arm)
    }

    /// Name of the joint controller port of an arm, which drives the hand joints.
    pub fn joint_port(&self, arm: &str) -> String {
        format!("/{}/{}", self.robot, arm)
    }

    /// Name of the gaze controller port.
    pub fn gaze_port(&self) -> String {
        "/iKinGazeCtrl".into()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_robot() -> String {
    "icubSim".into()
}

fn default_service_port() -> String {
    "/service".into()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
