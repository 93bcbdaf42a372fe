//! # Smoke Test Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use comms_if::eqpt::HandSide;

use crate::scenario::ScenarioVariant;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SmokeTestParams {
    /// Name of the test, used as the namespace of the test's own ports
    #[serde(default = "default_name")]
    pub name: String,

    /// Name of the robot (or simulator instance) under test
    #[serde(default = "default_robot")]
    pub robot: String,

    /// Scenario to run
    pub variant: ScenarioVariant,

    /// Maximum time to wait for a world or service reply
    ///
    /// Units: seconds
    #[serde(default = "default_rpc_timeout_s")]
    pub rpc_timeout_s: f64,

    /// Maximum time to wait for a port connection
    ///
    /// Units: seconds
    pub connect_timeout_s: f64,

    /// Delay after connecting the ports, and again before starting the run
    ///
    /// Units: seconds
    #[serde(default = "default_warmup_s")]
    pub warmup_s: f64,

    /// Maximum time a hand feedback listener waits for a pose before checking whether to stop
    ///
    /// Units: seconds
    pub feedback_poll_s: f64,

    /// Name of the world's ball port
    pub world_port: String,

    /// Name of the grasp service port
    pub service_port: String,

    /// Closure sent with `grasp_it`, none to use the service's default
    #[serde(default)]
    pub closure: Option<f64>,

    /// Seed of the perturbation, random if not given
    #[serde(default)]
    pub seed: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SmokeTestParams {
    /// Name of the test's port talking to the world.
    pub fn ball_port(&self) -> String {
        format!("/{}/ball:rpc", self.name)
    }

    /// Name of the test's port talking to the grasp service.
    pub fn gi_port(&self) -> String {
        format!("/{}/gi:rpc", self.name)
    }

    /// Name of the test's port receiving the feedback of a hand.
    pub fn hand_port(&self, side: HandSide) -> String {
        format!("/{}/hand/{}:i", self.name, side)
    }

    /// Name of the robot port streaming the pose of a hand.
    pub fn hand_state_port(&self, side: HandSide) -> String {
        format!(
            "/{}/cartesianController/{}/state:o",
            self.robot,
            side.arm_name()
        )
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_name() -> String {
    "TestAssignmentGraspIt".into()
}

fn default_robot() -> String {
    "icubSim".into()
}

fn default_rpc_timeout_s() -> f64 {
    240.0
}

fn default_warmup_s() -> f64 {
    5.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
