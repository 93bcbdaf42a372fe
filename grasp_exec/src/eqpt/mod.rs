//! # Equipment Module
//!
//! Capability interfaces of the devices driven by the grasp controller, and the network clients
//! which implement them. The grasp controller only ever sees the traits defined here:
//!
//! - [`CartesianControl`]: per-arm end-effector pose control
//! - [`GazeControl`]: head and eyes fixation control
//! - [`FingerControl`]: per-hand joint position control
//! - [`ObjectLocator`]: 3D localisation of the target object
//!
//! Devices are grouped per side in a [`Sides`] table so that the controller selects the arm and
//! hand to use by looking up the [`HandSide`] chosen for the current grasp.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cart_client;
mod client;
mod gaze_client;
mod hand_client;
mod locator_client;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use nalgebra::{Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::{
    thread,
    time::{Duration, Instant},
};

use comms_if::{
    eqpt::ContextId,
    net::MonitoredSocketError,
    rpc::RpcError,
};

pub use cart_client::CartClient;
pub use client::EqptClient;
pub use comms_if::eqpt::HandSide;
pub use gaze_client::GazeClient;
pub use hand_client::HandClient;
pub use locator_client::LocatorClient;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Cartesian control of one arm's end-effector, in the robot root frame.
pub trait CartesianControl {
    /// Snapshot the current controller configuration.
    fn store_context(&mut self) -> Result<ContextId, EqptError>;

    /// Restore a configuration snapshot.
    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError>;

    /// Enable or disable each degree of freedom of the chain (torso pitch, roll, yaw, then the arm
    /// joints), returning the resulting configuration.
    fn set_dofs(&mut self, dofs: &[bool]) -> Result<Vec<bool>, EqptError>;

    /// Current end-effector position and orientation.
    fn get_pose(&mut self) -> Result<(Vector3<f64>, AxisAngle), EqptError>;

    /// Start moving the end-effector to a pose.
    fn go_to_pose(&mut self, position_m: &Vector3<f64>, orientation: &AxisAngle)
        -> Result<(), EqptError>;

    /// Block until the current motion is over.
    fn wait_motion_done(&mut self) -> Result<(), EqptError>;
}

/// Gaze control of the head and eyes.
pub trait GazeControl {
    /// Snapshot the current controller configuration.
    fn store_context(&mut self) -> Result<ContextId, EqptError>;

    /// Restore a configuration snapshot.
    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError>;

    /// Lock the vergence of the eyes at the given angle.
    fn block_eyes(&mut self, vergence_deg: f64) -> Result<(), EqptError>;

    /// In tracking mode the fixation point is held once the motion is over.
    fn set_tracking_mode(&mut self, tracking: bool) -> Result<(), EqptError>;

    /// Start looking at a point in the root frame.
    fn look_at_fixation_point(&mut self, point_m: &Vector3<f64>) -> Result<(), EqptError>;

    /// Start looking at absolute (azimuth, elevation, vergence) angles in degrees.
    fn look_at_abs_angles(&mut self, angles_deg: [f64; 3]) -> Result<(), EqptError>;

    /// Block until the current motion is over.
    fn wait_motion_done(&mut self) -> Result<(), EqptError>;
}

/// Joint position control of the finger joints of one hand.
pub trait FingerControl {
    /// Minimum and maximum position of a joint, in degrees.
    fn get_limits(&mut self, joint: usize) -> Result<(f64, f64), EqptError>;

    /// Put the joints in position control mode.
    fn set_position_mode(&mut self, joints: &[usize]) -> Result<(), EqptError>;

    /// Command a joint set-point, in degrees.
    fn position_move(&mut self, joint: usize, ref_deg: f64) -> Result<(), EqptError>;

    /// Whether all the given joints have reached their set-points.
    fn check_motion_done(&mut self, joints: &[usize]) -> Result<bool, EqptError>;
}

/// Localisation of the target object.
pub trait ObjectLocator {
    /// Get the location of the object in the root frame.
    ///
    /// With a hand hint the location is corrected using the mapping specific to that hand.
    /// `Ok(None)` means the object could not be found.
    fn get_location(&mut self, hand: Option<HandSide>) -> Result<Option<Vector3<f64>>, EqptError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An orientation expressed as a unit axis and an angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAngle {
    pub axis: Vector3<f64>,
    pub angle_rad: f64,
}

/// A value for each side of the robot.
#[derive(Debug, Clone, Default)]
pub struct Sides<T> {
    pub left: T,
    pub right: T,
}

/// The devices mounted on one arm.
pub struct ArmDevices {
    pub cart: Box<dyn CartesianControl>,
    pub hand: Box<dyn FingerControl>,
}

/// All devices used by the grasp controller.
pub struct Devices {
    pub arms: Sides<ArmDevices>,
    pub gaze: Box<dyn GazeControl>,
    pub locator: Box<dyn ObjectLocator>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("RPC error: {0}")]
    RpcError(#[from] RpcError),

    #[error("{0} is not connected")]
    NotConnected(String),

    #[error("Could not send demands to {0}: {1}")]
    SendError(String, comms_if::net::zmq::Error),

    #[error("No response from {0} before the timeout")]
    NoResponse(String),

    #[error("Could not recieve a message from {0}: {1}")]
    RecvError(String, comms_if::net::zmq::Error),

    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from {0}: {1}")]
    DeserializeError(String, serde_json::Error),

    #[error("{0} could not execute the demand: {1}")]
    Failed(String, String),

    #[error("{0} sent an unexpected response: {1}")]
    UnexpectedResponse(String, String),

    #[error("Could not open {0} within {1:?}")]
    OpenTimeout(String, Duration),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AxisAngle {
    /// Axis-angle representation of a rotation. The identity is represented as a zero rotation
    /// about the z axis.
    pub fn from_rotation(rot: &Rotation3<f64>) -> Self {
        match rot.axis_angle() {
            Some((axis, angle_rad)) => Self {
                axis: axis.into_inner(),
                angle_rad,
            },
            None => Self::default(),
        }
    }

    /// Parse from the `[ax, ay, az, angle]` array used on the wire.
    pub fn from_array(aa: [f64; 4]) -> Self {
        Self {
            axis: Vector3::new(aa[0], aa[1], aa[2]),
            angle_rad: aa[3],
        }
    }

    /// The `[ax, ay, az, angle]` array used on the wire.
    pub fn to_array(&self) -> [f64; 4] {
        [self.axis.x, self.axis.y, self.axis.z, self.angle_rad]
    }

    /// Convert back into a rotation.
    pub fn to_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Unit::new_normalize(self.axis), self.angle_rad)
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self {
            axis: Vector3::z(),
            angle_rad: 0.0,
        }
    }
}

impl<T> Sides<T> {
    pub fn get(&self, side: HandSide) -> &T {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: HandSide) -> &mut T {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Repeatedly try to open a device until it succeeds or `window` elapses, waiting `retry_period`
/// between attempts.
///
/// Controllers may refuse connections for a while after they start (for example while the
/// Cartesian controller is not yet connected to its solver).
pub fn open_with_warmup<T, F>(
    name: &str,
    window: Duration,
    retry_period: Duration,
    mut open: F,
) -> Result<T, EqptError>
where
    F: FnMut() -> Result<T, EqptError>,
{
    let t0 = Instant::now();

    loop {
        match open() {
            Ok(d) => {
                debug!("Opened {} after {:.1} s", name, t0.elapsed().as_secs_f64());
                return Ok(d);
            }
            Err(e) => warn!("Could not open {} yet: {}", name, e),
        }

        if t0.elapsed() + retry_period >= window {
            return Err(EqptError::OpenTimeout(name.into(), window));
        }

        thread::sleep(retry_period);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
