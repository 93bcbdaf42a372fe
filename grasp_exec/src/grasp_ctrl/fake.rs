//! Recording fake devices used to test the grasp controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use std::{cell::RefCell, rc::Rc};

use crate::eqpt::{
    ArmDevices, AxisAngle, CartesianControl, Devices, EqptError, FingerControl, GazeControl,
    HandSide, ObjectLocator, Sides,
};
use comms_if::eqpt::ContextId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A call made on one of the fake devices.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CartStoreContext(HandSide),
    CartRestoreContext(HandSide, ContextId),
    SetDofs(HandSide, Vec<bool>),
    GetPose(HandSide),
    GoToPose(HandSide, Vector3<f64>, AxisAngle),
    CartWaitMotionDone(HandSide),

    GazeStoreContext,
    GazeRestoreContext(ContextId),
    BlockEyes(f64),
    SetTrackingMode(bool),
    LookAtFixationPoint(Vector3<f64>),
    LookAtAbsAngles([f64; 3]),
    GazeWaitMotionDone,

    GetLimits(HandSide, usize),
    SetPositionMode(HandSide, Vec<usize>),
    PositionMove(HandSide, usize, f64),
    CheckMotionDone(HandSide, Vec<usize>),

    GetLocation(Option<HandSide>),
}

/// Shared state of a set of fake devices.
#[derive(Clone, Default)]
pub struct FakeState(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,

    /// Object location returned for each hand hint.
    locations: Vec<(Option<HandSide>, Vector3<f64>)>,

    /// Current end-effector pose of each arm.
    positions: Sides<Vector3<f64>>,
    orientations: Sides<AxisAngle>,

    /// Name of the demand that fails.
    fail_on: Option<&'static str>,

    /// Number of `check_motion_done` calls answered `false` before each `true`.
    checks_before_done: usize,
    pending_checks: usize,
}

struct FakeCart {
    side: HandSide,
    state: FakeState,
}

struct FakeGaze {
    state: FakeState,
}

struct FakeHand {
    side: HandSide,
    state: FakeState,
}

struct FakeLocator {
    state: FakeState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Call {
    /// Side of the arm or hand device the call was made on, `None` for the gaze and the locator.
    pub fn side(&self) -> Option<HandSide> {
        match self {
            Call::CartStoreContext(s)
            | Call::CartRestoreContext(s, _)
            | Call::SetDofs(s, _)
            | Call::GetPose(s)
            | Call::GoToPose(s, _, _)
            | Call::CartWaitMotionDone(s)
            | Call::GetLimits(s, _)
            | Call::SetPositionMode(s, _)
            | Call::PositionMove(s, _, _)
            | Call::CheckMotionDone(s, _) => Some(*s),
            _ => None,
        }
    }
}

impl FakeState {
    pub const GAZE_CONTEXT: ContextId = 20;

    pub fn new() -> Self {
        Self::default()
    }

    /// Context id returned by the Cartesian controller of the given arm.
    pub fn cart_context(side: HandSide) -> ContextId {
        match side {
            HandSide::Left => 10,
            HandSide::Right => 11,
        }
    }

    /// Limits of every fake finger joint.
    pub fn joint_limits(joint: usize) -> (f64, f64) {
        (joint as f64, 10.0 * joint as f64 + 20.0)
    }

    /// Build a device set sharing this state.
    pub fn devices(&self) -> Devices {
        let arm = |side| ArmDevices {
            cart: Box::new(FakeCart {
                side,
                state: self.clone(),
            }),
            hand: Box::new(FakeHand {
                side,
                state: self.clone(),
            }),
        };

        Devices {
            arms: Sides {
                left: arm(HandSide::Left),
                right: arm(HandSide::Right),
            },
            gaze: Box::new(FakeGaze {
                state: self.clone(),
            }),
            locator: Box::new(FakeLocator {
                state: self.clone(),
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    /// Make the locator see the object at `x` when given the `hand` hint.
    pub fn set_location(&self, hand: Option<HandSide>, x: Vector3<f64>) {
        self.0.borrow_mut().locations.push((hand, x));
    }

    /// Make every demand with the given name fail.
    pub fn fail_on(&self, demand: &'static str) {
        self.0.borrow_mut().fail_on = Some(demand);
    }

    pub fn set_motion_checks_before_done(&self, n: usize) {
        let mut inner = self.0.borrow_mut();
        inner.checks_before_done = n;
        inner.pending_checks = n;
    }

    /// Record the call, then fail if `demand` was set to fail.
    fn record(&self, demand: &str, call: Call) -> Result<(), EqptError> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push(call);

        match inner.fail_on {
            Some(d) if d == demand => Err(EqptError::Failed("fake".into(), demand.into())),
            _ => Ok(()),
        }
    }
}

impl CartesianControl for FakeCart {
    fn store_context(&mut self) -> Result<ContextId, EqptError> {
        self.state
            .record("cart_store_context", Call::CartStoreContext(self.side))?;
        Ok(FakeState::cart_context(self.side))
    }

    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError> {
        self.state
            .record("cart_restore_context", Call::CartRestoreContext(self.side, id))
    }

    fn set_dofs(&mut self, dofs: &[bool]) -> Result<Vec<bool>, EqptError> {
        self.state
            .record("set_dofs", Call::SetDofs(self.side, dofs.to_vec()))?;
        Ok(dofs.to_vec())
    }

    fn get_pose(&mut self) -> Result<(Vector3<f64>, AxisAngle), EqptError> {
        self.state.record("get_pose", Call::GetPose(self.side))?;
        let inner = self.state.0.borrow();
        Ok((
            *inner.positions.get(self.side),
            *inner.orientations.get(self.side),
        ))
    }

    fn go_to_pose(
        &mut self,
        position_m: &Vector3<f64>,
        orientation: &AxisAngle,
    ) -> Result<(), EqptError> {
        self.state.record(
            "go_to_pose",
            Call::GoToPose(self.side, *position_m, *orientation),
        )?;
        let mut inner = self.state.0.borrow_mut();
        *inner.positions.get_mut(self.side) = *position_m;
        *inner.orientations.get_mut(self.side) = *orientation;
        Ok(())
    }

    fn wait_motion_done(&mut self) -> Result<(), EqptError> {
        self.state
            .record("cart_wait_motion_done", Call::CartWaitMotionDone(self.side))
    }
}

impl GazeControl for FakeGaze {
    fn store_context(&mut self) -> Result<ContextId, EqptError> {
        self.state
            .record("gaze_store_context", Call::GazeStoreContext)?;
        Ok(FakeState::GAZE_CONTEXT)
    }

    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError> {
        self.state
            .record("gaze_restore_context", Call::GazeRestoreContext(id))
    }

    fn block_eyes(&mut self, vergence_deg: f64) -> Result<(), EqptError> {
        self.state.record("block_eyes", Call::BlockEyes(vergence_deg))
    }

    fn set_tracking_mode(&mut self, tracking: bool) -> Result<(), EqptError> {
        self.state
            .record("set_tracking_mode", Call::SetTrackingMode(tracking))
    }

    fn look_at_fixation_point(&mut self, point_m: &Vector3<f64>) -> Result<(), EqptError> {
        self.state
            .record("look_at_fixation_point", Call::LookAtFixationPoint(*point_m))
    }

    fn look_at_abs_angles(&mut self, angles_deg: [f64; 3]) -> Result<(), EqptError> {
        self.state
            .record("look_at_abs_angles", Call::LookAtAbsAngles(angles_deg))
    }

    fn wait_motion_done(&mut self) -> Result<(), EqptError> {
        self.state
            .record("gaze_wait_motion_done", Call::GazeWaitMotionDone)
    }
}

impl FingerControl for FakeHand {
    fn get_limits(&mut self, joint: usize) -> Result<(f64, f64), EqptError> {
        self.state
            .record("get_limits", Call::GetLimits(self.side, joint))?;
        Ok(FakeState::joint_limits(joint))
    }

    fn set_position_mode(&mut self, joints: &[usize]) -> Result<(), EqptError> {
        self.state.record(
            "set_position_mode",
            Call::SetPositionMode(self.side, joints.to_vec()),
        )
    }

    fn position_move(&mut self, joint: usize, ref_deg: f64) -> Result<(), EqptError> {
        self.state
            .record("position_move", Call::PositionMove(self.side, joint, ref_deg))
    }

    fn check_motion_done(&mut self, joints: &[usize]) -> Result<bool, EqptError> {
        self.state.record(
            "check_motion_done",
            Call::CheckMotionDone(self.side, joints.to_vec()),
        )?;

        let mut inner = self.state.0.borrow_mut();
        if inner.pending_checks > 0 {
            inner.pending_checks -= 1;
            Ok(false)
        } else {
            inner.pending_checks = inner.checks_before_done;
            Ok(true)
        }
    }
}

impl ObjectLocator for FakeLocator {
    fn get_location(&mut self, hand: Option<HandSide>) -> Result<Option<Vector3<f64>>, EqptError> {
        self.state.record("get_location", Call::GetLocation(hand))?;

        Ok(self
            .state
            .0
            .borrow()
            .locations
            .iter()
            .find(|(h, _)| *h == hand)
            .map(|(_, x)| *x))
    }
}
