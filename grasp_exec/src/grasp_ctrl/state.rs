//! Implementations for the GraspCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::thread;

// Internal
use super::{
    compute_hand_orientation, ClosureFraction, FingerGroup, GraspCtrlError, GraspOutcome,
    GraspState, Params, APPROACH_DOFS, LOOK_DOWN_ANGLES_DEG, LOOK_DOWN_VERGENCE_DEG,
    PRE_GRASP_SHAPE, VIA_POINT_HEIGHT_M,
};
use crate::eqpt::{AxisAngle, Devices, EqptError, HandSide, Sides};
use comms_if::eqpt::ContextId;
use util::time::secs_to_duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Grasp control module state.
///
/// Owns every device for its whole lifetime, along with the device contexts found at startup which
/// are restored on [`GraspCtrl::close`].
pub struct GraspCtrl {
    params: Params,

    devices: Devices,

    arm_contexts: Sides<ContextId>,
    gaze_context: ContextId,

    state: GraspState,

    /// Hand chosen for the current (or last) grasp attempt.
    hand: Option<HandSide>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GraspCtrl {
    /// Create the controller, saving the current context of both Cartesian controllers and of the
    /// gaze controller.
    pub fn new(params: Params, mut devices: Devices) -> Result<Self, GraspCtrlError> {
        let mut arm_contexts = Sides { left: 0, right: 0 };

        for &side in &HandSide::ALL {
            *arm_contexts.get_mut(side) = devices
                .arms
                .get_mut(side)
                .cart
                .store_context()
                .map_err(|e| GraspCtrlError::StoreContextError(side.arm_name().into(), e))?;
        }

        let gaze_context = devices
            .gaze
            .store_context()
            .map_err(|e| GraspCtrlError::StoreContextError("gaze".into(), e))?;

        debug!(
            "Startup contexts: right arm {}, left arm {}, gaze {}",
            arm_contexts.right, arm_contexts.left, gaze_context
        );

        Ok(Self {
            params,
            devices,
            arm_contexts,
            gaze_context,
            state: GraspState::Idle,
            hand: None,
        })
    }

    /// Current stage of the grasp pipeline.
    pub fn state(&self) -> GraspState {
        self.state
    }

    /// Hand selected during the last grasp attempt, if one got that far.
    pub fn selected_hand(&self) -> Option<HandSide> {
        self.hand
    }

    /// Look down at the table.
    ///
    /// The vergence is locked at [`LOOK_DOWN_VERGENCE_DEG`] and is never unlocked afterwards, since
    /// the object locator is only calibrated in this configuration. Blocks until the gaze motion is
    /// over.
    pub fn look_down(&mut self) -> Result<(), GraspCtrlError> {
        let gaze = &mut self.devices.gaze;

        gaze.block_eyes(LOOK_DOWN_VERGENCE_DEG)
            .and_then(|_| gaze.look_at_abs_angles(LOOK_DOWN_ANGLES_DEG))
            .and_then(|_| gaze.wait_motion_done())
            .map_err(GraspCtrlError::LookDownError)?;

        info!("Looking down");

        Ok(())
    }

    /// Locate the object, grasp it with the nearest hand and lift it.
    ///
    /// `ObjectNotFound` is returned, and the attempt aborted, if the locator cannot see the object
    /// either before or after the gaze fixation. Nothing is retried: the first device error ends the
    /// attempt and is returned.
    pub fn grasp_it(&mut self, closure: ClosureFraction) -> Result<GraspOutcome, GraspCtrlError> {
        self.hand = None;

        // ---- LOCATE ----

        self.enter(GraspState::Locating);

        let x = match self.locate(None)? {
            Some(x) => x,
            None => return Ok(self.abort()),
        };
        info!("Retrieved 3D location = {}", fmt_point(&x));

        // ---- SELECT HAND ----

        let side = HandSide::from_lateral(x.y);
        self.hand = Some(side);
        self.enter(GraspState::HandSelected);
        info!("Selected hand = {}", side);

        // ---- REACH ----

        self.enter(GraspState::Reaching);

        self.fixate(&x).map_err(|e| self.fail(e))?;
        info!("Fixating at {}", fmt_point(&x));

        let x = match self.locate(Some(side))? {
            Some(x) => x,
            None => return Ok(self.abort()),
        };
        info!("Refined 3D location = {}", fmt_point(&x));

        let o = compute_hand_orientation(side);
        info!("Computed orientation = {}", fmt_axis_angle(&o));

        // ---- SHAPE ----

        self.enter(GraspState::Shaping);

        for &(group, shape) in &PRE_GRASP_SHAPE {
            self.move_fingers(side, group, ClosureFraction::new(shape))
                .map_err(|e| self.fail(e))?;
        }
        info!("Prepared hand");

        // ---- APPROACH ----

        self.enter(GraspState::Approaching);

        self.approach(side, &x, &o).map_err(|e| self.fail(e))?;
        info!("Approached object");

        // ---- GRASP ----

        self.enter(GraspState::Grasping);

        self.move_fingers(side, FingerGroup::Fingers, closure)
            .map_err(|e| self.fail(e))?;
        info!("Grasped (closure {})", closure);

        // ---- LIFT ----

        self.enter(GraspState::Lifting);

        self.lift(side).map_err(|e| self.fail(e))?;
        info!("Lifted");

        self.enter(GraspState::Done);

        Ok(GraspOutcome::Success)
    }

    /// Restore the startup contexts and release the devices.
    ///
    /// Every context is restored even if one of them fails, the first failure is returned.
    pub fn close(self) -> Result<(), GraspCtrlError> {
        let GraspCtrl {
            mut devices,
            arm_contexts,
            gaze_context,
            ..
        } = self;

        let mut result = Ok(());

        for &side in &HandSide::ALL {
            if let Err(e) = devices
                .arms
                .get_mut(side)
                .cart
                .restore_context(*arm_contexts.get(side))
            {
                warn!("Could not restore the {} context: {}", side.arm_name(), e);
                if result.is_ok() {
                    result = Err(GraspCtrlError::RestoreContextError(
                        side.arm_name().into(),
                        e,
                    ));
                }
            }
        }

        if let Err(e) = devices.gaze.restore_context(gaze_context) {
            warn!("Could not restore the gaze context: {}", e);
            if result.is_ok() {
                result = Err(GraspCtrlError::RestoreContextError("gaze".into(), e));
            }
        }

        info!("Device contexts restored");

        result
    }

    // ---- STAGES ----

    fn locate(&mut self, hand: Option<HandSide>) -> Result<Option<Vector3<f64>>, GraspCtrlError> {
        self.devices
            .locator
            .get_location(hand)
            .map_err(|e| self.fail(e))
    }

    /// Hold the gaze on `x`.
    fn fixate(&mut self, x: &Vector3<f64>) -> Result<(), EqptError> {
        let gaze = &mut self.devices.gaze;

        gaze.set_tracking_mode(true)?;
        gaze.look_at_fixation_point(x)?;
        gaze.wait_motion_done()
    }

    /// Move the hand onto `x` with orientation `o`, passing through a point just above it.
    fn approach(&mut self, side: HandSide, x: &Vector3<f64>, o: &AxisAngle) -> Result<(), EqptError> {
        let cart = &mut self.devices.arms.get_mut(side).cart;

        let dofs = cart.set_dofs(&APPROACH_DOFS)?;
        debug!("{} DOFs: {:?}", side.arm_name(), dofs);

        let via = x + Vector3::z() * VIA_POINT_HEIGHT_M;

        cart.go_to_pose(&via, o)?;
        cart.wait_motion_done()?;
        debug!("Reached via-point {}", fmt_point(&via));

        cart.go_to_pose(x, o)?;
        cart.wait_motion_done()
    }

    /// Raise the hand from its current pose, holding its orientation.
    fn lift(&mut self, side: HandSide) -> Result<(), EqptError> {
        let cart = &mut self.devices.arms.get_mut(side).cart;

        let (mut x, o) = cart.get_pose()?;
        x.z += self.params.lift_height_m;

        cart.go_to_pose(&x, &o)?;
        cart.wait_motion_done()
    }

    /// Move the joints of `group` to `closure` and wait for them to get there.
    fn move_fingers(
        &mut self,
        side: HandSide,
        group: FingerGroup,
        closure: ClosureFraction,
    ) -> Result<(), EqptError> {
        let hand = &mut self.devices.arms.get_mut(side).hand;
        let joints = group.joints();

        hand.set_position_mode(joints)?;

        for &j in joints {
            let (min, max) = hand.get_limits(j)?;
            hand.position_move(j, closure.joint_target(min, max))?;
        }

        let poll_period = secs_to_duration(self.params.finger_poll_period_s);
        while !hand.check_motion_done(joints)? {
            thread::sleep(poll_period);
        }

        debug!("{:?} of the {} hand at closure {}", group, side, closure);

        Ok(())
    }

    // ---- STATE ----

    fn enter(&mut self, state: GraspState) {
        debug!("GraspCtrl: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn abort(&mut self) -> GraspOutcome {
        warn!("Object not found while {:?}, aborting", self.state);
        self.enter(GraspState::Aborted);
        GraspOutcome::ObjectNotFound
    }

    fn fail(&mut self, e: EqptError) -> GraspCtrlError {
        let stage = self.state;
        self.enter(GraspState::Aborted);
        GraspCtrlError::EqptError(stage, e)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn fmt_point(x: &Vector3<f64>) -> String {
    format!("({:.3} {:.3} {:.3})", x.x, x.y, x.z)
}

fn fmt_axis_angle(o: &AxisAngle) -> String {
    format!(
        "({:.3} {:.3} {:.3} {:.3})",
        o.axis.x, o.axis.y, o.axis.z, o.angle_rad
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
