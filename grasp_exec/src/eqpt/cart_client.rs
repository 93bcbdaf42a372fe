//! # Cartesian Controller Client

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;

use comms_if::eqpt::{
    cart::{CartDems, CartPose, CartResponse},
    ContextId,
};

use super::{AxisAngle, CartesianControl, EqptClient, EqptError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client to the Cartesian controller of one arm.
pub struct CartClient {
    client: EqptClient,

    /// Period the controller uses to poll for motion completion.
    motion_poll_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CartClient {
    pub fn new(client: EqptClient, motion_poll_period_s: f64) -> Self {
        Self {
            client,
            motion_poll_period_s,
        }
    }

    fn request(&self, dems: CartDems) -> Result<CartResponse, EqptError> {
        match self.client.request(&dems)? {
            CartResponse::Failed(reason) => Err(EqptError::Failed(self.client.name().into(), reason)),
            r => Ok(r),
        }
    }

    fn request_done(&self, dems: CartDems) -> Result<(), EqptError> {
        match self.request(dems)? {
            CartResponse::Done => Ok(()),
            r => Err(self.unexpected(r)),
        }
    }

    fn unexpected(&self, resp: CartResponse) -> EqptError {
        EqptError::UnexpectedResponse(self.client.name().into(), format!("{:?}", resp))
    }
}

impl CartesianControl for CartClient {
    fn store_context(&mut self) -> Result<ContextId, EqptError> {
        match self.request(CartDems::StoreContext)? {
            CartResponse::Context(id) => Ok(id),
            r => Err(self.unexpected(r)),
        }
    }

    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError> {
        self.request_done(CartDems::RestoreContext(id))
    }

    fn set_dofs(&mut self, dofs: &[bool]) -> Result<Vec<bool>, EqptError> {
        match self.request(CartDems::SetDofs(dofs.to_vec()))? {
            CartResponse::Dofs(d) => Ok(d),
            r => Err(self.unexpected(r)),
        }
    }

    fn get_pose(&mut self) -> Result<(Vector3<f64>, AxisAngle), EqptError> {
        match self.request(CartDems::GetPose)? {
            CartResponse::Pose(p) => Ok((
                Vector3::from(p.position_m),
                AxisAngle::from_array(p.orientation_aa),
            )),
            r => Err(self.unexpected(r)),
        }
    }

    fn go_to_pose(
        &mut self,
        position_m: &Vector3<f64>,
        orientation: &AxisAngle,
    ) -> Result<(), EqptError> {
        self.request_done(CartDems::GoToPose(CartPose {
            position_m: [position_m.x, position_m.y, position_m.z],
            orientation_aa: orientation.to_array(),
        }))
    }

    fn wait_motion_done(&mut self) -> Result<(), EqptError> {
        self.request_done(CartDems::WaitMotionDone {
            period_s: self.motion_poll_period_s,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
