//! # Gaze Controller Client

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;

use comms_if::eqpt::{
    gaze::{GazeDems, GazeResponse},
    ContextId,
};

use super::{EqptClient, EqptError, GazeControl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client to the gaze controller.
pub struct GazeClient {
    client: EqptClient,

    /// Period the controller uses to poll for motion completion.
    motion_poll_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GazeClient {
    pub fn new(client: EqptClient, motion_poll_period_s: f64) -> Self {
        Self {
            client,
            motion_poll_period_s,
        }
    }

    fn request(&self, dems: GazeDems) -> Result<GazeResponse, EqptError> {
        match self.client.request(&dems)? {
            GazeResponse::Failed(reason) => {
                Err(EqptError::Failed(self.client.name().into(), reason))
            }
            r => Ok(r),
        }
    }

    fn request_done(&self, dems: GazeDems) -> Result<(), EqptError> {
        match self.request(dems)? {
            GazeResponse::Done => Ok(()),
            r => Err(EqptError::UnexpectedResponse(
                self.client.name().into(),
                format!("{:?}", r),
            )),
        }
    }
}

impl GazeControl for GazeClient {
    fn store_context(&mut self) -> Result<ContextId, EqptError> {
        match self.request(GazeDems::StoreContext)? {
            GazeResponse::Context(id) => Ok(id),
            r => Err(EqptError::UnexpectedResponse(
                self.client.name().into(),
                format!("{:?}", r),
            )),
        }
    }

    fn restore_context(&mut self, id: ContextId) -> Result<(), EqptError> {
        self.request_done(GazeDems::RestoreContext(id))
    }

    fn block_eyes(&mut self, vergence_deg: f64) -> Result<(), EqptError> {
        self.request_done(GazeDems::BlockEyes { vergence_deg })
    }

    fn set_tracking_mode(&mut self, tracking: bool) -> Result<(), EqptError> {
        self.request_done(GazeDems::SetTrackingMode(tracking))
    }

    fn look_at_fixation_point(&mut self, point_m: &Vector3<f64>) -> Result<(), EqptError> {
        self.request_done(GazeDems::LookAtFixationPoint([
            point_m.x, point_m.y, point_m.z,
        ]))
    }

    fn look_at_abs_angles(&mut self, angles_deg: [f64; 3]) -> Result<(), EqptError> {
        self.request_done(GazeDems::LookAtAbsAngles(angles_deg))
    }

    fn wait_motion_done(&mut self) -> Result<(), EqptError> {
        self.request_done(GazeDems::WaitMotionDone {
            period_s: self.motion_poll_period_s,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
