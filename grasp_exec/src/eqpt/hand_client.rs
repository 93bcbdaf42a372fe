//! # Hand Client

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::hand::{HandDems, HandResponse};

use super::{EqptClient, EqptError, FingerControl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client to the joint controller of one arm, used for the finger joints.
pub struct HandClient {
    client: EqptClient,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HandClient {
    pub fn new(client: EqptClient) -> Self {
        Self { client }
    }

    fn request(&self, dems: HandDems) -> Result<HandResponse, EqptError> {
        match self.client.request(&dems)? {
            HandResponse::Failed(reason) => {
                Err(EqptError::Failed(self.client.name().into(), reason))
            }
            r => Ok(r),
        }
    }

    fn unexpected(&self, resp: HandResponse) -> EqptError {
        EqptError::UnexpectedResponse(self.client.name().into(), format!("{:?}", resp))
    }
}

impl FingerControl for HandClient {
    fn get_limits(&mut self, joint: usize) -> Result<(f64, f64), EqptError> {
        match self.request(HandDems::GetLimits { joint })? {
            HandResponse::Limits { min_deg, max_deg } => Ok((min_deg, max_deg)),
            r => Err(self.unexpected(r)),
        }
    }

    fn set_position_mode(&mut self, joints: &[usize]) -> Result<(), EqptError> {
        match self.request(HandDems::SetPositionMode {
            joints: joints.to_vec(),
        })? {
            HandResponse::Done => Ok(()),
            r => Err(self.unexpected(r)),
        }
    }

    fn position_move(&mut self, joint: usize, ref_deg: f64) -> Result<(), EqptError> {
        match self.request(HandDems::PositionMove { joint, ref_deg })? {
            HandResponse::Done => Ok(()),
            r => Err(self.unexpected(r)),
        }
    }

    fn check_motion_done(&mut self, joints: &[usize]) -> Result<bool, EqptError> {
        match self.request(HandDems::CheckMotionDone {
            joints: joints.to_vec(),
        })? {
            HandResponse::MotionDone(done) => Ok(done),
            r => Err(self.unexpected(r)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
