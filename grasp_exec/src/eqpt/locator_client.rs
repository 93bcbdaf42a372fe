//! # Object Locator Client
//!
//! Queries the object retriever service over RPC:
//!
//! | Request                    | Reply                        |
//! |----------------------------|------------------------------|
//! | `[get_location]`           | `[ack, x, y, z]` or `[nack]` |
//! | `[get_location, <hand>]`   | `[ack, x, y, z]` or `[nack]` |
//!
//! where `<hand>` is `left` or `right` and the location is expressed in the robot root frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector3;

use comms_if::rpc::{Bottle, RpcChannel, ACK, NACK};

use super::{EqptError, HandSide, ObjectLocator};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const GET_LOCATION: &str = "get_location";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// RPC client to the object retriever.
pub struct LocatorClient<C> {
    channel: C,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: RpcChannel> LocatorClient<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }
}

impl<C: RpcChannel> ObjectLocator for LocatorClient<C> {
    fn get_location(&mut self, hand: Option<HandSide>) -> Result<Option<Vector3<f64>>, EqptError> {
        let mut cmd = Bottle::new().with_vocab(GET_LOCATION);
        if let Some(h) = hand {
            cmd = cmd.with_vocab(h.as_str());
        }

        let reply = self.channel.call(&cmd)?;

        match reply.text(0) {
            Some(ACK) => match (reply.float64(1), reply.float64(2), reply.float64(3)) {
                (Some(x), Some(y), Some(z)) => Ok(Some(Vector3::new(x, y, z))),
                _ => Err(EqptError::UnexpectedResponse(
                    "object retriever".into(),
                    reply.to_string(),
                )),
            },
            Some(NACK) => {
                debug!("Object retriever could not find the object");
                Ok(None)
            }
            _ => Err(EqptError::UnexpectedResponse(
                "object retriever".into(),
                reply.to_string(),
            )),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
