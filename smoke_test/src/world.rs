//! # World Client
//!
//! Queries and moves the ball in the simulated world.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector3;

use comms_if::rpc::{Bottle, RpcChannel, ACK};

use crate::{harness::HarnessError, scenario::WorldProtocol};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client of the world's ball RPC port.
pub struct WorldClient<C> {
    channel: C,
    protocol: WorldProtocol,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: RpcChannel> WorldClient<C> {
    pub fn new(channel: C, protocol: WorldProtocol) -> Self {
        Self { channel, protocol }
    }

    /// Get the ball position in the simulator world frame.
    pub fn get_ball_position(&mut self) -> Result<Vector3<f64>, HarnessError> {
        let (cmd, first) = match self.protocol {
            WorldProtocol::Plain => (Bottle::new().with_vocab("get"), 1),
            WorldProtocol::Addressed => (
                Bottle::new()
                    .with_vocab("world")
                    .with_vocab("get")
                    .with_vocab("ball"),
                0,
            ),
        };

        let reply = self.call(&cmd)?;

        if self.protocol == WorldProtocol::Plain && reply.text(0) != Some(ACK) {
            return Err(HarnessError::InvalidReply("world".into(), reply));
        }

        match (
            reply.float64(first),
            reply.float64(first + 1),
            reply.float64(first + 2),
        ) {
            (Some(x), Some(y), Some(z)) => Ok(Vector3::new(x, y, z)),
            _ => Err(HarnessError::InvalidReply("world".into(), reply)),
        }
    }

    /// Move the ball, given in the simulator world frame.
    ///
    /// Returns `Ok(false)` without sending anything if fewer than 3 coordinates are given, extra
    /// coordinates are ignored.
    pub fn set_ball_position(&mut self, pos: &[f64]) -> Result<bool, HarnessError> {
        if pos.len() < 3 {
            return Ok(false);
        }

        let cmd = match self.protocol {
            WorldProtocol::Plain => Bottle::new().with_vocab("set"),
            WorldProtocol::Addressed => Bottle::new()
                .with_vocab("world")
                .with_vocab("set")
                .with_vocab("ball"),
        }
        .with_float64(pos[0])
        .with_float64(pos[1])
        .with_float64(pos[2]);

        let reply = self.call(&cmd)?;

        if reply.text(0) != Some(ACK) {
            return Err(HarnessError::InvalidReply("world".into(), reply));
        }

        Ok(true)
    }

    fn call(&mut self, cmd: &Bottle) -> Result<Bottle, HarnessError> {
        debug!("world <- {}", cmd);

        let reply = self
            .channel
            .call(cmd)
            .map_err(|e| HarnessError::Communication("world".into(), e))?;

        debug!("world -> {}", reply);

        Ok(reply)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
