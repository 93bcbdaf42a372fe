//! # Equipment Client
//!
//! Request/reply client shared by all device clients. Demands are serialized to JSON, sent to the
//! device server, and the response deserialized, following the same exchange as every other
//! equipment link.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, time::Duration};

use comms_if::net::{zmq, MonitoredSocket, SocketOptions};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Request/reply link to a single device.
pub struct EqptClient {
    name: String,
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EqptClient {
    /// Connect to the device `name` served at `endpoint`.
    ///
    /// `timeout` bounds both the connection and each response. Since blocking device demands (such
    /// as waiting for a motion to end) only reply once complete it must exceed the longest motion.
    pub fn connect(
        ctx: &zmq::Context,
        name: &str,
        endpoint: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, EqptError> {
        let socket_options = SocketOptions {
            connect_timeout: connect_timeout.as_millis().min(i32::MAX as u128) as i32,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: timeout.as_millis().min(i32::MAX as u128) as i32,
            send_timeout: 1000,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, endpoint)?;

        Ok(Self {
            name: name.into(),
            socket,
        })
    }

    /// Name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send demands to the device and wait for its response.
    pub fn request<D, R>(&self, dems: &D) -> Result<R, EqptError>
    where
        D: Serialize + Debug,
        R: DeserializeOwned + Debug,
    {
        // If not connected return now
        if !self.socket.connected() {
            return Err(EqptError::NotConnected(self.name.clone()));
        }

        trace!("{} <- {:?}", self.name, dems);

        // Serialize the demands
        let dems_str = serde_json::to_string(dems).map_err(EqptError::SerializationError)?;

        // Send the demands to the device
        self.socket
            .send(dems_str.as_str(), 0)
            .map_err(|e| EqptError::SendError(self.name.clone(), e))?;

        // Recieve response back from the device
        let resp = match self.socket.recv_msg(0) {
            Ok(m) => serde_json::from_str(m.as_str().unwrap_or(""))
                .map_err(|e| EqptError::DeserializeError(self.name.clone(), e))?,
            Err(zmq::Error::EAGAIN) => return Err(EqptError::NoResponse(self.name.clone())),
            Err(e) => return Err(EqptError::RecvError(self.name.clone(), e)),
        };

        trace!("{} -> {:?}", self.name, resp);

        Ok(resp)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Bind a device server at `endpoint` answering each demand with the next of `replies`, and
/// return the demands it received.
#[cfg(test)]
pub(crate) fn serve_scripted(
    ctx: &zmq::Context,
    endpoint: &str,
    replies: Vec<String>,
) -> std::thread::JoinHandle<Vec<String>> {
    let socket = ctx.socket(zmq::REP).unwrap();
    socket.set_rcvtimeo(5000).unwrap();
    socket.set_linger(100).unwrap();
    socket.bind(endpoint).unwrap();

    std::thread::spawn(move || {
        let mut dems = Vec::new();

        for reply in replies {
            match socket.recv_string(0) {
                Ok(Ok(d)) => dems.push(d),
                _ => break,
            }
            socket.send(reply.as_str(), 0).unwrap();
        }

        dems
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::cart::{CartDems, CartResponse};

    fn connect(ctx: &zmq::Context, endpoint: &str, timeout: Duration) -> EqptClient {
        EqptClient::connect(ctx, "/test/device", endpoint, Duration::from_secs(2), timeout)
            .unwrap()
    }

    #[test]
    fn test_request() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47111";
        let server = serve_scripted(
            &ctx,
            endpoint,
            vec![serde_json::to_string(&CartResponse::Context(7)).unwrap()],
        );
        let client = connect(&ctx, endpoint, Duration::from_secs(2));

        let resp: CartResponse = client.request(&CartDems::StoreContext).unwrap();
        assert_eq!(resp, CartResponse::Context(7));

        let dems = server.join().unwrap();
        assert_eq!(dems.len(), 1);
        assert_eq!(
            serde_json::from_str::<CartDems>(&dems[0]).unwrap(),
            CartDems::StoreContext
        );
    }

    #[test]
    fn test_malformed_response() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47112";
        let server = serve_scripted(&ctx, endpoint, vec!["not a response".into()]);
        let client = connect(&ctx, endpoint, Duration::from_secs(2));

        let res: Result<CartResponse, _> = client.request(&CartDems::GetPose);
        assert!(matches!(res, Err(EqptError::DeserializeError(ref n, _)) if n == "/test/device"));

        server.join().unwrap();
    }

    #[test]
    fn test_no_response() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47113";

        // Bound but never answering
        let silent = ctx.socket(zmq::REP).unwrap();
        silent.set_linger(0).unwrap();
        silent.bind(endpoint).unwrap();

        let client = connect(&ctx, endpoint, Duration::from_millis(200));

        let res: Result<CartResponse, _> = client.request(&CartDems::GetPose);
        assert!(matches!(res, Err(EqptError::NoResponse(_))));
    }
}
