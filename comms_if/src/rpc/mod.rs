//! # Remote Procedure Call Module
//!
//! Request/reply messaging between named ports. Requests and replies are [`Bottle`]s sent as JSON
//! text frames over zmq REQ/REP sockets, streamed data (such as hand poses) is sent as bottles over
//! PUB/SUB sockets.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod bottle;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use std::time::Duration;

use crate::net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions};

pub use bottle::{Bottle, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Vocab used to acknowledge a request.
pub const ACK: &str = "ack";

/// Vocab used to reject a request.
pub const NACK: &str = "nack";

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A request/reply channel to a remote port.
///
/// Every call blocks until the reply arrives or the channel's timeout elapses.
pub trait RpcChannel {
    /// Send `cmd` and wait for the reply.
    fn call(&mut self, cmd: &Bottle) -> Result<Bottle, RpcError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client side of an RPC port (zmq REQ).
pub struct RpcClient {
    local_name: String,
    remote_name: String,
    socket: MonitoredSocket,
}

/// Server side of an RPC port (zmq REP).
///
/// Each received request must be answered with [`RpcServer::send_reply`] before the next one is
/// received.
pub struct RpcServer {
    name: String,
    socket: MonitoredSocket,
}

/// Input port reading a stream of bottles (zmq SUB).
pub struct BottleReader {
    local_name: String,
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("The port is not connected to {0}")]
    NotConnected(String),

    #[error("Could not send the request: {0}")]
    SendError(zmq::Error),

    #[error("No reply was received from {0} before the timeout")]
    NoReply(String),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Received a message which was not valid UTF-8")]
    NonUtf8,

    #[error("Could not serialize the bottle: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the bottle: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RpcClient {
    /// Open a client port named `local_name` and connect it to `remote_name`, which lives at
    /// `endpoint`.
    ///
    /// Blocks until the connection is made or `connect_timeout` elapses. Every subsequent call
    /// waits at most `rpc_timeout` for a reply.
    pub fn connect(
        ctx: &zmq::Context,
        local_name: &str,
        remote_name: &str,
        endpoint: &str,
        connect_timeout: Duration,
        rpc_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let socket_options = SocketOptions {
            connect_timeout: duration_to_ms(connect_timeout),
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: duration_to_ms(rpc_timeout),
            send_timeout: 1000,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, endpoint)?;

        Ok(Self {
            local_name: local_name.into(),
            remote_name: remote_name.into(),
            socket,
        })
    }
}

impl RpcChannel for RpcClient {
    fn call(&mut self, cmd: &Bottle) -> Result<Bottle, RpcError> {
        // If not connected return now
        if !self.socket.connected() {
            return Err(RpcError::NotConnected(self.remote_name.clone()));
        }

        let cmd_str = cmd.to_json().map_err(RpcError::SerializationError)?;

        trace!("{} -> {}: {}", self.local_name, self.remote_name, cmd);

        self.socket
            .send(cmd_str.as_str(), 0)
            .map_err(RpcError::SendError)?;

        let reply = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(RpcError::NonUtf8),
            Err(zmq::Error::EAGAIN) => return Err(RpcError::NoReply(self.remote_name.clone())),
            Err(e) => return Err(RpcError::RecvError(e)),
        };

        let reply = Bottle::from_json(&reply).map_err(RpcError::DeserializeError)?;

        trace!("{} <- {}: {}", self.local_name, self.remote_name, reply);

        Ok(reply)
    }
}

impl RpcServer {
    /// Open a server port named `name` bound to `bind_endpoint`.
    ///
    /// `recv_timeout` bounds how long [`RpcServer::recv_request`] waits for a request.
    pub fn open(
        ctx: &zmq::Context,
        name: &str,
        bind_endpoint: &str,
        recv_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: duration_to_ms(recv_timeout),
            send_timeout: 1000,
            linger: 1,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REP, socket_options, bind_endpoint)?;

        Ok(Self {
            name: name.into(),
            socket,
        })
    }

    /// Name of this port.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receive a single request.
    ///
    /// Returns `Ok(None)` if no request arrived before the timeout. If a request arrives but cannot
    /// be parsed a `nack` reply is sent automatically and an error is returned.
    pub fn recv_request(&self) -> Result<Option<Bottle>, RpcError> {
        let req_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                self.send_reply(&nack("Non UTF-8 request"))?;
                return Err(RpcError::NonUtf8);
            }
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(RpcError::RecvError(e)),
        };

        match Bottle::from_json(&req_str) {
            Ok(b) => {
                trace!("{} <- {}", self.name, b);
                Ok(Some(b))
            }
            Err(e) => {
                warn!("{} received a malformed request: {}", self.name, e);
                self.send_reply(&nack("Malformed request"))?;
                Err(RpcError::DeserializeError(e))
            }
        }
    }

    /// Reply to the last received request.
    pub fn send_reply(&self, reply: &Bottle) -> Result<(), RpcError> {
        let reply_str = reply.to_json().map_err(RpcError::SerializationError)?;

        trace!("{} -> {}", self.name, reply);

        self.socket
            .send(reply_str.as_str(), 0)
            .map_err(RpcError::SendError)
    }
}

impl BottleReader {
    /// Open an input port named `local_name` and connect it to the stream at `endpoint`.
    ///
    /// [`BottleReader::read`] waits at most `read_timeout` for a message.
    pub fn connect(
        ctx: &zmq::Context,
        local_name: &str,
        endpoint: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let socket_options = SocketOptions {
            connect_timeout: duration_to_ms(connect_timeout),
            linger: 1,
            recv_timeout: duration_to_ms(read_timeout),
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)?;

        Ok(Self {
            local_name: local_name.into(),
            socket,
        })
    }

    /// Name of this port.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Read the next bottle, or `Ok(None)` if nothing arrived before the timeout.
    pub fn read(&self) -> Result<Option<Bottle>, RpcError> {
        let msg = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(RpcError::NonUtf8),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(RpcError::RecvError(e)),
        };

        Bottle::from_json(&msg)
            .map(Some)
            .map_err(RpcError::DeserializeError)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build an `[ack, message]` reply.
pub fn ack(message: &str) -> Bottle {
    Bottle::new().with_string(ACK).with_string(message)
}

/// Build a `[nack, message]` reply.
pub fn nack(message: &str) -> Bottle {
    Bottle::new().with_string(NACK).with_string(message)
}

/// Convert a duration into a zmq millisecond timeout, saturating at `i32::MAX`.
fn duration_to_ms(d: Duration) -> i32 {
    d.as_millis().min(i32::MAX as u128) as i32
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_ack_nack() {
        let a = ack("done");
        assert_eq!(a.get(0).and_then(Value::as_string), Some(ACK));
        assert_eq!(a.text(1), Some("done"));

        let n = nack("no");
        assert_eq!(n.text(0), Some(NACK));
    }

    /// Serve `n` requests on a server bound at `endpoint`, replying `[ack, <first text>]`, and
    /// return what `recv_request` gave for each.
    fn serve(
        ctx: &zmq::Context,
        endpoint: &str,
        n: usize,
    ) -> thread::JoinHandle<Vec<Result<Bottle, String>>> {
        let server = RpcServer::open(ctx, "/test/server", endpoint, Duration::from_millis(50))
            .unwrap();

        thread::spawn(move || {
            let mut received = Vec::new();

            while received.len() < n {
                match server.recv_request() {
                    Ok(Some(req)) => {
                        server
                            .send_reply(&ack(req.text(0).unwrap_or("")))
                            .unwrap();
                        received.push(Ok(req));
                    }
                    Ok(None) => continue,
                    Err(e) => received.push(Err(e.to_string())),
                }
            }

            // Leave time for the last reply to leave before the socket closes
            thread::sleep(Duration::from_millis(100));

            received
        })
    }

    #[test]
    fn test_rpc_round_trip() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47101";
        let server = serve(&ctx, endpoint, 3);

        // A request which is not a bottle is rejected by the server itself
        let raw = ctx.socket(zmq::REQ).unwrap();
        raw.set_linger(0).unwrap();
        raw.set_rcvtimeo(2000).unwrap();
        raw.connect(endpoint).unwrap();
        raw.send("{not a bottle", 0).unwrap();
        let reply = Bottle::from_json(&raw.recv_string(0).unwrap().unwrap()).unwrap();
        assert_eq!(reply, nack("Malformed request"));

        let mut client = RpcClient::connect(
            &ctx,
            "/test/client",
            "/test/server",
            endpoint,
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();

        let req = Bottle::new().with_vocab("get");
        assert_eq!(client.call(&req).unwrap(), ack("get"));

        let req = Bottle::new().with_string("grasp_it").with_float64(0.6);
        assert_eq!(client.call(&req).unwrap(), ack("grasp_it"));

        let received = server.join().unwrap();
        assert!(received[0].is_err());
        assert_eq!(received[1], Ok(Bottle::new().with_vocab("get")));
        assert_eq!(received[2], Ok(req));
    }

    #[test]
    fn test_rpc_no_reply() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47102";

        // Never receives, so never replies
        let _server =
            RpcServer::open(&ctx, "/test/server", endpoint, Duration::from_millis(50)).unwrap();

        let mut client = RpcClient::connect(
            &ctx,
            "/test/client",
            "/test/server",
            endpoint,
            Duration::from_secs(2),
            Duration::from_millis(200),
        )
        .unwrap();

        match client.call(&Bottle::new().with_vocab("get")) {
            Err(RpcError::NoReply(name)) => assert_eq!(name, "/test/server"),
            r => panic!("Unexpected result: {:?}", r),
        }
    }

    #[test]
    fn test_bottle_reader() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47103";

        let publisher = ctx.socket(zmq::PUB).unwrap();
        publisher.set_linger(0).unwrap();
        publisher.bind(endpoint).unwrap();

        let reader = BottleReader::connect(
            &ctx,
            "/test/hand/right:i",
            endpoint,
            Duration::from_secs(2),
            Duration::from_millis(50),
        )
        .unwrap();
        assert_eq!(reader.local_name(), "/test/hand/right:i");

        // Nothing published yet
        assert_eq!(reader.read().unwrap(), None);

        let pose = Bottle::new()
            .with_float64(-0.3)
            .with_float64(0.1)
            .with_float64(0.05);

        // The subscription may take a moment to reach the publisher
        let mut got = None;
        for _ in 0..40 {
            publisher.send(pose.to_json().unwrap().as_str(), 0).unwrap();
            got = reader.read().unwrap();
            if got.is_some() {
                break;
            }
        }
        assert_eq!(got, Some(pose));

        // Malformed stream data is an error, not a bottle
        publisher.send("[1, 2", 0).unwrap();
        let mut res = reader.read();
        for _ in 0..100 {
            match res {
                Ok(_) => res = reader.read(),
                Err(_) => break,
            }
        }
        assert!(matches!(res, Err(RpcError::DeserializeError(_))));
    }

    #[test]
    fn test_duration_to_ms() {
        assert_eq!(duration_to_ms(Duration::from_secs(240)), 240_000);
        assert_eq!(duration_to_ms(Duration::from_secs(u64::MAX)), i32::MAX);
    }
}
