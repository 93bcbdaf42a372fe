//! # Service Server
//!
//! RPC port through which external callers drive the grasp controller. Requests are processed one
//! at a time, each command running to completion before its reply is sent:
//!
//! | Request               | Reply                                   |
//! |-----------------------|-----------------------------------------|
//! | `[help]`              | `[many, "Available commands:", ...]`    |
//! | `[look_down]`         | `[ack, message]`                        |
//! | `[grasp_it]`          | `[ack, message]` or `[nack, message]`   |
//! | `[grasp_it, closure]` | as above                                |
//! | `[quit]`              | `[bye]`, then the server stops          |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use std::time::Duration;

use comms_if::{
    net::zmq,
    rpc::{ack, nack, Bottle, RpcError, RpcServer},
};

use crate::grasp_ctrl::{ClosureFraction, GraspCtrl, GraspCtrlError, GraspOutcome};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lines of the `help` reply, after the `many` vocab.
pub const HELP_LINES: [&str; 4] = [
    "Available commands:",
    "- look_down",
    "- grasp_it",
    "- quit",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Service server
pub struct SvcServer {
    server: RpcServer,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command received by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum SvcCommand {
    Help,
    LookDown,
    GraspIt(ClosureFraction),
    Quit,
    Unknown(String),
}

/// What the server does after replying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcAction {
    Continue,
    Stop,
}

#[derive(Debug, thiserror::Error)]
pub enum SvcServerError {
    #[error("Could not open the service port: {0}")]
    OpenError(RpcError),

    #[error("Could not recieve a request: {0}")]
    RecvError(RpcError),

    #[error("Could not send the reply: {0}")]
    ReplyError(RpcError),

    #[error("Grasp control error: {0}")]
    GraspCtrlError(#[from] GraspCtrlError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SvcCommand {
    /// Parse a request.
    ///
    /// A `grasp_it` closure which is missing or not a number defaults to fully open.
    pub fn parse(req: &Bottle) -> Self {
        match req.text(0) {
            Some("help") => SvcCommand::Help,
            Some("look_down") => SvcCommand::LookDown,
            Some("grasp_it") => {
                SvcCommand::GraspIt(ClosureFraction::new(req.float64(1).unwrap_or(0.0)))
            }
            Some("quit") => SvcCommand::Quit,
            Some(cmd) => SvcCommand::Unknown(cmd.into()),
            None => SvcCommand::Unknown(match req.get(0) {
                Some(v) => v.to_string(),
                None => String::new(),
            }),
        }
    }
}

impl SvcServer {
    /// Open the service port `name`, bound at `bind_endpoint`.
    ///
    /// The server checks for requests every `poll_period`.
    pub fn open(
        ctx: &zmq::Context,
        name: &str,
        bind_endpoint: &str,
        poll_period: Duration,
    ) -> Result<Self, SvcServerError> {
        let server = RpcServer::open(ctx, name, bind_endpoint, poll_period)
            .map_err(SvcServerError::OpenError)?;

        info!("Service port {} open at {}", name, bind_endpoint);

        Ok(Self { server })
    }

    /// Serve requests until `quit` is received.
    ///
    /// A grasp controller error is fatal: the failed request gets a `nack` carrying the error, then
    /// the error is returned.
    pub fn run(&mut self, ctrl: &mut GraspCtrl) -> Result<(), SvcServerError> {
        loop {
            let req = match self.server.recv_request() {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                // Already answered with a nack
                Err(RpcError::DeserializeError(_)) | Err(RpcError::NonUtf8) => continue,
                Err(e) => return Err(SvcServerError::RecvError(e)),
            };

            info!("Request: {}", req);

            match respond(&req, ctrl) {
                Ok((reply, action)) => {
                    self.server
                        .send_reply(&reply)
                        .map_err(SvcServerError::ReplyError)?;

                    if action == SvcAction::Stop {
                        info!("Quit requested");
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!("Could not process {}: {}", req, e);

                    if let Err(re) = self.server.send_reply(&nack(&e.to_string())) {
                        warn!("Could not send the error reply: {}", re);
                    }

                    return Err(SvcServerError::GraspCtrlError(e));
                }
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a single request on the controller and build its reply.
pub fn respond(req: &Bottle, ctrl: &mut GraspCtrl) -> Result<(Bottle, SvcAction), GraspCtrlError> {
    let reply = match SvcCommand::parse(req) {
        SvcCommand::Help => {
            let mut reply = Bottle::new().with_vocab("many");
            for line in HELP_LINES.iter() {
                reply = reply.with_string(line);
            }
            reply
        }
        SvcCommand::LookDown => {
            ctrl.look_down()?;
            ack("Yep! I'm looking down now!")
        }
        SvcCommand::GraspIt(closure) => match ctrl.grasp_it(closure)? {
            GraspOutcome::Success => ack("Yeah! I did it! Maybe..."),
            GraspOutcome::ObjectNotFound => nack("I don't see any object!"),
        },
        SvcCommand::Quit => return Ok((Bottle::new().with_vocab("bye"), SvcAction::Stop)),
        SvcCommand::Unknown(cmd) => nack(&format!("Unknown command: {}", cmd)),
    };

    Ok((reply, SvcAction::Continue))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::grasp_ctrl::{fake::FakeState, GraspState, Params};
    use crate::eqpt::HandSide;
    use comms_if::rpc::{RpcChannel, RpcClient, Value, NACK};
    use nalgebra::Vector3;

    fn ctrl(fake: &FakeState) -> GraspCtrl {
        let params = Params {
            lift_height_m: 0.1,
            finger_poll_period_s: 0.0,
        };
        GraspCtrl::new(params, fake.devices()).unwrap()
    }

    #[test]
    fn test_parse() {
        let b = |s: &str| Bottle::new().with_vocab(s);

        assert_eq!(SvcCommand::parse(&b("help")), SvcCommand::Help);
        assert_eq!(SvcCommand::parse(&b("look_down")), SvcCommand::LookDown);
        assert_eq!(SvcCommand::parse(&b("quit")), SvcCommand::Quit);
        assert_eq!(
            SvcCommand::parse(&b("grasp_it")),
            SvcCommand::GraspIt(ClosureFraction::OPEN)
        );
        assert_eq!(
            SvcCommand::parse(&b("grasp_it").with_float64(0.4)),
            SvcCommand::GraspIt(ClosureFraction::new(0.4))
        );
        assert_eq!(
            SvcCommand::parse(&b("grasp_it").with_int32(1)),
            SvcCommand::GraspIt(ClosureFraction::CLOSED)
        );
        assert_eq!(
            SvcCommand::parse(&b("grasp_it").with_float64(3.0)),
            SvcCommand::GraspIt(ClosureFraction::CLOSED)
        );
        assert_eq!(
            SvcCommand::parse(&b("grasp_it").with_string("tight")),
            SvcCommand::GraspIt(ClosureFraction::OPEN)
        );

        // Strings are accepted as well as vocabs
        assert_eq!(
            SvcCommand::parse(&Bottle::new().with_string("help")),
            SvcCommand::Help
        );

        assert_eq!(
            SvcCommand::parse(&b("dance")),
            SvcCommand::Unknown("dance".into())
        );
        assert_eq!(
            SvcCommand::parse(&Bottle::new()),
            SvcCommand::Unknown(String::new())
        );
    }

    #[test]
    fn test_help_is_fixed() {
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);
        let req = Bottle::new().with_vocab("help");

        let (first, action) = respond(&req, &mut ctrl).unwrap();
        let (second, _) = respond(&req, &mut ctrl).unwrap();

        assert_eq!(action, SvcAction::Continue);
        assert_eq!(first, second);
        assert_eq!(first.get(0), Some(&Value::Vocab("many".into())));
        assert_eq!(first.len(), 5);
        assert_eq!(first.text(1), Some("Available commands:"));
        assert_eq!(first.text(4), Some("- quit"));
    }

    #[test]
    fn test_look_down() {
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);

        let (reply, _) = respond(&Bottle::new().with_vocab("look_down"), &mut ctrl).unwrap();
        assert_eq!(reply, ack("Yep! I'm looking down now!"));
    }

    #[test]
    fn test_grasp_it() {
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);
        let req = Bottle::new().with_vocab("grasp_it").with_float64(0.5);

        // Nothing to see yet
        let (reply, _) = respond(&req, &mut ctrl).unwrap();
        assert_eq!(reply, nack("I don't see any object!"));
        assert_eq!(ctrl.state(), GraspState::Aborted);

        fake.set_location(None, Vector3::new(-0.3, -0.1, 0.0));
        fake.set_location(Some(crate::eqpt::HandSide::Left), Vector3::new(-0.3, -0.1, 0.0));

        let (reply, action) = respond(&req, &mut ctrl).unwrap();
        assert_eq!(reply, ack("Yeah! I did it! Maybe..."));
        assert_eq!(action, SvcAction::Continue);
        assert_eq!(ctrl.state(), GraspState::Done);
    }

    #[test]
    fn test_quit_and_unknown() {
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);

        let (reply, action) = respond(&Bottle::new().with_vocab("quit"), &mut ctrl).unwrap();
        assert_eq!(reply, Bottle::new().with_vocab("bye"));
        assert_eq!(action, SvcAction::Stop);

        let (reply, action) = respond(&Bottle::new().with_vocab("dance"), &mut ctrl).unwrap();
        assert_eq!(reply, nack("Unknown command: dance"));
        assert_eq!(action, SvcAction::Continue);
    }

    /// Send `cmds` to the service at `endpoint` from another thread. The first request is raw
    /// text which is not a bottle, its reply is returned first.
    fn drive(
        ctx: &zmq::Context,
        endpoint: &'static str,
        cmds: Vec<Bottle>,
    ) -> std::thread::JoinHandle<Vec<Bottle>> {
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let mut replies = Vec::new();

            let raw = ctx.socket(zmq::REQ).unwrap();
            raw.set_linger(0).unwrap();
            raw.set_rcvtimeo(5000).unwrap();
            raw.connect(endpoint).unwrap();
            raw.send("grasp_it 0.5", 0).unwrap();
            replies.push(Bottle::from_json(&raw.recv_string(0).unwrap().unwrap()).unwrap());

            let mut client = RpcClient::connect(
                &ctx,
                "/test/gi:rpc",
                "/service",
                endpoint,
                Duration::from_secs(2),
                Duration::from_secs(5),
            )
            .unwrap();

            for cmd in cmds.iter() {
                replies.push(client.call(cmd).unwrap());
            }

            replies
        })
    }

    #[test]
    fn test_run_until_quit() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47151";
        let fake = FakeState::new();
        fake.set_location(None, Vector3::new(-0.3, 0.1, 0.0));
        fake.set_location(Some(HandSide::Right), Vector3::new(-0.3, 0.1, 0.0));
        let mut ctrl = ctrl(&fake);

        let mut svc =
            SvcServer::open(&ctx, "/service", endpoint, Duration::from_millis(20)).unwrap();
        let client = drive(
            &ctx,
            endpoint,
            vec![
                Bottle::new().with_string("help"),
                Bottle::new().with_string("dance"),
                Bottle::new().with_string("grasp_it").with_float64(0.5),
                Bottle::new().with_string("quit"),
            ],
        );

        svc.run(&mut ctrl).unwrap();
        let replies = client.join().unwrap();

        assert_eq!(replies.len(), 5);
        assert_eq!(replies[0], nack("Malformed request"));
        assert_eq!(replies[1].text(0), Some("many"));
        assert_eq!(replies[1].len(), 1 + HELP_LINES.len());
        assert_eq!(replies[2], nack("Unknown command: dance"));
        assert_eq!(replies[3], ack("Yeah! I did it! Maybe..."));
        assert_eq!(replies[4], Bottle::new().with_vocab("bye"));
        assert_eq!(ctrl.state(), GraspState::Done);
    }

    #[test]
    fn test_run_stops_on_device_error() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:47152";
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);
        fake.fail_on("block_eyes");

        let mut svc =
            SvcServer::open(&ctx, "/service", endpoint, Duration::from_millis(20)).unwrap();
        let client = drive(&ctx, endpoint, vec![Bottle::new().with_string("look_down")]);

        let res = svc.run(&mut ctrl);
        let replies = client.join().unwrap();

        assert!(matches!(
            res,
            Err(SvcServerError::GraspCtrlError(GraspCtrlError::LookDownError(_)))
        ));

        // The caller is told why before the service stops
        assert_eq!(replies[1].text(0), Some(NACK));
        assert!(replies[1]
            .text(1)
            .map_or(false, |m| m.contains("looking down")));
    }

    #[test]
    fn test_device_error_propagates() {
        let fake = FakeState::new();
        let mut ctrl = ctrl(&fake);
        fake.fail_on("block_eyes");

        assert!(matches!(
            respond(&Bottle::new().with_vocab("look_down"), &mut ctrl),
            Err(GraspCtrlError::LookDownError(_))
        ));
    }
}
