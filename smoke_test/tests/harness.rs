//! Full harness runs against in-memory world, grasp service and hand feedback.

use nalgebra::Vector3;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    sync::{
        mpsc::{channel, Sender},
        Arc, Mutex,
    },
    time::Duration,
};

use comms_if::rpc::{ack, nack, Bottle, RpcChannel, RpcError};
use smoke_lib::{
    harness::{run_test, HarnessOptions, HarnessPorts},
    proximity::{ChannelPoseSource, PoseSource},
    report::TestReport,
    scenario::{FrameTransform, Scenario, ScenarioVariant},
};

// ------------------------------------------------------------------------------------------------
// FAKES
// ------------------------------------------------------------------------------------------------

/// Simulated world holding the ball position, speaking either protocol.
struct FakeWorld {
    ball: Arc<Mutex<Vector3<f64>>>,
    requests: Arc<Mutex<Vec<Bottle>>>,
}

impl RpcChannel for FakeWorld {
    fn call(&mut self, cmd: &Bottle) -> Result<Bottle, RpcError> {
        self.requests.lock().unwrap().push(cmd.clone());

        let mut ball = self.ball.lock().unwrap();

        let reply = match (cmd.text(0), cmd.text(1)) {
            (Some("get"), _) => Bottle::new()
                .with_vocab("ack")
                .with_float64(ball.x)
                .with_float64(ball.y)
                .with_float64(ball.z),
            (Some("set"), _) => {
                *ball = Vector3::new(
                    cmd.float64(1).unwrap(),
                    cmd.float64(2).unwrap(),
                    cmd.float64(3).unwrap(),
                );
                Bottle::new().with_vocab("ack")
            }
            (Some("world"), Some("get")) => Bottle::new()
                .with_float64(ball.x)
                .with_float64(ball.y)
                .with_float64(ball.z),
            (Some("world"), Some("set")) => {
                *ball = Vector3::new(
                    cmd.float64(3).unwrap(),
                    cmd.float64(4).unwrap(),
                    cmd.float64(5).unwrap(),
                );
                Bottle::new().with_vocab("ack")
            }
            _ => Bottle::new().with_vocab("nack"),
        };

        Ok(reply)
    }
}

/// Grasp service which moves a hand onto the ball and lifts it.
struct FakeService {
    ball: Arc<Mutex<Vector3<f64>>>,
    hand: Sender<Vector3<f64>>,
    world_to_root: FrameTransform,

    /// Offset of the hand from the ball when reaching it, root frame.
    reach_offset: Vector3<f64>,

    /// Lift applied to the ball, world frame.
    lift: Vector3<f64>,

    /// Reply to `grasp_it` with a nack.
    refuse: bool,

    requests: Arc<Mutex<Vec<Bottle>>>,
}

impl RpcChannel for FakeService {
    fn call(&mut self, cmd: &Bottle) -> Result<Bottle, RpcError> {
        self.requests.lock().unwrap().push(cmd.clone());

        match cmd.text(0) {
            Some("look_down") => Ok(ack("Yep! I'm looking down now!")),
            Some("grasp_it") if self.refuse => Ok(nack("I don't see any object!")),
            Some("grasp_it") => {
                let mut ball = self.ball.lock().unwrap();

                // Hand far away, then next to the ball
                self.hand.send(Vector3::new(1.0, 1.0, 1.0)).unwrap();
                self.hand
                    .send(self.world_to_root.apply(&ball) + self.reach_offset)
                    .unwrap();

                *ball += self.lift;

                Ok(ack("Yeah! I did it! Maybe..."))
            }
            _ => Ok(nack("Unknown command")),
        }
    }
}

struct Setup {
    world_requests: Arc<Mutex<Vec<Bottle>>>,
    service_requests: Arc<Mutex<Vec<Bottle>>>,
    _left: Sender<Vector3<f64>>,
}

fn run(
    variant: ScenarioVariant,
    reach_offset: Vector3<f64>,
    lift: Vector3<f64>,
    refuse: bool,
    closure: Option<f64>,
) -> (TestReport, Setup) {
    let scenario = Scenario::preset(variant);
    let ball = Arc::new(Mutex::new(Vector3::new(-0.3, 0.1, 0.7)));
    let world_requests = Arc::new(Mutex::new(Vec::new()));
    let service_requests = Arc::new(Mutex::new(Vec::new()));

    let (tx_r, rx_r) = channel();
    let (tx_l, rx_l) = channel();
    let poll = Duration::from_millis(5);

    let feedback: Vec<Box<dyn PoseSource>> = vec![
        Box::new(ChannelPoseSource::new("/test/hand/right:i", rx_r, poll)),
        Box::new(ChannelPoseSource::new("/test/hand/left:i", rx_l, poll)),
    ];

    let ports = HarnessPorts {
        world: FakeWorld {
            ball: ball.clone(),
            requests: world_requests.clone(),
        },
        service: FakeService {
            ball,
            hand: tx_r,
            world_to_root: scenario.world_to_root,
            reach_offset,
            lift,
            refuse,
            requests: service_requests.clone(),
        },
        feedback,
    };

    let report = run_test(
        "TestAssignmentGraspIt",
        ports,
        scenario,
        HarnessOptions {
            start_delay: Duration::from_millis(0),
            closure,
        },
        &mut StdRng::seed_from_u64(3),
    );

    (
        report,
        Setup {
            world_requests,
            service_requests,
            _left: tx_l,
        },
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[test]
fn test_variant_a_passes() {
    let (report, setup) = run(
        ScenarioVariant::A,
        Vector3::new(0.0, 0.0, 0.05),
        Vector3::new(0.0, 0.0, 0.05),
        false,
        None,
    );

    assert!(report.passed(), "{:#?}", report);
    assert_eq!(report.checks.len(), 2);
    assert!(report.fatal_error.is_none());
    assert_eq!(report.lines.last().map(String::as_str), Some("Closing Ports"));

    // get, set, get
    let world = setup.world_requests.lock().unwrap();
    assert_eq!(world.len(), 3);
    assert_eq!(world[0], Bottle::new().with_vocab("get"));
    assert_eq!(world[1].text(0), Some("set"));
    assert_eq!(world[1].len(), 4);

    // look_down then grasp_it, no closure
    let service = setup.service_requests.lock().unwrap();
    assert_eq!(
        *service,
        vec![
            Bottle::new().with_string("look_down"),
            Bottle::new().with_string("grasp_it"),
        ]
    );
}

#[test]
fn test_variant_b_passes() {
    let (report, setup) = run(
        ScenarioVariant::B,
        Vector3::new(0.1, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 0.03),
        false,
        Some(0.6),
    );

    assert!(report.passed(), "{:#?}", report);

    let world = setup.world_requests.lock().unwrap();
    assert_eq!(
        world[0],
        Bottle::new()
            .with_vocab("world")
            .with_vocab("get")
            .with_vocab("ball")
    );

    let service = setup.service_requests.lock().unwrap();
    assert_eq!(
        service[1],
        Bottle::new().with_string("grasp_it").with_float64(0.6)
    );
}

#[test]
fn test_missed_ball_fails_checks() {
    // Hand never gets close and the ball does not move
    let (report, _setup) = run(
        ScenarioVariant::A,
        Vector3::new(0.0, 0.0, 0.5),
        Vector3::zeros(),
        false,
        None,
    );

    assert!(!report.passed());
    assert!(report.fatal_error.is_none());
    assert_eq!(report.checks.len(), 2);
    assert!(report.checks.iter().all(|c| !c.passed));
}

#[test]
fn test_height_gain_required_in_variant_a() {
    // Ball pushed sideways: enough displacement for variant B, not a lift for variant A
    let (report, _setup) = run(
        ScenarioVariant::A,
        Vector3::zeros(),
        Vector3::new(0.05, 0.0, 0.0),
        false,
        None,
    );

    assert!(!report.passed());
    assert!(report.checks[0].passed);
    assert!(!report.checks[1].passed);
}

#[test]
fn test_nack_aborts() {
    let (report, setup) = run(
        ScenarioVariant::A,
        Vector3::zeros(),
        Vector3::new(0.0, 0.0, 0.05),
        true,
        None,
    );

    assert!(!report.passed());
    assert!(report.checks.is_empty());
    assert!(report.fatal_error.unwrap().contains("grasp_it"));

    // The final position is never requested
    assert_eq!(setup.world_requests.lock().unwrap().len(), 2);
}
