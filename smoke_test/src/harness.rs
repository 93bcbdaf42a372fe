//! # Test Harness
//!
//! Drives one run of the grasp test:
//!
//! 1. Read the initial ball position from the world, perturb it and write it back.
//! 2. Ask the grasp service to `look_down`.
//! 3. Arm the proximity monitor on the ball position, in the robot root frame.
//! 4. Ask the grasp service to `grasp_it`.
//! 5. Read the final ball position and check that a hand reached the ball and that the ball was
//!    lifted.
//!
//! Communication failures abort the run, failed checks are only recorded. The ports are always
//! closed at the end of the run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use nalgebra::Vector3;
use rand::Rng;
use std::{thread, time::Duration};

use comms_if::{
    eqpt::HandSide,
    net::{zmq, NameTable},
    rpc::{Bottle, BottleReader, RpcChannel, RpcClient, RpcError, ACK},
};
use util::time::secs_to_duration;

use crate::{
    params::SmokeTestParams,
    proximity::{PoseSource, ProximityMonitor},
    report::TestReport,
    scenario::Scenario,
    world::WorldClient,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The ports used by the harness.
pub struct HarnessPorts<W, S> {
    /// RPC port to the world's ball service.
    pub world: W,

    /// RPC port to the grasp service.
    pub service: S,

    /// Hand feedback inputs.
    pub feedback: Vec<Box<dyn PoseSource>>,
}

/// Run options which are not part of the scenario.
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// Delay before starting the run.
    pub start_delay: Duration,

    /// Closure sent with `grasp_it`.
    pub closure: Option<f64>,
}

/// A single run of the test.
pub struct Harness<W, S> {
    world: WorldClient<W>,
    service: S,
    monitor: ProximityMonitor,
    scenario: Scenario,
    options: HarnessOptions,
    report: TestReport,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Unable to talk to {0}: {1}")]
    Communication(String, RpcError),

    #[error("Invalid reply from {0}: {1}")]
    InvalidReply(String, Bottle),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<W: RpcChannel, S: RpcChannel> Harness<W, S> {
    /// Build the harness over already connected ports. The hand feedback listeners start
    /// immediately but ignore every reading until the run arms them.
    pub fn new(
        name: &str,
        ports: HarnessPorts<W, S>,
        scenario: Scenario,
        options: HarnessOptions,
    ) -> Self {
        let monitor = ProximityMonitor::start(ports.feedback, scenario.proximity_threshold_m);

        Self {
            world: WorldClient::new(ports.world, scenario.world_protocol),
            service: ports.service,
            monitor,
            report: TestReport::new(name, scenario.variant),
            scenario,
            options,
        }
    }

    pub fn report(&self) -> &TestReport {
        &self.report
    }

    /// Execute the test sequence, recording report lines and checks.
    ///
    /// Returns an error as soon as a call to the world or the grasp service fails.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Result<(), HarnessError> {
        thread::sleep(self.options.start_delay);

        // ---- PLACE THE BALL ----

        self.report.report("Retrieving initial ball position");
        let initial = self.world.get_ball_position()?;
        self.report
            .report(format!("initial ball position = {} [m]", fmt_point(&initial)));

        self.report.report("Setting new initial ball position");
        let initial = self.scenario.perturb(&initial, rng);
        self.world.set_ball_position(initial.as_slice())?;
        self.report
            .report(format!("new ball position = {} [m]", fmt_point(&initial)));

        let target = self.scenario.world_to_root.apply(&initial);
        self.report.report(format!(
            "ball position in the robot root frame = {} [m]",
            fmt_point(&target)
        ));

        // ---- GRASP ----

        self.call_service("look_down", None)?;

        self.monitor.arm(target);
        self.report.report("Proximity check is now active");

        self.call_service("grasp_it", self.options.closure)?;

        // ---- CHECK ----

        self.report.report("Retrieving final ball position");
        let last = self.world.get_ball_position()?;
        self.report
            .report(format!("final ball position = {} [m]", fmt_point(&last)));

        // Let the listeners handle the poses received so far
        self.monitor.stop();

        let latch = self.monitor.latch();
        let hit_msg = match latch.distance_m() {
            Some(d) => format!("We've approached the ball! (closest reading {:.3} [m])", d),
            None => format!(
                "We've approached the ball! (never within {} [m])",
                self.scenario.proximity_threshold_m
            ),
        };
        let hit = latch.is_set();
        self.report.check(hit, hit_msg);

        let (lifted, d) = self.scenario.lift_check.evaluate(&initial, &last);
        let lift_msg = self.scenario.lift_check.describe(d);
        self.report.check(lifted, lift_msg);

        Ok(())
    }

    /// Stop the listeners, close every port and return the report.
    pub fn teardown(self) -> TestReport {
        let Harness {
            world,
            service,
            mut monitor,
            mut report,
            ..
        } = self;

        report.report("Closing Ports");

        monitor.stop();
        drop(monitor);
        drop(world);
        drop(service);

        report
    }

    /// Send a command to the grasp service, expecting an `ack`.
    fn call_service(&mut self, cmd: &str, arg: Option<f64>) -> Result<(), HarnessError> {
        let mut req = Bottle::new().with_string(cmd);
        if let Some(a) = arg {
            req = req.with_float64(a);
        }

        let reply = self
            .service
            .call(&req)
            .map_err(|e| HarnessError::Communication("the grasp service".into(), e))?;

        if reply.text(0) != Some(ACK) {
            return Err(HarnessError::InvalidReply(
                format!("the grasp service (unable to {})", cmd),
                reply,
            ));
        }

        if let Some(msg) = reply.text(1) {
            self.report.report(format!("{}: {}", cmd, msg));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run the test over `ports`, always tearing down, and return its report.
pub fn run_test<W, S, R>(
    name: &str,
    ports: HarnessPorts<W, S>,
    scenario: Scenario,
    options: HarnessOptions,
    rng: &mut R,
) -> TestReport
where
    W: RpcChannel,
    S: RpcChannel,
    R: Rng,
{
    let mut harness = Harness::new(name, ports, scenario, options);

    if let Err(e) = harness.run(rng) {
        harness.report.abort(e.to_string());
    }

    harness.teardown()
}

/// Open the test's ports, connect them to their counterparts and wait for the warm-up delay.
///
/// Any connection failure is fatal.
pub fn setup(
    ctx: &zmq::Context,
    names: &NameTable,
    params: &SmokeTestParams,
) -> Result<HarnessPorts<RpcClient, RpcClient>, HarnessError> {
    let connect_timeout = secs_to_duration(params.connect_timeout_s);
    let rpc_timeout = secs_to_duration(params.rpc_timeout_s);

    info!("Set rpc timeout = {} [s]", params.rpc_timeout_s);
    info!("Connecting Ports");

    let connect_rpc = |local: String, remote: &str| -> Result<RpcClient, HarnessError> {
        let endpoint = names
            .resolve(remote)
            .map_err(|e| HarnessError::Setup(e.to_string()))?;

        RpcClient::connect(ctx, &local, remote, endpoint, connect_timeout, rpc_timeout)
            .map_err(|e| HarnessError::Setup(format!("Unable to connect to {}: {}", remote, e)))
    };

    let world = connect_rpc(params.ball_port(), &params.world_port)?;
    let service = connect_rpc(params.gi_port(), &params.service_port)?;

    let mut feedback: Vec<Box<dyn PoseSource>> = Vec::new();
    for &side in &HandSide::ALL {
        let remote = params.hand_state_port(side);
        let endpoint = names
            .resolve(&remote)
            .map_err(|e| HarnessError::Setup(e.to_string()))?;

        let reader = BottleReader::connect(
            ctx,
            &params.hand_port(side),
            endpoint,
            connect_timeout,
            secs_to_duration(params.feedback_poll_s),
        )
        .map_err(|e| HarnessError::Setup(format!("Unable to connect to {}: {}", remote, e)))?;

        feedback.push(Box::new(reader));
    }

    thread::sleep(secs_to_duration(params.warmup_s));

    Ok(HarnessPorts {
        world,
        service,
        feedback,
    })
}

fn fmt_point(x: &Vector3<f64>) -> String {
    format!("({:.3} {:.3} {:.3})", x.x, x.y, x.z)
}
