//! Smoke test executable entry point.
//!
//! Runs the grasp test against a running simulator and grasp executable. The report is saved in
//! the session directory as `report.json`, and the executable fails if the run was aborted or any
//! check failed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use comms_if::net::{zmq, NameTable, NetParams};
use smoke_lib::{
    harness::{run_test, setup, HarnessOptions},
    params::SmokeTestParams,
    report::TestReport,
    scenario::Scenario,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::secs_to_duration,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options, overriding the parameter file.
#[derive(Debug, StructOpt)]
#[structopt(name = "smoke_test", about = "Checks that the robot grasps and lifts the ball")]
struct Opt {
    /// Name of the robot under test. Its hand state ports must be listed in `net.toml`
    #[structopt(long)]
    robot: Option<String>,

    /// Maximum time to wait for a world or service reply, in seconds
    #[structopt(long = "rpc-timeout")]
    rpc_timeout: Option<f64>,

    /// Parameter file to use instead of `$GRASP_SW_ROOT/params/smoke_test.toml`
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("smoke_test", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Grasp Smoke Test\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: SmokeTestParams = match opt.params {
        Some(ref p) => util::params::load_file(p),
        None => util::params::load("smoke_test.toml"),
    }
    .wrap_err("Could not load smoke_test params")?;

    if let Some(robot) = opt.robot {
        params.robot = robot;
    }
    if let Some(t) = opt.rpc_timeout {
        params.rpc_timeout_s = t;
    }

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let names = NameTable::new(&net_params);

    let scenario = Scenario::preset(params.variant);
    info!(
        "Running {} variant {:?} against robot \"{}\"",
        params.name, params.variant, params.robot
    );

    let mut rng = match params.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    // ---- RUN ----

    let zmq_ctx = zmq::Context::new();

    let report = match setup(&zmq_ctx, &names, &params) {
        Ok(ports) => run_test(
            &params.name,
            ports,
            scenario,
            HarnessOptions {
                start_delay: secs_to_duration(params.warmup_s),
                closure: params.closure,
            },
            &mut rng,
        ),
        Err(e) => {
            let mut report = TestReport::new(&params.name, params.variant);
            report.abort(e.to_string());
            report
        }
    };

    // ---- REPORT ----

    let passed = report.passed();
    if passed {
        info!("{} PASSED", params.name);
    } else {
        error!("{} FAILED", params.name);
    }

    session.save("report.json", report);
    session.exit();

    if passed {
        Ok(())
    } else {
        Err(eyre!("{} failed", params.name))
    }
}
