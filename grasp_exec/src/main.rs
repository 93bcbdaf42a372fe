//! Main grasp executable entry point.
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Opens the devices: both Cartesian arm controllers (retried during their warm-up), both
//!       arm joint controllers, the gaze controller and the object retriever
//!     - Saves the startup context of each controller
//!     - Serves the `/service` port until `quit` is received
//!     - Restores the startup contexts and releases every device

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use comms_if::{
    net::{zmq, NameTable, NetParams},
    rpc::RpcClient,
};
use grasp_lib::{
    eqpt::{
        open_with_warmup, ArmDevices, CartClient, Devices, EqptClient, GazeClient, HandClient,
        HandSide, LocatorClient, Sides,
    },
    grasp_ctrl::GraspCtrl,
    params::GraspExecParams,
    svc_server::SvcServer,
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
#[structopt(name = "grasp_exec", about = "Grasps and lifts an object on request")]
struct Opt {
    /// Name of the robot to use. Its device ports must be listed in `net.toml`
    #[structopt(long)]
    robot: Option<String>,

    /// Parameter file to use instead of `$GRASP_SW_ROOT/params/grasp_exec.toml`
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

    // Initialise session
    let session = Session::new("grasp_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Grasp Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: GraspExecParams = match opt.params {
        Some(ref p) => util::params::load_file(p),
        None => util::params::load("grasp_exec.toml"),
    }
    .wrap_err("Could not load grasp_exec params")?;

    if let Some(robot) = opt.robot {
        params.robot = robot;
    }

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let names = NameTable::new(&net_params);

    info!("Exec parameters loaded, using robot \"{}\"", params.robot);

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = zmq::Context::new();

    let devices = open_devices(&zmq_ctx, &names, &params).wrap_err("Failed to open the devices")?;
    info!("Devices open");

    let mut svc_server = SvcServer::open(
        &zmq_ctx,
        &params.service_port,
        &names
            .resolve_bind(&params.service_port)
            .wrap_err("Could not resolve the service port")?,
        secs_to_duration(params.svc_poll_period_s),
    )
    .wrap_err("Failed to open the service server")?;

    let mut grasp_ctrl = GraspCtrl::new(params.grasp_ctrl.clone(), devices)
        .wrap_err("Failed to initialise GraspCtrl")?;
    info!("GraspCtrl init complete\n");

    // ---- MAIN LOOP ----

    let run_result = svc_server.run(&mut grasp_ctrl);

    // ---- SHUTDOWN ----

    info!("Shutting down");

    if let Err(ref e) = run_result {
        warn!("Service stopped on an error: {}", e);
    }

    let close_result = grasp_ctrl.close();

    drop(svc_server);
    session.exit();

    run_result.wrap_err("Service server failed")?;
    close_result.wrap_err("Failed to restore the device contexts")?;

    Ok(())
}

/// Open every device used by the grasp controller.
///
/// If the left arm cannot be opened the right one, already open, is released before returning.
fn open_devices(
    ctx: &zmq::Context,
    names: &NameTable,
    params: &GraspExecParams,
) -> Result<Devices, Report> {
    let connect_timeout = secs_to_duration(params.device_connect_timeout_s);
    let timeout = secs_to_duration(params.device_timeout_s);

    let open_client = |port: &str| -> Result<EqptClient, Report> {
        let endpoint = names
            .resolve(port)
            .wrap_err_with(|| format!("Could not resolve {}", port))?;

        EqptClient::connect(ctx, port, endpoint, connect_timeout, timeout)
            .wrap_err_with(|| format!("Could not open {}", port))
    };

    // ---- CARTESIAN CONTROLLERS ----

    let open_cart = |side: HandSide| -> Result<CartClient, Report> {
        let port = params.cart_port(side.arm_name());
        let endpoint = names
            .resolve(&port)
            .wrap_err_with(|| format!("Could not resolve {}", port))?;

        let client = open_with_warmup(
            &port,
            secs_to_duration(params.cart_warmup_window_s),
            secs_to_duration(params.cart_warmup_retry_s),
            || EqptClient::connect(ctx, &port, endpoint, connect_timeout, timeout),
        )
        .wrap_err_with(|| format!("Unable to open the Cartesian Controller for {}", side.arm_name()))?;

        Ok(CartClient::new(client, params.motion_poll_period_s))
    };

    let right_cart = open_cart(HandSide::Right)?;
    let left_cart = match open_cart(HandSide::Left) {
        Ok(c) => c,
        Err(e) => {
            drop(right_cart);
            warn!("Released the right arm Cartesian controller");
            return Err(e);
        }
    };

    // ---- HANDS, GAZE AND LOCATOR ----

    let right_hand = HandClient::new(open_client(&params.joint_port(HandSide::Right.arm_name()))?);
    let left_hand = HandClient::new(open_client(&params.joint_port(HandSide::Left.arm_name()))?);

    let gaze = GazeClient::new(open_client(&params.gaze_port())?, params.motion_poll_period_s);

    let locator_endpoint = names
        .resolve(&params.locator_port)
        .wrap_err("Could not resolve the object retriever port")?;
    let locator = LocatorClient::new(
        RpcClient::connect(
            ctx,
            "/grasp_exec/object:rpc",
            &params.locator_port,
            locator_endpoint,
            connect_timeout,
            timeout,
        )
        .wrap_err("Could not connect to the object retriever")?,
    );

    Ok(Devices {
        arms: Sides {
            left: ArmDevices {
                cart: Box::new(left_cart),
                hand: Box::new(left_hand),
            },
            right: ArmDevices {
                cart: Box::new(right_cart),
                hand: Box::new(right_hand),
            },
        },
        gaze: Box::new(gaze),
        locator: Box::new(locator),
    })
}
