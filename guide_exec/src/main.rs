//! Main guidance executable entry point.
//!
//! # Architecture
//!
//! The executable replays a recorded walk against a route file:
//!
//!     - Initialise the session, logging and parameters
//!     - Load the routes and the replay script
//!     - Start the navigation worker
//!     - Main loop:
//!         - Release the script items which are due
//!         - Collect the worker's outputs, logging events and archiving telemetry
//!     - Shut the worker down and save the final telemetry
//!
//! The wristband is replaced by a link which logs each signal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::{cmd::{NavCmd, ScriptItem}, route::RouteData};
use guide_lib::{
    nav_mgr::{NavEvent, NavInput, NavMgr, NavOutput, SampleWorker},
    signal_client::LogSignalLink,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingItems, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.05;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Replay a recorded walk against a set of routes.
#[derive(Debug, StructOpt)]
#[structopt(name = "guide_exec")]
struct Opts {
    /// Path to the route data JSON file
    #[structopt(parse(from_os_str))]
    routes: PathBuf,

    /// Path to the replay script
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Route to select before the script starts
    route: Option<String>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("guide_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Wayfinder Guidance Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD DATA ----

    let route_data = RouteData::load(&opts.routes)
        .wrap_err_with(|| format!("Failed to load routes from {:?}", opts.routes))?;

    info!(
        "Routes loaded: {}",
        route_data.names().collect::<Vec<_>>().join(", ")
    );

    let mut si =
        ScriptInterpreter::new(&opts.script).wrap_err("Failed to load the replay script")?;

    info!(
        "Script loaded with {} items, lasting {:.1} s",
        si.get_num_items(),
        si.get_duration()
    );

    // ---- INITIALISE MODULES ----

    let nav_mgr = NavMgr::init("guide.toml", &route_data, Box::new(LogSignalLink::new()))
        .wrap_err("Failed to initialise NavMgr")?;

    for name in nav_mgr.route_names() {
        if let Some(graph) = nav_mgr.route(name) {
            info!("Route {:?}: {} usable nodes", name, graph.len());
        }
    }

    let worker = SampleWorker::spawn(nav_mgr).wrap_err("Failed to start the navigation worker")?;
    let stop_handle = worker.stop_handle();

    let mut archiver =
        Archiver::from_path(&session, "nav_tm.csv").wrap_err("Failed to open the TM archive")?;

    info!("Initialisation complete\n");

    if let Some(route) = opts.route {
        worker
            .send(NavInput::Cmd(NavCmd::Select { route }))
            .wrap_err("Failed to select the initial route")?;
    }

    // ---- MAIN LOOP ----

    loop {
        let cycle_start_instant = Instant::now();

        // ---- SCRIPT PROCESSING ----

        match si.get_pending() {
            PendingItems::None => (),
            PendingItems::Some(items) => {
                for item in items {
                    let input = match item {
                        ScriptItem::Fix(f) => NavInput::Fix(f),
                        ScriptItem::Heading(h) => NavInput::Heading(h),
                        ScriptItem::Cmd(c) => {
                            // Stops must take effect even if samples are queued ahead of them
                            if c == NavCmd::Stop {
                                stop_handle.request_stop();
                            }
                            NavInput::Cmd(c)
                        }
                    };

                    worker
                        .send(input)
                        .wrap_err("The navigation worker has stopped")?;
                }
            }
            PendingItems::EndOfScript => {
                info!("End of script reached");
                break;
            }
        }

        // ---- OUTPUT PROCESSING ----

        while let Some(output) = worker.try_recv() {
            process_output(output, &mut archiver);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            ),
        }
    }

    // ---- SHUTDOWN ----

    let (nav_mgr, remaining) = worker
        .shutdown()
        .wrap_err("Failed to shut down the navigation worker")?;

    for output in remaining {
        process_output(output, &mut archiver);
    }

    let tm = nav_mgr.get_tm();
    info!(
        "Final state: {:?} on route {:?} at node {:?}",
        tm.state, tm.route_name, tm.current_node
    );
    session.save("final_tm.json", tm);

    session.exit();

    info!("End of execution");

    Ok(())
}

/// Log the events of one output and archive its telemetry.
fn process_output(output: NavOutput, archiver: &mut Archiver) {
    if let Some(e) = output.rejected {
        warn!("Command rejected: {}", e);
    }

    for event in output.events.iter() {
        match event {
            NavEvent::SignalFailure { side, error } => {
                warn!("Signal to the {} side failed: {}", side, error)
            }
            e => info!("{:?}", e),
        }
    }

    if let Err(e) = archiver.serialise(&output.tm) {
        error!("Could not archive NavTm: {}", e);
    }
}
