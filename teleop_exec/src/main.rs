//! Simulated teleoperation host executable.
//!
//! # Architecture
//!
//! The host stands in for the application around the control core:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the simulated collaborators and enter teleoperation
//!     - Main loop:
//!         - Apply any due inputs from the script (or sway the tilt)
//!         - Step the control-loop object, which runs the sampler, drains
//!           animation completions and runs the control tick when due
//!         - Write archives
//!     - Exit teleoperation, stopping the robot

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use teleop_if::{
    clock::{Clock, MonotonicClock},
    input::InputEvent,
    sens::{SensorSource, SliderAxis}
};
use teleop_lib::{
    params::TeleopParams,
    sim::{LoggingActuatorSink, SimInputs, SineTilt, ThreadedAnimPlayer},
    teleop_ctrl::{Collaborators, TeleopCtrl}
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingInputs, ScriptInterpreter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one host cycle. Shorter than the control tick so that
/// timers are polled close to when they fall due.
const HOST_CYCLE_PERIOD_S: f64 = 0.01;

/// Time to keep running after the last scripted input, so that it takes
/// effect and any transition completes.
const SCRIPT_SETTLE_S: f64 = 2.0;

/// Amplitude of the swaying tilt used when no script is given.
const SWAY_AMPLITUDE_RAD: f64 = 0.6;

/// Period of the swaying tilt used when no script is given.
const SWAY_PERIOD_S: f64 = 6.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Run the teleoperation core against a simulated robot.
#[derive(Debug, StructOpt)]
#[structopt(name = "teleop_exec")]
struct Opt {
    /// Input script to play. Without one the robot drives forwards while the
    /// tilt sways from side to side.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Run duration in seconds when no script is given.
    #[structopt(short, long, default_value = "10")]
    duration_s: f64,

    /// Duration of each simulated posture animation in seconds.
    #[structopt(long, default_value = "0.5")]
    anim_duration_s: f64,

    /// Report every simulated animation as failed.
    #[structopt(long)]
    fail_anims: bool,

    /// Reject every n-th actuator demand.
    #[structopt(long)]
    fail_every: Option<u32>,

    /// Parameter file, relative to $TELEOP_SW_ROOT/params.
    #[structopt(long, default_value = "teleop.toml")]
    params: String
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new(
        "teleop_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Teleoperation Simulated Host\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params: TeleopParams = util::params::load(&opt.params)
        .wrap_err("Could not load teleop params")?;
    params.validate().wrap_err("Invalid teleop params")?;

    info!("Parameters loaded");

    // ---- INPUT SOURCE ----

    let inputs = SimInputs::new();
    inputs.set_slider(SliderAxis::Head, 0.5);

    let (mut script, sensor): (Option<ScriptInterpreter>, Box<dyn SensorSource>) = 
        match opt.script {
            Some(ref path) => {
                info!("Loading script from {:?}", path);

                let si = ScriptInterpreter::new(path)
                    .wrap_err("Failed to load script")?;

                info!(
                    "Loaded script lasts {:.02} s and contains {} inputs\n",
                    si.get_duration(),
                    si.get_num_inputs()
                );

                (Some(si), Box::new(inputs.clone()) as Box<dyn SensorSource>)
            },
            None => {
                if !(opt.duration_s.is_finite() && opt.duration_s > 0.0) {
                    return Err(eyre!(
                        "Expected a positive duration, found {}", opt.duration_s));
                }

                info!(
                    "No script provided, driving forwards with swaying tilt for {} s\n", 
                    opt.duration_s
                );
                inputs.set_slider(SliderAxis::Drive, 0.7);

                (None, Box::new(SineTilt::new(SWAY_AMPLITUDE_RAD, SWAY_PERIOD_S)) as Box<dyn SensorSource>)
            }
        };

    if !(opt.anim_duration_s.is_finite() && opt.anim_duration_s >= 0.0) {
        return Err(eyre!(
            "Expected a non-negative animation duration, found {}", opt.anim_duration_s));
    }

    // ---- ENTER TELEOPERATION ----

    let collab = Collaborators {
        sensor,
        sliders: Box::new(inputs.clone()),
        actuators: Box::new(LoggingActuatorSink::new(opt.fail_every)),
        anims: Box::new(ThreadedAnimPlayer::new(
            Duration::from_secs_f64(opt.anim_duration_s), 
            opt.fail_anims
        ))
    };

    let clock = MonotonicClock::new();

    let mut ctrl = TeleopCtrl::enter(params, collab, clock.now())
        .wrap_err("Failed to enter teleoperation")?;
    ctrl.arch_init(&session)
        .wrap_err("Failed to initialise archives")?;

    // ---- MAIN LOOP ----

    // Scripted runs stop once the script has ended and settled
    let mut stop_at_s = match script {
        Some(_) => None,
        None => Some(opt.duration_s)
    };

    info!("Begining main loop\n");

    loop {
        let cycle_start_instant = Instant::now();
        let now = clock.now();

        // ---- INPUTS ----

        if let Some(ref mut si) = script {
            match si.get_pending_inputs(now.as_secs_f64()) {
                PendingInputs::None => (),
                PendingInputs::Some(events) => {
                    for evt in events.iter() {
                        apply_input(evt, &inputs, &mut ctrl);
                    }
                },
                PendingInputs::EndOfScript => if stop_at_s.is_none() {
                    info!("End of input script reached, settling for {} s", SCRIPT_SETTLE_S);
                    stop_at_s = Some(now.as_secs_f64() + SCRIPT_SETTLE_S);
                }
            }
        }

        if let Some(s) = stop_at_s {
            if now.as_secs_f64() >= s {
                info!("Stopping");
                break
            }
        }

        // ---- CONTROL ----

        if let Some(rpt) = ctrl.step(now) {
            if rpt.num_failed > 0 {
                debug!("{} demands failed this tick", rpt.num_failed);
            }
            if let Some(s) = rpt.transition_finished {
                info!("Posture now {:?}", s);
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ctrl.write() {
            warn!("Could not write archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(HOST_CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s", 
                cycle_dur.as_secs_f64() - HOST_CYCLE_PERIOD_S
            )
        }
    }

    // ---- SHUTDOWN ----

    match serde_json::to_string(ctrl.rate_state()) {
        Ok(s) => info!("Last sent demands: {}", s),
        Err(e) => warn!("Could not serialise the last sent demands: {}", e)
    }

    ctrl.exit();

    if let Err(e) = ctrl.write() {
        warn!("Could not write archives: {}", e);
    }

    info!("End of execution");

    Ok(())
}

/// Apply a scripted input event.
fn apply_input(evt: &InputEvent, inputs: &SimInputs, ctrl: &mut TeleopCtrl) {
    debug!("Input: {:?}", evt);

    match *evt {
        InputEvent::Slider { axis, value } => inputs.set_slider(axis, value),
        InputEvent::Tilt { pitch_rad } => inputs.set_tilt(pitch_rad),
        InputEvent::LiftDrift => ctrl.notify_lift_drift(),
        InputEvent::LiftHeight { ratio } => ctrl.set_lift_height(ratio)
    }
}
