//! # Hoist Control Unit
//!
//! Runs the superstructure control loop against simulated lift, pivot and
//! roller hardware. Loads one TOML file, performs RT setup, builds the
//! state graph and ticks until SIGINT or the requested cycle count.

use clap::Parser;
use hoist_common::config::LogLevel;
use hoist_common::consts::DEFAULT_CONFIG_PATH;
use hoist_common::superstructure::config::{RunMode, SuperstructureConfig};
use hoist_common::superstructure::state::SuperstructureState;
use hoist_control_unit::config::load_config;
use hoist_control_unit::cycle::{CycleRunner, rt_setup};
use hoist_control_unit::superstructure::Superstructure;
use hoist_hal::{SimAxis, SimAxisParams, SimRoller, SimRollerParams};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Hoist Control Unit - superstructure state machine and axis control loop
#[derive(Parser, Debug)]
#[command(name = "hoist_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Graph-scheduled lift and pivot control loop")]
struct Args {
    /// Path to the superstructure configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Goal state to drive toward after homing (e.g. L4_CORAL).
    #[arg(long, default_value = "STOW")]
    goal: SuperstructureState,

    /// Start from AUTO_START (home in place, coral pre-loaded).
    #[arg(long)]
    auto_start: bool,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level, overrides the config log_level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // The config carries the log level, so it is read before logging starts.
    let loaded = load_config(&args.config);
    let configured = loaded.as_ref().ok().map(|c| c.shared.log_level);
    setup_tracing(&args, configured);

    info!("Hoist Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result: Result<(), Box<dyn std::error::Error>> = loaded
        .map_err(|e| format!("{}: {e}", args.config.display()).into())
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Hoist Control Unit shutdown complete");
}

fn run(args: &Args, config: SuperstructureConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config {}: service={}, log_level={:?}",
        args.config.display(),
        config.shared.service_name,
        config.shared.log_level
    );
    if config.run_mode != RunMode::Sim {
        warn!(
            "run_mode={:?} but no hardware backend is linked; using simulated devices",
            config.run_mode
        );
    }

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let dt = config.cycle.period_s;
    let (elevator, _) = SimAxis::new(SimAxisParams::from_axis_config("elevator", &config.elevator, dt));
    let (pivot, _) = SimAxis::new(SimAxisParams::from_axis_config("pivot", &config.pivot, dt));
    let (tunnel, _) = SimRoller::new(SimRollerParams::new("tunnel"));
    let (gripper, _) = SimRoller::new(SimRollerParams::new("gripper"));

    let mut superstructure = Superstructure::new(
        &config,
        Box::new(elevator),
        Box::new(pivot),
        Box::new(tunnel),
        Box::new(gripper),
    )?;
    if args.auto_start {
        superstructure.auto_start();
    }
    superstructure.set_goal(args.goal);
    info!(
        "State graph: {} edges, goal {}",
        superstructure.graph().edge_count(),
        args.goal
    );

    let mut runner = CycleRunner::new(superstructure, dt);
    if let Some(cycles) = args.cycles {
        runner = runner.with_cycle_limit(cycles);
    }

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    runner.run()?;

    let s = runner.superstructure();
    info!(
        "Final state: current={} next={:?} goal={} at_goal={} estopped={}",
        s.current(),
        s.next(),
        s.goal(),
        s.at_goal(),
        s.is_estopped()
    );
    Ok(())
}

/// Filter directive: `--verbose`, else the config `log_level`, else info.
fn log_directive(verbose: bool, configured: Option<LogLevel>) -> &'static str {
    if verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.unwrap_or_default().as_directive()
    }
}

/// Setup tracing subscriber from CLI arguments and the loaded config.
/// `RUST_LOG`, when set, takes precedence.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let directive = log_directive(args.verbose, configured);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
