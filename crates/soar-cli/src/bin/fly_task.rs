//! Fly a synthetic straight-line track through a task file.
//!
//! The track starts behind the start, turns at each target (optionally
//! moved at random inside the zone) and ends past the finish. Events and
//! the resulting statistics are logged.
//!
//! Usage:
//!   cargo run -p soar-cli --bin fly_task -- task.json --start 11:30

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use soar_cli::report::{parse_time_of_day, FlightReport};
use soar_cli::sim::{fly, plan_turns, FlightPlan, RoutePath};
use soar_cli::{Config, EngineSettings, TaskFile};
use soar_core::{GlidePolar, SharedTask};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fly a synthetic track through a soaring task")]
struct Args {
    /// Task description (JSON)
    task: PathBuf,

    /// Behaviour and polar settings (JSON), overrides SOAR_SETTINGS
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Time of day the track begins
    #[arg(long, default_value = "12:00")]
    start: String,

    /// Seconds between fixes
    #[arg(long, default_value_t = 5.0)]
    step: f64,

    /// Ground speed in m/s
    #[arg(long, default_value_t = 30.0)]
    speed: f64,

    /// Starting altitude in meters
    #[arg(long, default_value_t = 1_500.0)]
    altitude: f64,

    /// Glide ratio of the track, 0 flies level
    #[arg(long, default_value_t = 0.0)]
    glide_ratio: f64,

    /// Move each turn at random within this fraction of the zone radius
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Seed for the turn jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Follow the best MacCready value
    #[arg(long)]
    auto_mc: bool,

    /// Print the flight report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    let settings_path = args.settings.clone().or_else(|| config.settings_path.clone());
    let mut settings = EngineSettings::load(settings_path.as_deref())?;
    config.apply(&mut settings);

    let task_file = TaskFile::load(&args.task)?;
    let task = task_file.build(&settings.behaviour)?;
    tracing::info!(
        "Loaded task '{}' ({:?}, {} points)",
        task.name(),
        task.factory_kind(),
        task.len()
    );

    let plan = FlightPlan {
        altitude_m: args.altitude,
        speed_mps: args.speed,
        glide_ratio: args.glide_ratio,
        jitter: args.jitter,
        auto_mc: args.auto_mc,
        ..FlightPlan::default()
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let turns = plan_turns(&task, &plan, &mut rng);
    let route = RoutePath::new(&turns, plan.altitude_m, plan.speed_mps, plan.glide_ratio);
    tracing::info!(
        "Flying {:.1} km through {} turns",
        route.distance_m() / 1_000.0,
        turns.len()
    );

    let shared = SharedTask::new(task);
    let mut polar = GlidePolar::new(settings.glide.clone());
    let log = fly(&shared, &route, &mut polar, &plan, parse_time_of_day(&args.start)?, args.step);

    let report = shared.with_task(|task| FlightReport::new(task, &log));
    report.log();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
