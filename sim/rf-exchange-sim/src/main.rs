//! RF Exchange Simulation
//!
//! Drives antennas frame by frame: recycle and transmit (one blocking task per
//! radar), deliver emissions and echoes, advance players, scan gimbals.
//!
//! Usage:
//!   rf-exchange-sim --scenario scenarios/intercept.json --frames 200 --rate 20 \
//!                   --output summary.json

mod scenario;
mod world;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use scenario::Scenario;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use world::{FrameReport, RadarSummary, World};

#[derive(Parser, Debug)]
#[command(
    name = "rf-exchange-sim",
    about = "Simulate RF emission exchange between antennas on moving platforms"
)]
struct Args {
    /// Scenario JSON file (built-in intercept when omitted)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 100)]
    frames: u64,

    /// Frame rate (Hz)
    #[arg(short, long, default_value_t = 20.0)]
    rate: f64,

    /// Run frames back to back instead of at the frame rate
    #[arg(long)]
    fast: bool,

    /// Players keep their latest emission for one extra frame
    #[arg(long)]
    hold: bool,

    /// Allocate a fresh emission per target instead of recycling
    #[arg(long)]
    no_recycle: bool,

    /// Summary JSON output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct SimSummary {
    scenario: String,
    generated_at: DateTime<Utc>,
    frames: u64,
    frame_rate_hz: f64,
    recycle: bool,
    totals: FrameReport,
    radars: Vec<RadarSummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_filter = if args.verbose {
        "rf_exchange_sim=debug,rf_antenna=debug,rf_emission=debug"
    } else {
        "rf_exchange_sim=info,rf_antenna=info,rf_emission=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if !(args.rate > 0.0 && args.rate.is_finite()) {
        bail!("frame rate must be positive: {}", args.rate);
    }

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };

    info!("{}", "=".repeat(60));
    info!("RF Exchange Simulation: {}", scenario.name);
    info!("{}", "=".repeat(60));

    let recycle = !args.no_recycle;
    let world = World::build(&scenario, recycle)?;
    let dt = 1.0 / args.rate;

    let mut ticker = time::interval(Duration::from_secs_f64(dt));
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    let mut totals = FrameReport::default();

    for frame in 0..args.frames {
        if !args.fast {
            ticker.tick().await;
        }

        let mut frame_report = FrameReport::default();

        // Transmit phase
        let targets = Arc::new(world.targets());
        let mut tasks = Vec::with_capacity(world.radars().len());
        for radar in world.radars() {
            let radar = Arc::clone(radar);
            let targets = Arc::clone(&targets);
            tasks.push(tokio::task::spawn_blocking(move || radar.transmit(&targets)));
        }
        for task in tasks {
            let (maintained, sent) = task.await?;
            frame_report.reclaimed += maintained.reclaimed;
            frame_report.retained += maintained.retained;
            frame_report.dispatched += sent.dispatched;
            frame_report.below_threshold += sent.below_threshold;
        }

        // Receive phase
        world.deliver(args.hold, &mut frame_report);

        world.advance(dt);

        debug!(
            frame,
            dispatched = frame_report.dispatched,
            direct = frame_report.direct,
            echoes = frame_report.echoes,
            reclaimed = frame_report.reclaimed,
            "frame complete"
        );

        totals.dispatched += frame_report.dispatched;
        totals.below_threshold += frame_report.below_threshold;
        totals.reclaimed += frame_report.reclaimed;
        totals.retained += frame_report.retained;
        totals.direct += frame_report.direct;
        totals.echoes += frame_report.echoes;
    }

    world.shutdown();

    let summary = SimSummary {
        scenario: scenario.name.clone(),
        generated_at: Utc::now(),
        frames: args.frames,
        frame_rate_hz: args.rate,
        recycle,
        totals,
        radars: world.summary(),
    };

    // Summary
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Emissions dispatched: {}", totals.dispatched);
    info!("Direct receptions:    {}", totals.direct);
    info!("Echoes:               {}", totals.echoes);
    for r in &summary.radars {
        info!(
            "  {:20} | allocated {:6} | reused {:8} | strongest {}",
            r.name,
            r.pool.allocated,
            r.pool.reused,
            r.strongest_received_dbw
                .map(|d| format!("{:.1} dBW", d))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    if let Some(path) = &args.output {
        info!("Writing summary to {:?}", path);
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &summary)?;
    }

    Ok(())
}
