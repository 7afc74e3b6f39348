use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use snatch_core::{
    build_sandbox_app, load_match_config_from_env, run_frame, FrameDelta, LogCapture,
    MatchConfig, MatchMetrics, SnatcherManager,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless match runner for the snatcher sandbox", long_about = None)]
struct Args {
    /// Match config JSON (defaults to SNATCH_CONFIG_PATH, then the builtin config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of spawned hosts
    #[arg(long)]
    hosts: Option<u32>,

    /// Maximum number of frames to run
    #[arg(long, default_value_t = 36_000)]
    frames: u32,

    /// Seconds advanced per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    delta: f32,

    /// Keep running after the match has ended
    #[arg(long)]
    ignore_end: bool,

    /// Write every captured log event to this file as JSON lines
    #[arg(long)]
    events_out: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<MatchConfig> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::from_file(path)
            .with_context(|| format!("Failed to load match config at {}", path.display()))?,
        None => load_match_config_from_env(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(hosts) = args.hosts {
        config.spawn.host_count = hosts;
    }
    config.validate().context("Match config is invalid")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let capture = LogCapture::new();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(capture.layer())
        .init();

    let config = load_config(&args)?;
    let mut app = build_sandbox_app(config);
    app.world.insert_resource(FrameDelta(args.delta));

    let mut events_out = match &args.events_out {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create events file at {}", path.display())
        })?)),
        None => None,
    };

    let mut frames_run = 0;
    for _ in 0..args.frames {
        run_frame(&mut app);
        frames_run += 1;

        if let Some(writer) = events_out.as_mut() {
            for envelope in capture.drain() {
                serde_json::to_writer(&mut *writer, &envelope)?;
                writer.write_all(b"\n")?;
            }
        }
        if !args.ignore_end && app.world.resource::<SnatcherManager>().is_ended() {
            break;
        }
    }
    if let Some(mut writer) = events_out {
        writer.flush()?;
    }

    let manager = app.world.resource::<SnatcherManager>();
    let metrics = app.world.resource::<MatchMetrics>();
    let summary = json!({
        "frames": frames_run,
        "winner": manager.winner().map(|faction| faction.0),
        "winner_name": manager.winner().map(|faction| manager.zone_name(faction)),
        "standings": manager.standings(),
        "metrics": metrics,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
