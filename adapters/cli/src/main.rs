#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a seeded ASCII Wars session headlessly.

mod autopilot;
mod maze_text;

use std::{
    collections::BTreeMap,
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use ascii_wars_core::{Event, GameConfig};
use ascii_wars_headless::{FrameInput, Session};
use ascii_wars_world::query;
use clap::{Parser, ValueEnum};
use log::info;

use autopilot::Autopilot;

/// Runs a deterministic ASCII Wars session and reports what happened.
#[derive(Debug, Parser)]
#[command(name = "ascii-wars", version)]
struct Args {
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for maze generation and entity behavior.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Level to start on.
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 1_200)]
    frames: u32,

    /// Simulated duration of one frame, in milliseconds.
    #[arg(long = "frame-ms", default_value_t = 50)]
    frame_ms: u64,

    /// Let a scripted player collect tokens, shoot and head for the exit.
    #[arg(long)]
    autopilot: bool,

    /// Print the maze as text after the run.
    #[arg(long = "print-maze")]
    print_maze: bool,

    /// Output format for the event log.
    #[arg(long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Log debug output unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Event log presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Event counts and the final state.
    Summary,
    /// One JSON object per event.
    Json,
}

/// Entry point for the ASCII Wars command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let mut session = Session::new(config, args.seed).context("failed to start session")?;
    let mut autopilot = args.autopilot.then(Autopilot::new);
    let dt = Duration::from_millis(args.frame_ms);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut report = Report::new(args.format);
    let mut events = Vec::new();

    session
        .start(args.level, &mut events)
        .with_context(|| format!("failed to build level {}", args.level))?;
    report.record(&mut out, &events)?;

    let mut frames = 0;
    while frames < args.frames && !session.is_finished() {
        events.clear();
        let input = autopilot
            .as_mut()
            .map_or_else(FrameInput::default, |pilot| pilot.next_input(session.world()));
        session
            .frame(dt, input, &mut events)
            .with_context(|| format!("frame {frames} failed"))?;
        report.record(&mut out, &events)?;
        frames += 1;
    }
    info!("simulated {frames} frames");

    if args.format == Format::Summary {
        report.summarize(&mut out, &session, frames)?;
    }
    if args.print_maze {
        write!(out, "{}", maze_text::render(session.world()))?;
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: GameConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

struct Report {
    format: Format,
    counts: BTreeMap<String, usize>,
}

impl Report {
    fn new(format: Format) -> Self {
        Self {
            format,
            counts: BTreeMap::new(),
        }
    }

    fn record(&mut self, out: &mut impl Write, events: &[Event]) -> Result<()> {
        for event in events {
            let value = serde_json::to_value(event).context("failed to encode event")?;
            match self.format {
                Format::Json => writeln!(out, "{value}")?,
                Format::Summary => *self.counts.entry(event_name(&value)).or_default() += 1,
            }
        }
        Ok(())
    }

    fn summarize(&self, out: &mut impl Write, session: &Session, frames: u32) -> Result<()> {
        let world = session.world();
        let player = query::player(world);
        writeln!(out, "frames: {frames}")?;
        writeln!(out, "level: {}", query::level(world))?;
        writeln!(out, "score: {}", query::score(world))?;
        writeln!(out, "lives: {}", player.lives)?;
        writeln!(out, "discs: {}", query::discs_remaining(world))?;
        writeln!(out, "tokens left: {}", query::tokens(world).len())?;
        writeln!(out, "finished: {}", session.is_finished())?;
        writeln!(out, "events:")?;
        for (name, count) in &self.counts {
            writeln!(out, "  {name}: {count}")?;
        }
        for (rank, entry) in session.high_scores().entries().iter().enumerate() {
            writeln!(
                out,
                "high score #{}: {} {} (level {})",
                rank + 1,
                entry.name,
                entry.score,
                entry.level
            )?;
        }
        Ok(())
    }
}

fn event_name(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(fields) => fields.keys().next().cloned().unwrap_or_default(),
        serde_json::Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
