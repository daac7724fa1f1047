#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line harness that loads a Laser Tank level, projects a queued
//! plan onto the speculative board and optionally commits it.

mod report;
mod scenario;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use laser_tank_session::Session;
use laser_tank_world::parse;

use crate::scenario::Scenario;

/// Command-line arguments accepted by the harness.
#[derive(Debug, Parser)]
#[command(name = "laser-tank", about = "Project and replay Laser Tank plans")]
struct Args {
    /// Level layout file, one glyph per square.
    #[arg(long)]
    level: PathBuf,
    /// TOML scenario listing the moves and shots to queue.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Executes the queued plan on the master board.
    #[arg(long)]
    commit: bool,
    /// Overrides the log level otherwise read from `RUST_LOG`.
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

/// Entry point for the Laser Tank command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let layout = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level at {}", args.level.display()))?;
    let board =
        parse(&layout).with_context(|| format!("invalid level in {}", args.level.display()))?;
    info!(
        "loaded {}x{} level from {}",
        board.columns(),
        board.rows(),
        args.level.display()
    );

    let mut session = Session::new(board);
    println!("master:\n{}", report::master(&session));

    let Some(path) = args.scenario else {
        return Ok(());
    };
    let scenario = Scenario::load(&path)?;
    let queued = scenario.queue(&mut session);
    info!("queued {queued} of {} scenario steps", scenario.steps.len());

    if let Some(future) = report::future(&session) {
        println!("future:\n{future}");
        println!("overlay:\n{}", report::overlay(&session));
        println!("plan:\n{}", report::plan(&session));
    }

    if args.commit || scenario.commit {
        let executed = session.commit_plan();
        println!("committed {executed} moves:\n{}", report::master(&session));
    }
    println!("{}", report::status(&session));
    Ok(())
}

fn init_logging(level: Option<LevelFilter>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        let _ = builder.filter_level(level);
    }
    builder.init();
}
