//! gaze-classifier - replays recorded eye-tracking traces through the gaze
//! pipeline and writes the per-frame CSV session log.

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{info, warn};

use gaze_classifier::gaze::sample::GazeSource;
use gaze_classifier::gaze::scene::SphereScene;
use gaze_classifier::session::{
    load_scene, CsvLogger, EventSink, GazeConfig, GazeSession, SexpWriter, TraceReader,
};

#[derive(Parser, Debug)]
#[command(name = "gaze-classifier", about = "Classify blinks, saccades and fixations in a gaze trace")]
struct Cli {
    /// Recorded gaze trace (one plist per frame)
    #[arg(long)]
    trace: PathBuf,

    /// Scene file with sphere colliders (one plist per line)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Config plist (default: built-in thresholds)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only process this gaze stream: central, left, or right (default: all in the trace)
    #[arg(long)]
    source: Option<String>,

    /// Directory for the CSV log (overrides the config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write a CSV log
    #[arg(long)]
    no_log: bool,

    /// Print events to stdout as s-expressions
    #[arg(long)]
    events: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaze_classifier=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("gaze-classifier v{} starting", env!("CARGO_PKG_VERSION"));

    let only = cli
        .source
        .as_deref()
        .map(|s| GazeSource::from_str(s).ok_or_else(|| anyhow!("unknown source: {s}. Use: central, left, or right")))
        .transpose()?;

    let mut config = match &cli.config {
        Some(path) => GazeConfig::load(path)?,
        None => GazeConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.log.output_dir = dir;
    }
    info!("config: {}", config.config_sexp());

    let scene = match &cli.scene {
        Some(path) => load_scene(path)?,
        None => {
            warn!("No scene given; every frame will report no target");
            SphereScene::new()
        }
    };

    let mut session = GazeSession::new(config.clone());
    if let Some(source) = only {
        session = session.only(source);
    }
    let mut log = if cli.no_log {
        None
    } else {
        Some(CsvLogger::create(&config.log.output_dir, config.log.flush_every)?)
    };
    let mut sink = SexpWriter::new(io::stdout().lock());

    let mut reader = TraceReader::open(&cli.trace)?;
    for frame in reader.by_ref() {
        let (frame, dt) = frame?;
        for (source, report) in session.step(&frame, dt, &scene) {
            if let (Some(log), Some(sample)) = (log.as_mut(), frame.sample(source)) {
                log.write_row(source, &report, sample, frame.head.as_ref())?;
            }
            if cli.events {
                sink.emit_all(source, &report.events)?;
            }
        }
    }
    if reader.skipped > 0 {
        warn!("{} malformed trace lines skipped", reader.skipped);
    }

    for (source, closing) in session.finish() {
        if cli.events {
            sink.emit_all(source, &closing)?;
        }
    }
    drop(sink);
    if let Some(log) = log {
        log.close()?;
    }

    println!("{}", session.status_sexp());
    Ok(())
}
