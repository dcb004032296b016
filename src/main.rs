use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use slowmovie::shutdown;
use slowmovie::{
    CaptureDisplay, Config, DisplaySink, EpdProcess, FramePlayer, PlaybackState, ShutdownFlag,
};

/// Play preprocessed frames on an e-paper display.
#[derive(Parser)]
#[command(name = "slowmovie", about = "Play preprocessed frames on an e-paper display")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Capture rendered frames into this directory instead of driving
    /// the panel
    #[arg(long)]
    capture_dir: Option<PathBuf>,

    /// Path of the persistent log file
    #[arg(long, default_value = "slowmovie.log")]
    log_file: PathBuf,

    /// Log per-frame progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file, cli.verbose) {
        eprintln!("failed to set up logging: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;

    // The backend is picked once here and injected; the engine only ever
    // sees the DisplaySink trait.
    let display: Box<dyn DisplaySink> = if let Some(dir) = &cli.capture_dir {
        Box::new(CaptureDisplay::new(Some(dir.clone())))
    } else if let Some(panel) = &config.display {
        Box::new(EpdProcess::new(
            &panel.driver_command,
            panel.width,
            panel.height,
        ))
    } else {
        anyhow::bail!(
            "no display configured: add a \"display\" section to {:?} or pass --capture-dir",
            cli.config
        );
    };

    let flag = ShutdownFlag::new();
    shutdown::install_signal_handler(flag.clone())
        .context("failed to install the signal handler")?;

    let mut player = FramePlayer::new(&config, display, flag)?;
    match player.play()? {
        PlaybackState::Interrupted => {
            info!("playback interrupted at index {}", player.position());
        }
        _ => info!("playback complete"),
    }
    Ok(())
}

// Console layer for an attached session, plus an append-mode file that
// survives restarts.
fn init_logging(log_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {log_file:?}"))?;

    tracing_subscriber::registry()
        .with(level)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
