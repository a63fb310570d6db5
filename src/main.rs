// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use gesture_controller::hands::RoleResolver;
use gesture_controller::library::GestureLibrary;
use gesture_controller::session::SessionRecorder;
use gesture_controller::{
    CommandId, ControlLoop, ControllerConfig, FrameSource, GestureController, Handedness, InputSink,
    RecordingSink, SoftwareLevels,
};

const DRY_RUN_SCREEN: (u32, u32) = (1920, 1080);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Hand {
    Left,
    Right,
}

impl From<Hand> for Handedness {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::Left => Handedness::Left,
            Hand::Right => Handedness::Right,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "gesture_controller",
    about = "Drive the pointer, volume and brightness from hand landmarks"
)]
struct Cli {
    /// Config file (default: per-user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-lines landmark recording to replay; reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Overrides the configured dominant hand
    #[arg(long, value_enum)]
    dominant: Option<Hand>,

    /// Log output commands instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// Write a per-frame CSV log under this directory
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Custom gesture library (default: config value, then per-user data dir)
    #[arg(long)]
    library: Option<PathBuf>,

    /// Record the input as a new custom gesture with this name
    #[arg(long, requires = "command")]
    record: Option<String>,

    /// Command id fired by the recorded gesture
    #[arg(long)]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_controller=info".into()),
        )
        .init();

    info!("gesture_controller v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match cli.config.clone().or_else(ControllerConfig::default_path) {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(hand) = cli.dominant {
        config.dominant_hand = hand.into();
    }

    let library = match cli
        .library
        .clone()
        .or_else(|| config.library_path.clone())
        .or_else(GestureLibrary::default_path)
    {
        Some(path) => GestureLibrary::load(path)?,
        None => GestureLibrary::new(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let mut task = tokio::task::spawn_blocking(move || run(cli, config, library, flag));

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, stopping after the current frame");
            running.store(false, Ordering::SeqCst);
            task.await
        }
    };
    joined.context("control loop panicked")?
}

fn run(cli: Cli, config: ControllerConfig, library: GestureLibrary, flag: Arc<AtomicBool>) -> Result<()> {
    let source = match &cli.input {
        Some(path) => FrameSource::open(path)?,
        None => {
            info!("Reading frames from stdin");
            FrameSource::stdin()
        }
    };

    if let Some(name) = &cli.record {
        let command = cli.command.as_deref().unwrap_or(name);
        return record(source, library, &config, name, command, &flag);
    }

    #[cfg(feature = "enigo-backend")]
    if !cli.dry_run {
        let sink = gesture_controller::output::EnigoSink::new()?;
        return drive(source, &config, library, sink, flag, cli.session_dir);
    }
    #[cfg(not(feature = "enigo-backend"))]
    if !cli.dry_run {
        warn!("Built without enigo-backend, commands are only logged");
    }

    let screen = config.screen.unwrap_or(DRY_RUN_SCREEN);
    drive(source, &config, library, RecordingSink::logging(screen), flag, cli.session_dir)
}

fn drive<S: InputSink>(
    source: FrameSource,
    config: &ControllerConfig,
    library: GestureLibrary,
    sink: S,
    flag: Arc<AtomicBool>,
    session_dir: Option<PathBuf>,
) -> Result<()> {
    let screen = config.screen.unwrap_or_else(|| sink.screen_size());
    info!("Screen {}x{}, dominant hand {:?}", screen.0, screen.1, config.dominant_hand);

    let controller = GestureController::new(config, screen).with_library(library);
    let mut control =
        ControlLoop::new(source, controller, sink, SoftwareLevels::default()).with_run_flag(flag);
    if let Some(dir) = session_dir {
        control = control.with_session(SessionRecorder::new(dir, None));
    }

    let frames = control.run()?;
    info!("Processed {} frames", frames);

    if let Some(session) = control.session() {
        let path = session.export_csv()?;
        let summary = session.summary();
        info!(
            "Session log written to {} ({} frames, {} acting)",
            path.display(),
            summary.total_frames,
            summary.acting_frames
        );
        for (gesture, count) in &summary.gesture_counts {
            info!("  {}: {} frames", gesture, count);
        }
    }
    Ok(())
}

fn record(
    mut source: FrameSource,
    mut library: GestureLibrary,
    config: &ControllerConfig,
    name: &str,
    command: &str,
    flag: &AtomicBool,
) -> Result<()> {
    let resolver = RoleResolver::new(config.dominant_hand);
    library.begin_recording(name, CommandId::new(command));

    while flag.load(Ordering::SeqCst) {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        if let Some(hand) = resolver.resolve(&frame.hands).major {
            let samples = library.add_sample(hand);
            debug!(samples, "sample added");
        }
    }

    if library.finalize()? {
        info!("Saved gesture '{}' -> {}", name, command);
        Ok(())
    } else {
        anyhow::bail!("not enough samples to save gesture '{}'", name)
    }
}
