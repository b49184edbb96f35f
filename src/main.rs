//! CLI entry point for doorcam.
//!
//! Spawns the two device loops against simulated hardware collaborators
//! (real drivers live out of tree behind the capability traits). Operational
//! control of a running device stays on the remote restart channel; the CLI
//! only selects the run mode and configuration, plus the `wipe-gallery`
//! maintenance command for factory reset.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use doorcam::config::Settings;
use doorcam::enrollment::Enroller;
use doorcam::gallery::FaceGallery;
use doorcam::hardware::mock::{MockAligner, MockCamera, MockDetector, MockEmbedder, MockLink, MockSession};
use doorcam::hardware::DeviceControl;
use doorcam::network::NetworkSupervisor;
use doorcam::pipeline::RecognitionPipeline;
use doorcam::storage::FsStore;
use doorcam::{logging, tasks};

#[derive(Parser)]
#[command(name = "doorcam")]
#[command(about = "Face-recognizing doorbell camera controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller with simulated hardware collaborators
    Run {
        /// Optional TOML settings file layered over the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Erase every enrolled face from durable storage
    WipeGallery {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Production restart: exit and let the platform supervisor relaunch the
/// process, the software equivalent of the firmware's hard reset.
struct ProcessRestart;

impl DeviceControl for ProcessRestart {
    fn restart(&self) {
        warn!("device restart requested, exiting for supervisor relaunch");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => run(config).await,
        Commands::WipeGallery { config } => wipe_gallery(config).await,
    }
}

async fn run(config: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    logging::init(&settings.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "doorcam starting");

    let store = Arc::new(FsStore::new(&settings.storage.gallery_dir));
    let gallery = FaceGallery::load(
        store,
        settings.recognition.max_entries,
        settings.recognition.match_threshold,
    )
    .await;
    let enroller = Enroller::new(
        settings.recognition.confirm_times,
        settings.recognition.candidate_tolerance,
    );

    let pipeline = RecognitionPipeline::new(
        Arc::new(MockCamera::new(320, 240)),
        Arc::new(MockDetector::new()),
        Arc::new(MockAligner::new()),
        Arc::new(MockEmbedder::new()),
        gallery,
        enroller,
    );

    let (event_tx, event_rx) = mpsc::channel(32);
    let supervisor = NetworkSupervisor::new(
        Arc::new(MockLink::new(true)),
        Arc::new(MockSession::with_events(event_tx)),
        Arc::new(ProcessRestart),
        event_rx,
        settings.network.clone(),
        Instant::now(),
    );

    let capture = tokio::spawn(tasks::run_capture_loop(
        pipeline,
        settings.recognition.capture_idle,
    ));
    let services = tokio::spawn(tasks::run_services_loop(
        supervisor,
        settings.network.service_tick,
    ));

    // both loops run until the process restarts
    let _ = tokio::join!(capture, services);
    Ok(())
}

async fn wipe_gallery(config: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    logging::init(&settings.log_level)?;

    let store = Arc::new(FsStore::new(&settings.storage.gallery_dir));
    let mut gallery = FaceGallery::load(
        store,
        settings.recognition.max_entries,
        settings.recognition.match_threshold,
    )
    .await;
    let enrolled = gallery.len();
    gallery.clear_all().await;
    info!(enrolled, "gallery wiped");
    Ok(())
}
