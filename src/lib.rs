pub mod camera;
pub mod cli;
pub mod engine;
pub mod metrics;
pub mod models;
pub mod navigation;
pub mod scanner;
pub mod settings;
pub mod truss;
mod utils;

use anyhow::Context;
use clap::Parser;

pub use camera::{CameraError, MediaConstraints, MediaDevices, VideoSurface};
pub use engine::{DetectionEngine, EngineCatalog, FrameDecoder};
pub use models::{DecodedPayload, FeedbackMessage, ScanStatus, SessionInfo};
pub use navigation::{build_navigation_target, Navigator};
pub use scanner::{ScanController, ScanError, ScanIntent};
pub use settings::{ScannerSettings, SettingsStore};
pub use truss::{TrussDetailView, TrussSource};

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = cli::Cli::parse();
    log::info!("truss-scan starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(cli::execute(cli))
}
