use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use crate::camera::{FacingMode, FixedTargetFrame, HeadlessSurface, ImageSequenceDevices};
use crate::models::{Rect, ScanStatus, SessionInfo};
use crate::navigation::RecordingNavigator;
use crate::scanner::{ScanController, ScanIntent};
use crate::settings::{ScannerSettings, SettingsStore};
use crate::truss::{
    truss_id_from_payload, HttpTrussSource, StaticDirSource, TrussDetailView, TrussSource,
};

#[derive(Debug, Parser)]
#[command(name = "truss-scan", version, about = "Scan truss labels and show truss details")]
pub struct Cli {
    /// JSON settings file; defaults apply when omitted or missing.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scan session over a directory of frames.
    Scan(ScanArgs),
    /// Load and print the detail view for a truss id or scanned payload.
    Detail(DetailArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    pub frames_dir: PathBuf,

    /// Give up after this many seconds without a code.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Pretend the frames come from a front-facing camera.
    #[arg(long)]
    pub front: bool,

    /// Target overlay `x,y,w,h` in display coordinates; decoding is cropped
    /// to it.
    #[arg(long, value_parser = parse_rect)]
    pub frame: Option<Rect>,

    /// On-screen video rect `x,y,w,h`; defaults to the native frame size.
    #[arg(long, value_parser = parse_rect)]
    pub display: Option<Rect>,
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid number in '{value}': {err}"))?;
    match parts.as_slice() {
        &[x, y, width, height] if width > 0.0 && height > 0.0 => {
            Ok(Rect::new(x, y, width, height))
        }
        &[_, _, _, _] => Err(format!("'{value}' needs a positive width and height")),
        _ => Err(format!("expected x,y,w,h, got '{value}'")),
    }
}

#[derive(Debug, Args)]
pub struct DetailArgs {
    /// A truss id, a label URL or a scan navigation target.
    pub id_or_payload: String,

    /// Fetch over HTTP from this origin instead of the static directory.
    #[arg(long)]
    pub origin: Option<String>,
}

fn load_settings(path: Option<PathBuf>) -> Result<ScannerSettings> {
    match path {
        Some(path) => Ok(SettingsStore::new(path)?.scanner()),
        None => Ok(ScannerSettings::default()),
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings)?;
    match cli.command {
        Command::Scan(args) => scan(settings, args).await,
        Command::Detail(args) => detail(settings, args).await,
    }
}

async fn scan(settings: ScannerSettings, args: ScanArgs) -> Result<()> {
    let (session, target) = run_scan(settings, args).await?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    if let Some(target) = target {
        println!("{target}");
    }

    if session.status == ScanStatus::Failed {
        match session.error {
            Some(err) => bail!("scan failed: {err}"),
            None => bail!("scan failed"),
        }
    }
    Ok(())
}

/// Runs one session to completion, failure or timeout. Returns the final
/// snapshot and the navigation target, if any.
async fn run_scan(
    settings: ScannerSettings,
    args: ScanArgs,
) -> Result<(SessionInfo, Option<String>)> {
    let facing = if args.front {
        FacingMode::User
    } else {
        FacingMode::Environment
    };
    let mut surface = HeadlessSurface::new();
    if let Some(display) = args.display {
        surface = surface.with_display_rect(display);
    }
    let navigator = Arc::new(RecordingNavigator::new());
    let mut controller = ScanController::new(
        Arc::new(ImageSequenceDevices::new(&args.frames_dir).with_facing(facing)),
        Arc::new(surface),
        navigator.clone(),
        settings,
    );
    if let Some(frame) = args.frame {
        controller = controller.with_target_frame(Arc::new(FixedTargetFrame(frame)));
    }
    let mut updates = controller.subscribe();

    let mut session = controller.dispatch(ScanIntent::Boot).await;
    if session.status == ScanStatus::ManualStartRequired {
        // Nobody to tap the button on a terminal.
        info!("{}", session.feedback.message);
        session = controller.dispatch(ScanIntent::ManualStart).await;
    }

    if session.scanning {
        let finished = tokio::time::timeout(Duration::from_secs(args.timeout), async {
            updates
                .wait_for(|info| !info.scanning)
                .await
                .map(|info| info.clone())
        })
        .await;

        session = match finished {
            Ok(Ok(info)) => info,
            Ok(Err(_)) => bail!("scan session closed unexpectedly"),
            Err(_) => {
                warn!("no code decoded within {}s", args.timeout);
                controller.dispatch(ScanIntent::Cancel).await
            }
        };
    }

    let metrics = controller.get_metrics().await;
    info!(
        "decode attempts: {}, throttled ticks: {}, transient failures: {}",
        metrics.attempt_count, metrics.throttled_count, metrics.transient_failure_count
    );

    Ok((session, navigator.last()))
}

async fn detail(settings: ScannerSettings, args: DetailArgs) -> Result<()> {
    let truss_id = truss_id_from_payload(&args.id_or_payload);
    if truss_id.is_none() {
        warn!("no truss id in '{}'", args.id_or_payload);
    }

    let source: Box<dyn TrussSource> = match args.origin.or(settings.data_origin) {
        Some(origin) => Box::new(HttpTrussSource::new(origin)),
        None => Box::new(StaticDirSource::new(settings.static_root)),
    };

    let view = TrussDetailView::load(source.as_ref(), truss_id.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
