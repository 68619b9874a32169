//! brieftrack CLI: build, inspect and try out reference models.

use brieftrack::features::{FastDetector, ReferenceIndex};
use brieftrack::image::{gray_view, load_gray};
use brieftrack::{FrameEstimate, PlanarTracker, TrackerParams};
use clap::{Parser, Subcommand};
use nalgebra::Matrix3;
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "brieftrack")]
#[command(about = "Planar target tracking with bucketed binary descriptors")]
#[command(version)]
struct Cli {
    /// Log pipeline details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a reference model from an image of the target.
    BuildModel {
        /// Reference image of the planar target.
        #[arg(long)]
        image: PathBuf,
        /// Output model file.
        #[arg(long)]
        out: PathBuf,
        /// Tracker parameters (JSON); only the FAST settings are used here.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print model statistics.
    Inspect {
        #[arg(long)]
        model: PathBuf,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Track the target through frames and print a JSON report.
    Track {
        #[arg(long)]
        model: PathBuf,
        /// Tracker parameters (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Frames, processed in order.
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::BuildModel { image, out, config } => {
            run_build_model(&image, &out, config.as_deref())
        }
        Commands::Inspect { model, json } => run_inspect(&model, json),
        Commands::Track {
            model,
            config,
            frames,
        } => run_track(&model, config.as_deref(), &frames),
    }
}

fn init_logging(verbose: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        brieftrack::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        let _ = brieftrack::core::init_with_level(level);
    }
}

fn load_params(config: Option<&Path>) -> CliResult<TrackerParams> {
    Ok(match config {
        Some(path) => TrackerParams::load_json(path)?,
        None => TrackerParams::default(),
    })
}

// ── build-model ───────────────────────────────────────────────────────

fn run_build_model(image: &Path, out: &Path, config: Option<&Path>) -> CliResult<()> {
    let params = load_params(config)?;
    let img = load_gray(image)?;
    let detector = FastDetector::new(params.fast);
    let index = ReferenceIndex::build_from_image(&gray_view(&img), &detector)?;
    index.save(out)?;

    let stats = index.stats();
    println!(
        "wrote {} ({}x{}, {} features, {} non-empty buckets)",
        out.display(),
        stats.width,
        stats.height,
        stats.features,
        stats.non_empty_buckets
    );
    Ok(())
}

// ── inspect ───────────────────────────────────────────────────────────

fn run_inspect(model: &Path, json: bool) -> CliResult<()> {
    let index = ReferenceIndex::load(model)?;
    let stats = index.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("brieftrack model {}", model.display());
    println!("  target size:        {} x {}", stats.width, stats.height);
    println!("  features:           {}", stats.features);
    println!(
        "  non-empty buckets:  {} / {}",
        stats.non_empty_buckets,
        index.buckets().len()
    );
    println!("  largest bucket:     {}", stats.largest_bucket);
    Ok(())
}

// ── track ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum FrameStatus {
    Tracked,
    Lost,
}

#[derive(Serialize)]
struct FrameReport {
    frame: PathBuf,
    status: FrameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<FrameEstimate>,
    /// Last accepted homography, carried over lost frames.
    homography: Option<Matrix3<f32>>,
    outline: Option<[[f32; 2]; 4]>,
}

fn run_track(model: &Path, config: Option<&Path>, frames: &[PathBuf]) -> CliResult<()> {
    let params = load_params(config)?;
    let mut tracker = PlanarTracker::new(params)?;
    tracker.load_model(model)?;

    let mut reports = Vec::with_capacity(frames.len());
    for path in frames {
        let img = load_gray(path)?;
        let result = tracker.process_frame(&gray_view(&img));
        let (status, error, estimate) = match result {
            Ok(est) => (FrameStatus::Tracked, None, Some(est)),
            Err(e) if e.is_recoverable() => (FrameStatus::Lost, Some(e.to_string()), None),
            Err(e) => return Err(e.into()),
        };
        reports.push(FrameReport {
            frame: path.clone(),
            status,
            error,
            estimate,
            homography: tracker.homography().copied(),
            outline: tracker
                .target_outline()
                .map(|q| q.map(|p| [p.x, p.y])),
        });
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
