//! linetrack CLI — run line estimation and visual odometry on image files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use linetrack::{GroundProjection, LineEstimate, OdometryFrame, Perception, PerceptionConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "linetrack")]
#[command(about = "Track-line curve fitting and ground-plane visual odometry for camera frames")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the track curve in one frame and report the steering curvature.
    Line(CliLineArgs),

    /// Match consecutive frames and report ground-plane flow vectors.
    Odometry(CliOdometryArgs),

    /// Print the default configuration (JSON).
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Configuration JSON. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ground projection JSON (`matrix` or `mount` form). Identity if omitted.
    #[arg(long)]
    projection: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolarityArg {
    Dark,
    Light,
}

impl PolarityArg {
    fn to_core(self) -> linetrack::TrackPolarity {
        match self {
            Self::Dark => linetrack::TrackPolarity::DarkLine,
            Self::Light => linetrack::TrackPolarity::LightLine,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CliLineArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the line estimate (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,

    /// Lookahead distance for the steering curvature (ground units).
    /// Defaults to `line.lookahead` from the configuration.
    #[arg(long)]
    lookahead: Option<f64>,

    /// Line contrast override.
    #[arg(long, value_enum)]
    polarity: Option<PolarityArg>,

    /// RANSAC seed override.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct CliOdometryArgs {
    /// Consecutive frames, in order.
    #[arg(long, num_args = 2.., required = true)]
    frames: Vec<PathBuf>,

    /// Path to write per-frame odometry results (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,

    /// First image row searched for corners (overrides the horizon row).
    #[arg(long)]
    start_row: Option<u32>,

    /// Descriptor pattern seed override.
    #[arg(long)]
    pattern_seed: Option<u64>,
}

#[derive(serde::Serialize)]
struct LineReport<'a> {
    image: String,
    image_size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    steering_curvature: Option<f64>,
    lookahead: f64,
    estimate: &'a LineEstimate,
}

#[derive(serde::Serialize)]
struct OdometryReport {
    image: String,
    start_row: u32,
    #[serde(flatten)]
    frame: OdometryFrame,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Line(args) => run_line(&args),
        Commands::Odometry(args) => run_odometry(&args),
        Commands::DefaultConfig => run_default_config(),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<PerceptionConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            PerceptionConfig::from_json_file(p)
        }
        None => Ok(PerceptionConfig::default()),
    }
}

fn load_projection(path: Option<&Path>) -> CliResult<GroundProjection> {
    match path {
        Some(p) => {
            tracing::info!("Loading projection: {}", p.display());
            GroundProjection::from_json_file(p)
        }
        None => {
            tracing::warn!("No --projection given; using identity (ground = pixel)");
            Ok(GroundProjection::identity())
        }
    }
}

fn load_gray(path: &Path) -> CliResult<image::GrayImage> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(img.to_luma8())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, &json)?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&PerceptionConfig::default())?
    );
    Ok(())
}

// ── line ───────────────────────────────────────────────────────────────

fn run_line(args: &CliLineArgs) -> CliResult<()> {
    let mut config = load_config(args.common.config.as_deref())?;
    if let Some(p) = args.polarity {
        config.line.polarity = p.to_core();
    }
    if let Some(seed) = args.seed {
        config.line.ransac.seed = Some(seed);
    }
    let lookahead = args.lookahead.unwrap_or(config.line.lookahead);
    if lookahead == 0.0 || !lookahead.is_finite() {
        return Err(format!("lookahead must be finite and non-zero, got {}", lookahead).into());
    }
    let projection = load_projection(args.common.projection.as_deref())?;
    let mut perception = Perception::new(config, projection)?;

    tracing::info!("Loading image: {}", args.image.display());
    let gray = load_gray(&args.image)?;
    let (w, h) = gray.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let estimate = perception.estimate_line(&gray);
    let steering_curvature = estimate
        .curve
        .as_ref()
        .map(|c| perception.steering_curvature(c, lookahead));

    match steering_curvature {
        Some(k) => tracing::info!(
            "Line: {}/{} rows, confidence {:.2}, curvature {:.6} at {}",
            estimate.inliers.len(),
            estimate.rows.len(),
            estimate.confidence,
            k,
            lookahead
        ),
        None => tracing::info!(
            "Line: no curve ({} candidate rows of {})",
            estimate.n_candidates(),
            estimate.rows.len()
        ),
    }

    let report = LineReport {
        image: args.image.display().to_string(),
        image_size: [w, h],
        steering_curvature,
        lookahead,
        estimate: &estimate,
    };
    write_json(&args.out, &report)
}

// ── odometry ───────────────────────────────────────────────────────────

fn run_odometry(args: &CliOdometryArgs) -> CliResult<()> {
    let mut config = load_config(args.common.config.as_deref())?;
    if let Some(row) = args.start_row {
        config.odometry.start_row = Some(row);
    }
    if let Some(seed) = args.pattern_seed {
        config.odometry.pattern_seed = Some(seed);
    }
    let projection = load_projection(args.common.projection.as_deref())?;
    let mut perception = Perception::new(config, projection)?;

    let mut reports = Vec::with_capacity(args.frames.len());
    for path in &args.frames {
        let gray = load_gray(path)?;
        let start_row = perception.odometry_start_row(gray.height());
        let frame = perception.estimate_odometry(&gray);
        if frame.bootstrap {
            tracing::info!(
                "{}: bootstrap, {} features (rows {}..)",
                path.display(),
                frame.n_features,
                start_row
            );
        } else {
            tracing::info!(
                "{}: {} features, {} matched, {} flow vectors",
                path.display(),
                frame.n_features,
                frame.n_matched,
                frame.flow.len()
            );
        }
        reports.push(OdometryReport {
            image: path.display().to_string(),
            start_row,
            frame,
        });
    }
    write_json(&args.out, &reports)
}
