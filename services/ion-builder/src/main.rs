//! Ionosphere model builder.
//!
//! Builds an [`IonModel`] from a YAML/environment configuration with the
//! built-in Chapman source, saves it and reports a few sample queries.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use ionmodel::{ChapmanSource, IonModel, QueryOptions, SkyDirection};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::BuilderConfig;

#[derive(Parser, Debug)]
#[command(name = "ion-builder")]
#[command(about = "Precompute and save an ionosphere model")]
struct Args {
    /// Configuration file path (defaults plus IONMODEL_* variables when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the model is saved into
    #[arg(short, long, env = "IONMODEL_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Model directory name (default: ionmodel_<start>_<end>)
    #[arg(short, long)]
    name: Option<String>,

    /// Window start, RFC 3339
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Window end, RFC 3339
    #[arg(long)]
    end: Option<DateTime<Utc>>,

    /// HEALPix nside
    #[arg(long)]
    nside: Option<u32>,

    /// Frequency in MHz for the sample attenuation/refraction report
    #[arg(short, long)]
    frequency: Vec<f64>,

    /// Only validate and lay out the lattice
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("Starting ionosphere model builder");

    let mut config = match &args.config {
        Some(path) => BuilderConfig::load(path)?,
        None => BuilderConfig::from_env(),
    };
    if let Some(start) = args.start {
        config.model.start = start;
    }
    if let Some(end) = args.end {
        config.model.end = end;
    }
    if let Some(nside) = args.nside {
        config.model.nside = nside;
    }
    if !args.frequency.is_empty() {
        config.report_frequencies_mhz = args.frequency.clone();
    }

    let pending = IonModel::build(config.model.clone())?;
    info!(
        start = %config.model.start,
        end = %config.model.end,
        instants = pending.time_axis().len(),
        samples = pending.sample_count(),
        "Model laid out"
    );

    if args.dry_run || !config.model.autocalc {
        info!("autocalc disabled, nothing sampled");
        return Ok(());
    }

    let model = pending.compute(ChapmanSource::default())?;

    let output = args
        .output
        .or_else(|| config.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = model
        .save(&output, args.name.as_deref())
        .with_context(|| format!("Failed to save model under {}", output.display()))?;
    info!(path = %path.display(), "Model written");

    report(&model, &config.report_frequencies_mhz)
}

/// Print zenith densities and oblique attenuation/refraction at the window start.
fn report(model: &IonModel, frequencies: &[f64]) -> Result<()> {
    let dt = model.config().start;
    let opts = QueryOptions::new();
    let zenith = SkyDirection::zenith();
    println!(
        "{}  zenith D density {:.3e} m^-3, F density {:.3e} m^-3",
        dt,
        model.ded(zenith, dt, &opts)?,
        model.fed(zenith, dt, &opts)?
    );

    let oblique = SkyDirection::new(30.0, 0.0);
    for &freq in frequencies {
        println!(
            "{:>8.2} MHz  atten(zenith) {:.6}  atten(el 30) {:.6}  refr(el 30) {:.4} deg",
            freq,
            model.atten(zenith, dt, freq, &opts)?,
            model.atten(oblique, dt, freq, &opts)?,
            model.refr(oblique, dt, freq, &opts)?
        );
    }
    Ok(())
}
