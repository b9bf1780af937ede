use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use platelocate::batch::{self, ImageSaver};
use platelocate::{DetectorConfig, PipelineContext, PlateLocator, WholeImage};

#[derive(Parser)]
#[command(name = "platelocate")]
#[command(about = "Locate candidate license plate regions in photographs")]
struct Cli {
    /// Input image file or directory of images
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    input: PathBuf,

    /// Directory receiving annotated images
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: PathBuf,

    /// JSON detector configuration (missing fields use defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Configuration problems are fatal before any image is touched
    let config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    let locator = PlateLocator::new(config)?;

    let mut context = PipelineContext::new();
    if let Some(debug_dir) = args.debug_out {
        context = context.with_debug(debug_dir)?;
    }

    let saver = ImageSaver::new(&args.output)?;
    let summary = batch::process_batch(&locator, &WholeImage, &args.input, &saver, &context)?;

    for report in &summary.processed {
        println!("{}", report.path.display());
        for vehicle in &report.vehicles {
            for (idx, bbox) in vehicle.localization.filtered.iter().enumerate() {
                println!("{} {}", idx, bbox);
            }
        }
    }

    if !summary.skipped.is_empty() {
        eprintln!("Skipped {} image(s):", summary.skipped.len());
        for skipped in &summary.skipped {
            eprintln!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    Ok(())
}
