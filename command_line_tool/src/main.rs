mod debug_overlay;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::{GrayImage, RgbImage, RgbaImage};
use pixelstitch::photo::Photo;
use pixelstitch::{AssociationPolicy, NoopObserver, StitchConfig, StitchPipeline};
use tracing::info;

use crate::debug_overlay::DebugOverlay;

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "CLI for stitching two translated photos into one canvas.")]
struct Args {
    /// First (left/top) photo filename
    #[arg()]
    photo1: PathBuf,

    /// Second (right/bottom) photo filename
    #[arg()]
    photo2: PathBuf,

    /// Optionally write the stitched canvas; the format follows the file extension
    #[arg()]
    output: Option<PathBuf>,

    /// JSON file with stitching parameters. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Normalized cornerness (0-255) a pixel must exceed to become a corner
    #[arg(long)]
    corner_threshold: Option<f32>,

    /// Patch half-size used when comparing corners
    #[arg(long)]
    window_size: Option<usize>,

    /// Patch SSD below which two corners are candidate matches
    #[arg(long)]
    ssd_threshold: Option<f64>,

    /// Which below-threshold candidate a corner keeps:
    /// - minimum: the one with the smallest SSD.
    /// - last: the last one examined.
    #[arg(long, value_enum)]
    association_policy: Option<PolicyArg>,

    /// Write corner, match and canvas overlays into this directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Minimum,
    Last,
}

impl From<PolicyArg> for AssociationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Minimum => AssociationPolicy::MinimumBelowThreshold,
            PolicyArg::Last => AssociationPolicy::LastBelowThreshold,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let pipeline = StitchPipeline::new(config)?;

    let photo1 = read_photo(&args.photo1)?;
    let photo2 = read_photo(&args.photo2)?;

    let result = match &args.debug_dir {
        Some(dir) => {
            let mut overlay = DebugOverlay::new(dir)?;
            let result = pipeline.run(&photo1, &photo2, &mut overlay);
            overlay.finish()?;
            result?
        }
        None => pipeline.run(&photo1, &photo2, &mut NoopObserver)?,
    };

    println!(
        "Offset dx={} dy={} from {} matches",
        result.offset.dx,
        result.offset.dy,
        result.matches.len()
    );

    if let Some(output) = &args.output {
        save_photo(&result.canvas, output)?;
    }

    info!("Done.");
    Ok(())
}

/// Loads the optional JSON config and applies command line overrides on top.
fn build_config(args: &Args) -> Result<StitchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {}", path.display()))?;
            serde_json::from_str::<StitchConfig>(&text)
                .with_context(|| format!("Could not parse config file {}", path.display()))?
        }
        None => StitchConfig::default(),
    };

    if let Some(threshold) = args.corner_threshold {
        config.corners.threshold = threshold;
    }
    if let Some(window_size) = args.window_size {
        config.matching.window_size = window_size;
    }
    if let Some(ssd_threshold) = args.ssd_threshold {
        config.matching.ssd_threshold = ssd_threshold;
    }
    if let Some(policy) = args.association_policy {
        config.matching.policy = policy.into();
    }
    Ok(config)
}

pub fn save_photo(photo: &Photo, filename: &Path) -> Result<()> {
    info!("Writing image {}", filename.display());
    let (width, height) = (photo.width as u32, photo.height as u32);
    let data = photo.data().to_vec();
    let saved = match photo.channels {
        1 => GrayImage::from_raw(width, height, data).map(|img| img.save(filename)),
        3 => RgbImage::from_raw(width, height, data).map(|img| img.save(filename)),
        4 => RgbaImage::from_raw(width, height, data).map(|img| img.save(filename)),
        n => anyhow::bail!("Cannot encode a photo with {n} channels"),
    };
    saved
        .context("Photo buffer does not match its dimensions")?
        .with_context(|| format!("Could not write image {}", filename.display()))
}

pub fn read_photo(filename: &Path) -> Result<Photo> {
    info!("Reading image file: {}", filename.display());
    let img = image::open(filename)
        .with_context(|| format!("Could not load image {}", filename.display()))?
        .to_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    Ok(Photo::new(img.into_raw(), width, height, 3)?)
}
