//! Command-line interface for accumulating and rendering average photographs

use crate::accumulate::Coordinator;
use crate::io::configuration::{
    AccumulateSettings, ArtifactSettings, DEFAULT_ARTIFACT_BLOCKS,
    DEFAULT_ARTIFACT_RATIO_THRESHOLD, DEFAULT_BATCH_SIZE_PER_WORKER, DEFAULT_BLUR_SIGMA_FACTOR,
    DEFAULT_BUFFER_FILE, DEFAULT_CANVAS_SIZE, DEFAULT_CENTER_FRACTION, DEFAULT_CLEAN_PREFIX,
    DEFAULT_COMPLETED_DIR, DEFAULT_DISPLAY_GAMMA, DEFAULT_FAILED_DIR, DEFAULT_GAMMA,
    DEFAULT_INPUT_DIR, DEFAULT_INPUT_SUFFIX, DEFAULT_OUTPUT_PREFIX, ResizeMode, ToneSettings,
    default_workers,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::progress::RoundProgress;
use crate::io::storage::BufferStore;
use crate::tone::{PostProcessor, ToneMapper};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "avgphoto")]
#[command(
    author,
    version,
    about = "Build an average photograph from a large image corpus"
)]
/// Command-line arguments for the average photograph tool
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sum every pending image into the persistent buffer
    Sum(SumArgs),
    /// Render the persistent buffer into 16-bit TIFF images
    Render(RenderArgs),
}

/// Arguments of the `sum` subcommand
#[derive(Args, Debug)]
pub struct SumArgs {
    /// Directory of pending images
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    pub input: PathBuf,

    /// Directory receiving summed images
    #[arg(long, default_value = DEFAULT_COMPLETED_DIR)]
    pub completed: PathBuf,

    /// Directory receiving images that could not be summed
    #[arg(long, default_value = DEFAULT_FAILED_DIR)]
    pub failed: PathBuf,

    /// Persistent sum buffer
    #[arg(short, long, default_value = DEFAULT_BUFFER_FILE)]
    pub buffer: PathBuf,

    /// Only filenames with this suffix are summed
    #[arg(long, default_value = DEFAULT_INPUT_SUFFIX)]
    pub suffix: String,

    /// Side length of the square canvas
    #[arg(short, long, default_value_t = DEFAULT_CANVAS_SIZE)]
    pub canvas: usize,

    /// Images per worker per round
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE_PER_WORKER)]
    pub batch_size: usize,

    /// Parallel workers (defaults to available processing units)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Transfer curve exponent removed before summing
    #[arg(short, long, default_value_t = DEFAULT_GAMMA)]
    pub gamma: f64,

    /// Geometry handling for images that do not match the canvas
    #[arg(short, long, value_enum, default_value_t = ResizeMode::Fit)]
    pub resize: ResizeMode,
}

impl SumArgs {
    /// Coordinator settings described by these arguments
    pub fn settings(&self) -> AccumulateSettings {
        AccumulateSettings {
            input_dir: self.input.clone(),
            completed_dir: self.completed.clone(),
            failed_dir: self.failed.clone(),
            buffer_path: self.buffer.clone(),
            suffix: self.suffix.clone(),
            canvas_size: self.canvas,
            batch_size: self.batch_size,
            workers: self.workers.unwrap_or_else(default_workers),
            gamma: self.gamma,
            resize_mode: self.resize,
        }
    }
}

/// Arguments of the `render` subcommand
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Persistent sum buffer
    #[arg(short, long, default_value = DEFAULT_BUFFER_FILE)]
    pub buffer: PathBuf,

    /// Directory receiving rendered images
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Prefix of every rendered file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PREFIX)]
    pub prefix: String,

    /// Prefix of files rendered from the deblocked image
    #[arg(long, default_value = DEFAULT_CLEAN_PREFIX)]
    pub clean_prefix: String,

    /// Gaussian sigma as a fraction of the image width
    #[arg(long, default_value_t = DEFAULT_BLUR_SIGMA_FACTOR)]
    pub blur_sigma: f64,

    /// Fraction of each dimension used for center statistics
    #[arg(long, default_value_t = DEFAULT_CENTER_FRACTION)]
    pub center_fraction: f64,

    /// Gamma exponent of the high-pass output
    #[arg(long, default_value_t = DEFAULT_DISPLAY_GAMMA)]
    pub display_gamma: f64,

    /// Skip block artifact removal
    #[arg(long)]
    pub no_deblock: bool,

    /// Compression blocks per dimension for artifact removal
    #[arg(long, default_value_t = DEFAULT_ARTIFACT_BLOCKS)]
    pub artifact_blocks: usize,

    /// Magnitude ratio below which artifact removal keeps spreading
    #[arg(long, default_value_t = DEFAULT_ARTIFACT_RATIO_THRESHOLD)]
    pub artifact_threshold: f64,
}

impl RenderArgs {
    /// Tone mapping settings described by these arguments
    pub const fn tone_settings(&self) -> ToneSettings {
        ToneSettings {
            blur_sigma_factor: self.blur_sigma,
            center_fraction: self.center_fraction,
            display_gamma: self.display_gamma,
        }
    }

    /// Artifact removal settings, or `None` when deblocking is disabled
    pub const fn artifact_settings(&self) -> Option<ArtifactSettings> {
        if self.no_deblock {
            None
        } else {
            Some(ArtifactSettings {
                blocks: self.artifact_blocks,
                ratio_threshold: self.artifact_threshold,
            })
        }
    }
}

/// Dispatches the parsed command line to the accumulation or render pipeline
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Execute the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns configuration errors before any work starts, and otherwise the
    /// first fatal error of the accumulation or rendering
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Sum(args) => {
                let progress = RoundProgress::new(self.cli.should_show_progress());
                let mut coordinator = Coordinator::open(args.settings(), progress)?;
                coordinator.run()?;
                Ok(())
            }
            Command::Render(args) => {
                let store = BufferStore::new(args.buffer.clone());
                let buffer = store.load()?.ok_or_else(|| {
                    invalid_parameter("buffer", &args.buffer.display(), &"no sum buffer found")
                })?;

                let tone = ToneMapper::new(args.tone_settings(), args.output_dir.clone())?;
                let processor = PostProcessor::new(
                    tone,
                    args.artifact_settings(),
                    &args.prefix,
                    &args.clean_prefix,
                )?;
                let written = processor.process(&buffer)?;
                log::info!("Wrote {} images", written.len());
                Ok(())
            }
        }
    }
}
