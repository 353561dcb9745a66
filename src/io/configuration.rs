//! Tunable constants and validated runtime settings

use crate::io::error::{Result, invalid_parameter};
use std::path::PathBuf;

// Accumulation defaults
/// Side length of the square canvas every image is fitted onto
pub const DEFAULT_CANVAS_SIZE: usize = 1024;
/// Images handed to each worker per round
pub const DEFAULT_BATCH_SIZE_PER_WORKER: usize = 400;
/// Exponent of the sRGB-like transfer curve removed by the LUT
pub const DEFAULT_GAMMA: f64 = 2.2;
/// Fixed-point scale of one linear-light sample (16-bit precision)
pub const LINEAR_FULL_SCALE: u64 = 0xFFFF;
/// Only input names ending with this suffix are summed
pub const DEFAULT_INPUT_SUFFIX: &str = ".jpeg";

// Directory layout
/// Directory holding pending images
pub const DEFAULT_INPUT_DIR: &str = "downloads";
/// Directory receiving images whose contribution is persisted
pub const DEFAULT_COMPLETED_DIR: &str = "completed";
/// Directory receiving images that could not be summed
pub const DEFAULT_FAILED_DIR: &str = "failed";
/// Persisted sum buffer
pub const DEFAULT_BUFFER_FILE: &str = "sum.npy";

// Tone mapping defaults
/// Gaussian sigma as a fraction of the image width
pub const DEFAULT_BLUR_SIGMA_FACTOR: f64 = 0.03;
/// Fraction of each dimension used for center min/max statistics
pub const DEFAULT_CENTER_FRACTION: f64 = 0.2;
/// Exponent applied to the high-pass output (its reciprocal to the squared residual)
pub const DEFAULT_DISPLAY_GAMMA: f64 = 2.2;
/// Kernel radius in sigmas, matching the usual truncation of Gaussian filters
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;
/// Maximum value of a rendered sample
pub const OUTPUT_FULL_SCALE: f64 = 65535.0;

// Artifact removal defaults
/// Compression blocks per image dimension; the hotspot grid spacing is `dim / blocks`
pub const DEFAULT_ARTIFACT_BLOCKS: usize = 8;
/// Neighbor/current magnitude ratio below which the flood-fill keeps spreading
pub const DEFAULT_ARTIFACT_RATIO_THRESHOLD: f64 = 0.5;

// Output naming
/// Prefix of every rendered output
pub const DEFAULT_OUTPUT_PREFIX: &str = "result-";
/// Prefix of outputs rendered from the deblocked image
pub const DEFAULT_CLEAN_PREFIX: &str = "result-clean-";

// Progress display
/// Width of the round progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// How images that do not already match the canvas are treated
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ResizeMode {
    /// Scale the longer side to the canvas and center the result
    Fit,
    /// Reject any image that is not exactly canvas-sized
    ExactOnly,
}

/// Settings for the accumulation coordinator and its workers
#[derive(Clone, Debug)]
pub struct AccumulateSettings {
    /// Directory holding pending images
    pub input_dir: PathBuf,
    /// Directory receiving summed images
    pub completed_dir: PathBuf,
    /// Directory receiving images that failed to decode
    pub failed_dir: PathBuf,
    /// Persisted sum buffer path
    pub buffer_path: PathBuf,
    /// Eligible filename suffix
    pub suffix: String,
    /// Canvas side length
    pub canvas_size: usize,
    /// Images per worker per round
    pub batch_size: usize,
    /// Parallel workers per round
    pub workers: usize,
    /// Transfer curve exponent
    pub gamma: f64,
    /// Geometry handling for images that do not match the canvas
    pub resize_mode: ResizeMode,
}

impl AccumulateSettings {
    /// Default settings rooted at `base`
    pub fn rooted_at(base: &std::path::Path) -> Self {
        Self {
            input_dir: base.join(DEFAULT_INPUT_DIR),
            completed_dir: base.join(DEFAULT_COMPLETED_DIR),
            failed_dir: base.join(DEFAULT_FAILED_DIR),
            buffer_path: base.join(DEFAULT_BUFFER_FILE),
            suffix: DEFAULT_INPUT_SUFFIX.to_string(),
            canvas_size: DEFAULT_CANVAS_SIZE,
            batch_size: DEFAULT_BATCH_SIZE_PER_WORKER,
            workers: default_workers(),
            gamma: DEFAULT_GAMMA,
            resize_mode: ResizeMode::Fit,
        }
    }

    /// Reject settings that cannot produce a meaningful run
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for zero sizes, a non-positive gamma, or
    /// relocation directories that overlap the input directory or each other
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 {
            return Err(invalid_parameter(
                "canvas_size",
                &self.canvas_size,
                &"must be positive",
            ));
        }
        if self.batch_size == 0 {
            return Err(invalid_parameter(
                "batch_size",
                &self.batch_size,
                &"must be positive",
            ));
        }
        if self.workers == 0 {
            return Err(invalid_parameter(
                "workers",
                &self.workers,
                &"must be positive",
            ));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(invalid_parameter(
                "gamma",
                &self.gamma,
                &"must be a positive finite number",
            ));
        }
        if self.suffix.is_empty() {
            return Err(invalid_parameter(
                "suffix",
                &"",
                &"must not be empty",
            ));
        }

        let dirs = [
            ("input_dir", &self.input_dir),
            ("completed_dir", &self.completed_dir),
            ("failed_dir", &self.failed_dir),
        ];
        for (i, &(name, dir)) in dirs.iter().enumerate() {
            for &(_, other) in dirs.iter().skip(i + 1) {
                if dir == other {
                    return Err(invalid_parameter(
                        name,
                        &dir.display(),
                        &"input, completed and failed directories must be distinct",
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Settings for normalization, filtering and output of a sum buffer
#[derive(Clone, Debug)]
pub struct ToneSettings {
    /// Gaussian sigma as a fraction of the image width
    pub blur_sigma_factor: f64,
    /// Fraction of each dimension used for center statistics
    pub center_fraction: f64,
    /// Exponent applied to the high-pass output
    pub display_gamma: f64,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            blur_sigma_factor: DEFAULT_BLUR_SIGMA_FACTOR,
            center_fraction: DEFAULT_CENTER_FRACTION,
            display_gamma: DEFAULT_DISPLAY_GAMMA,
        }
    }
}

impl ToneSettings {
    /// Reject out-of-range tone mapping parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when a factor is outside its usable range
    pub fn validate(&self) -> Result<()> {
        if !(self.blur_sigma_factor.is_finite() && self.blur_sigma_factor > 0.0) {
            return Err(invalid_parameter(
                "blur_sigma_factor",
                &self.blur_sigma_factor,
                &"must be a positive finite number",
            ));
        }
        if !(self.center_fraction > 0.0 && self.center_fraction <= 1.0) {
            return Err(invalid_parameter(
                "center_fraction",
                &self.center_fraction,
                &"must be in (0, 1]",
            ));
        }
        if !(self.display_gamma.is_finite() && self.display_gamma > 0.0) {
            return Err(invalid_parameter(
                "display_gamma",
                &self.display_gamma,
                &"must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// Settings for the frequency-domain block artifact remover
#[derive(Clone, Copy, Debug)]
pub struct ArtifactSettings {
    /// Compression blocks per dimension
    pub blocks: usize,
    /// Magnitude ratio below which the flood-fill spreads
    pub ratio_threshold: f64,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            blocks: DEFAULT_ARTIFACT_BLOCKS,
            ratio_threshold: DEFAULT_ARTIFACT_RATIO_THRESHOLD,
        }
    }
}

impl ArtifactSettings {
    /// Reject unusable grid or threshold values
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero block count or a negative or
    /// non-finite threshold
    pub fn validate(&self) -> Result<()> {
        if self.blocks == 0 {
            return Err(invalid_parameter(
                "blocks",
                &self.blocks,
                &"must be positive",
            ));
        }
        if !(self.ratio_threshold.is_finite() && self.ratio_threshold >= 0.0) {
            return Err(invalid_parameter(
                "ratio_threshold",
                &self.ratio_threshold,
                &"must be a non-negative finite number",
            ));
        }
        Ok(())
    }
}

/// One worker per available processing unit
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZero::get)
}
