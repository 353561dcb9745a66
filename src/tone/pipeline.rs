//! Staged rendering of a sum buffer into the full set of output images

use crate::accumulate::SumBuffer;
use crate::artifact::remove_block_artifacts;
use crate::io::configuration::{ArtifactSettings, ToneSettings};
use crate::io::error::Result;
use crate::io::render::save_tiff16;
use crate::tone::filters::{gamma_correct, gaussian_blur, high_pass, squared};
use crate::tone::scaling::{
    scale_center_min_max, scale_channel_min_max, scale_single_max, scale_single_min_max,
    to_float,
};
use ndarray::{Array3, Axis};
use std::path::{Path, PathBuf};

/// One rendered output of the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderStage {
    /// Scaled by the global maximum
    SingleMax,
    /// Scaled by the global range
    SingleMinMax,
    /// Scaled per channel
    ChannelMinMax,
    /// Gaussian background of the channel-scaled image
    LowPass,
    /// Channel-scaled image minus its background
    HighPass,
    /// Squared high-pass residual
    HighPassSquared,
    /// Log-magnitude spectrum before artifact removal
    SpectrumBefore,
    /// Log-magnitude spectrum after artifact removal
    SpectrumAfter,
}

impl RenderStage {
    /// Stages written by every tone mapping pass, in write order
    pub const TONE_STAGES: [Self; 6] = [
        Self::SingleMax,
        Self::SingleMinMax,
        Self::ChannelMinMax,
        Self::LowPass,
        Self::HighPass,
        Self::HighPassSquared,
    ];

    /// File name following the output prefix
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::SingleMax => "single-max.tiff",
            Self::SingleMinMax => "single-minmax.tiff",
            Self::ChannelMinMax => "channel-minmax.tiff",
            Self::LowPass => "lowpass.tiff",
            Self::HighPass => "highpass.tiff",
            Self::HighPassSquared => "highpass-sq.tiff",
            Self::SpectrumBefore => "dct-spectrum-before.tiff",
            Self::SpectrumAfter => "dct-spectrum-after.tiff",
        }
    }

    /// Full output path for this stage
    pub fn output_path(self, output_dir: &Path, prefix: &str) -> PathBuf {
        output_dir.join(format!("{prefix}{}", self.file_suffix()))
    }
}

/// Result of one tone mapping pass
#[derive(Clone, Debug)]
pub struct ToneOutput {
    /// The channel-scaled image, input to artifact removal
    pub channel_scaled: Array3<f64>,
    /// Every file written, in write order
    pub written: Vec<PathBuf>,
}

/// Renders a buffer under every scaling policy and filter stage
#[derive(Clone, Debug)]
pub struct ToneMapper {
    settings: ToneSettings,
    output_dir: PathBuf,
}

impl ToneMapper {
    /// Create a tone mapper writing into `output_dir`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `settings` fail validation
    pub fn new(settings: ToneSettings, output_dir: impl Into<PathBuf>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            output_dir: output_dir.into(),
        })
    }

    /// Directory receiving rendered files
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one stage under `prefix`, returning its path
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be rendered or saved
    pub fn write(&self, stage: RenderStage, prefix: &str, image: &Array3<f64>) -> Result<PathBuf> {
        let path = stage.output_path(&self.output_dir, prefix);
        save_tiff16(image, &path)?;
        Ok(path)
    }

    /// Render the six tone stages of `image` under `prefix`
    ///
    /// The high-pass output is gamma corrected with the display exponent and
    /// the squared residual with its reciprocal; both are scaled from center
    /// statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage cannot be rendered or saved
    pub fn scale_and_filter(&self, image: &Array3<f64>, prefix: &str) -> Result<ToneOutput> {
        let mut written = Vec::with_capacity(RenderStage::TONE_STAGES.len());

        written.push(self.write(RenderStage::SingleMax, prefix, &scale_single_max(image))?);
        written.push(self.write(
            RenderStage::SingleMinMax,
            prefix,
            &scale_single_min_max(image),
        )?);

        let channel_scaled = scale_channel_min_max(image);
        written.push(self.write(RenderStage::ChannelMinMax, prefix, &channel_scaled)?);

        let sigma = channel_scaled.len_of(Axis(1)) as f64 * self.settings.blur_sigma_factor;
        let low_pass = gaussian_blur(&channel_scaled, sigma);
        written.push(self.write(RenderStage::LowPass, prefix, &low_pass)?);

        let fraction = self.settings.center_fraction;
        let gamma = self.settings.display_gamma;
        let residual = high_pass(&channel_scaled, &low_pass)?;
        written.push(self.write(
            RenderStage::HighPass,
            prefix,
            &gamma_correct(&scale_center_min_max(&residual, fraction), gamma),
        )?);

        let emphasis = squared(&residual);
        written.push(self.write(
            RenderStage::HighPassSquared,
            prefix,
            &gamma_correct(&scale_center_min_max(&emphasis, fraction), gamma.recip()),
        )?);

        Ok(ToneOutput {
            channel_scaled,
            written,
        })
    }
}

/// Full post-processing of a persisted sum buffer
///
/// Renders the buffer, then optionally removes block artifacts from its
/// channel-scaled form and renders the cleaned image again under a second
/// prefix.
#[derive(Clone, Debug)]
pub struct PostProcessor {
    tone: ToneMapper,
    artifact: Option<ArtifactSettings>,
    prefix: String,
    clean_prefix: String,
}

impl PostProcessor {
    /// Create a post-processor; `artifact` of `None` skips deblocking
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the artifact settings fail validation
    pub fn new(
        tone: ToneMapper,
        artifact: Option<ArtifactSettings>,
        prefix: &str,
        clean_prefix: &str,
    ) -> Result<Self> {
        if let Some(settings) = &artifact {
            settings.validate()?;
        }
        Ok(Self {
            tone,
            artifact,
            prefix: prefix.to_string(),
            clean_prefix: clean_prefix.to_string(),
        })
    }

    /// Render every output for `buffer`, returning the written paths
    ///
    /// # Errors
    ///
    /// Returns the first rendering or artifact-removal error
    pub fn process(&self, buffer: &SumBuffer) -> Result<Vec<PathBuf>> {
        let image = to_float(buffer);
        let first = self.tone.scale_and_filter(&image, &self.prefix)?;
        let mut written = first.written;

        if let Some(settings) = &self.artifact {
            let deblocked = remove_block_artifacts(&first.channel_scaled, settings)?;
            written.push(self.tone.write(
                RenderStage::SpectrumBefore,
                &self.prefix,
                &scale_channel_min_max(&deblocked.spectrum_before),
            )?);
            written.push(self.tone.write(
                RenderStage::SpectrumAfter,
                &self.prefix,
                &scale_channel_min_max(&deblocked.spectrum_after),
            )?);

            let cleaned = self
                .tone
                .scale_and_filter(&deblocked.cleaned, &self.clean_prefix)?;
            written.extend(cleaned.written);
        }

        Ok(written)
    }
}
