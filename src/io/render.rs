//! 16-bit TIFF export of normalized floating-point images

use crate::io::configuration::OUTPUT_FULL_SCALE;
use crate::io::error::{AverageError, Result, computation_error};
use image::{ImageBuffer, ImageFormat, Rgb};
use ndarray::Array3;
use std::path::Path;

/// Convert `[0, 1]` samples to 16-bit fixed point in row-major order
///
/// Values are scaled by the 16-bit maximum, clamped and truncated; NaN maps
/// to zero.
pub fn to_u16_samples(image: &Array3<f64>) -> Vec<u16> {
    image
        .iter()
        .map(|&value| (value * OUTPUT_FULL_SCALE).clamp(0.0, OUTPUT_FULL_SCALE) as u16)
        .collect()
}

/// Write a `(height, width, 3)` image in `[0, 1]` as a 16-bit RGB TIFF
///
/// # Errors
///
/// Returns an error if:
/// - The image does not have exactly three channels
/// - The dimensions do not fit in image coordinates
/// - The parent directory cannot be created
/// - The file cannot be encoded or written
pub fn save_tiff16(image: &Array3<f64>, output_path: &Path) -> Result<()> {
    let (height, width, channels) = image.dim();
    if channels != 3 {
        return Err(computation_error(
            "render",
            &format!("expected 3 channels, found {channels}"),
        ));
    }
    let width = u32::try_from(width)
        .map_err(|_overflow| computation_error("render", &"width exceeds u32"))?;
    let height = u32::try_from(height)
        .map_err(|_overflow| computation_error("render", &"height exceeds u32"))?;

    let img: ImageBuffer<Rgb<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, to_u16_samples(image)).ok_or_else(|| {
            computation_error("render", &"sample count does not match dimensions")
        })?;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AverageError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    log::info!("Writing {}", output_path.display());
    img.save_with_format(output_path, ImageFormat::Tiff)
        .map_err(|e| AverageError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
