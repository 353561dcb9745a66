//! Decodes one input image and fits it onto the square canvas

use crate::io::configuration::ResizeMode;
use crate::io::error::{AverageError, Result, WithPath, invalid_parameter};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

/// An RGB image ready to be summed, with its placement on the canvas
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Pixels after color conversion and resizing
    pub pixels: RgbImage,
    /// Top-left placement on the canvas as (row, column)
    pub offset: (usize, usize),
}

impl NormalizedImage {
    /// Placed width in pixels
    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    /// Placed height in pixels
    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }
}

/// Decode `path` and fit it onto a `canvas_size` square
///
/// # Errors
///
/// Returns `ImageLoad` when the file cannot be read or decoded and
/// `GeometryMismatch` when the image cannot be placed under `mode`; both are
/// decode failures. Returns `InvalidParameter` if the canvas does not fit in
/// image coordinates.
pub fn normalize_image(path: &Path, canvas_size: usize, mode: ResizeMode) -> Result<NormalizedImage> {
    let canvas = u32::try_from(canvas_size)
        .map_err(|_overflow| invalid_parameter("canvas_size", &canvas_size, &"exceeds u32"))?;

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .with_path(path)?;
    let decoded = reader.decode().with_path(path)?;

    // Conversion copies the pixels, so it only happens for non-RGB sources
    let rgb = match decoded {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.into_rgb8(),
    };

    let (width, height) = rgb.dimensions();
    let mismatch = || AverageError::GeometryMismatch {
        path: path.to_path_buf(),
        expected: (canvas, canvas),
        actual: (width, height),
    };

    if width == 0 || height == 0 {
        return Err(mismatch());
    }

    let pixels = match mode {
        ResizeMode::ExactOnly => {
            if width != canvas || height != canvas {
                return Err(mismatch());
            }
            rgb
        }
        ResizeMode::Fit => fit_longer_side(rgb, canvas),
    };

    let offset = (
        ((canvas - pixels.height()) / 2) as usize,
        ((canvas - pixels.width()) / 2) as usize,
    );

    Ok(NormalizedImage { pixels, offset })
}

/// Scale uniformly so the longer side equals `canvas`
fn fit_longer_side(rgb: RgbImage, canvas: u32) -> RgbImage {
    let (width, height) = rgb.dimensions();
    let longer = width.max(height);
    if longer == canvas {
        return rgb;
    }

    let ratio = f64::from(canvas) / f64::from(longer);
    let scaled_width = ((f64::from(width) * ratio) as u32).clamp(1, canvas);
    let scaled_height = ((f64::from(height) * ratio) as u32).clamp(1, canvas);

    imageops::resize(&rgb, scaled_width, scaled_height, FilterType::Lanczos3)
}
