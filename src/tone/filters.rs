//! Separable Gaussian low-pass, residual and gamma operators

use crate::io::configuration::GAUSSIAN_TRUNCATE;
use crate::io::error::{AverageError, Result};
use ndarray::{Array3, ArrayView1, ArrayViewMut1, Axis, Zip};

/// Normalized 1-D Gaussian weights covering `GAUSSIAN_TRUNCATE` sigmas each side
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as usize;
    let denominator = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / denominator).exp()
        })
        .collect();
    let total: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= total;
    }
    kernel
}

/// Mirror an out-of-range index back into `0..length`
///
/// The edge sample is repeated (`d c b a | a b c d | d c b a`), and indices
/// more than one period away keep folding.
pub const fn reflect_index(index: isize, length: usize) -> usize {
    let length = length as isize;
    let period = 2 * length;
    let folded = index.rem_euclid(period);
    if folded < length {
        folded as usize
    } else {
        (period - 1 - folded) as usize
    }
}

fn convolve_lane(input: ArrayView1<'_, f64>, mut output: ArrayViewMut1<'_, f64>, kernel: &[f64]) {
    let length = input.len();
    let radius = (kernel.len() / 2) as isize;
    for (i, out) in output.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &weight) in kernel.iter().enumerate() {
            let source = reflect_index(i as isize + k as isize - radius, length);
            acc += weight * input.get(source).copied().unwrap_or(0.0);
        }
        *out = acc;
    }
}

fn convolve_axis(image: &Array3<f64>, axis: Axis, kernel: &[f64]) -> Array3<f64> {
    let mut output = Array3::zeros(image.raw_dim());
    Zip::from(output.lanes_mut(axis))
        .and(image.lanes(axis))
        .par_for_each(|out, input| convolve_lane(input, out, kernel));
    output
}

/// Blur every channel independently with a Gaussian of standard deviation `sigma`
///
/// Rows and columns are filtered separately with reflected borders. A
/// non-positive or non-finite sigma, or an empty image, returns a copy.
pub fn gaussian_blur(image: &Array3<f64>, sigma: f64) -> Array3<f64> {
    if !(sigma.is_finite() && sigma > 0.0) || image.is_empty() {
        return image.clone();
    }
    log::debug!("Blurring with sigma {sigma:.2}");
    let kernel = gaussian_kernel(sigma);
    let rows_blurred = convolve_axis(image, Axis(1), &kernel);
    convolve_axis(&rows_blurred, Axis(0), &kernel)
}

/// Residual of `scaled` after removing its low-pass background
///
/// # Errors
///
/// Returns `BufferShape` if the two images differ in shape
pub fn high_pass(scaled: &Array3<f64>, low_pass: &Array3<f64>) -> Result<Array3<f64>> {
    if scaled.dim() != low_pass.dim() {
        return Err(AverageError::BufferShape {
            expected: scaled.dim(),
            actual: low_pass.dim(),
        });
    }
    Ok(scaled - low_pass)
}

/// Square every sample, emphasizing large residuals
pub fn squared(residual: &Array3<f64>) -> Array3<f64> {
    residual.mapv(|v| v * v)
}

/// Clip to `[0, 1]` and raise to `exponent`
pub fn gamma_correct(image: &Array3<f64>, exponent: f64) -> Array3<f64> {
    image.mapv(|v| v.clamp(0.0, 1.0).powf(exponent))
}
