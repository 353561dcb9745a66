//! Per-channel 2-D Fourier transforms of image buffers

use ndarray::{Array3, Axis, Zip};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// Complex spectrum of every channel, shape `(height, width, channels)`
pub type FrequencyField = Array3<Complex<f64>>;

fn transform_axis(field: &mut FrequencyField, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    Zip::from(field.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut scratch: Vec<Complex<f64>> = lane.iter().copied().collect();
        fft.process(&mut scratch);
        for (slot, value) in lane.iter_mut().zip(scratch) {
            *slot = value;
        }
    });
}

fn transform(field: &mut FrequencyField, direction: FftDirection) {
    let (height, width, _) = field.dim();
    if height == 0 || width == 0 {
        return;
    }
    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft(width, direction);
    let col_fft = planner.plan_fft(height, direction);
    transform_axis(field, Axis(1), &row_fft);
    transform_axis(field, Axis(0), &col_fft);
}

/// Forward transform of each channel over both spatial axes
pub fn forward(image: &Array3<f64>) -> FrequencyField {
    let mut field = image.mapv(|v| Complex::new(v, 0.0));
    transform(&mut field, FftDirection::Forward);
    field
}

/// Inverse transform back to real samples
///
/// The output is normalized by the sample count. Imaginary parts are only
/// rounding residue while edits keep the field conjugate symmetric, and are
/// dropped.
pub fn inverse(field: &FrequencyField) -> Array3<f64> {
    let (height, width, _) = field.dim();
    let mut spatial = field.clone();
    transform(&mut spatial, FftDirection::Inverse);
    let scale = 1.0 / (height * width).max(1) as f64;
    spatial.mapv(|v| v.re * scale)
}

/// `ln(|F| + 1)` per coefficient, for viewing a spectrum
pub fn log_magnitude(field: &FrequencyField) -> Array3<f64> {
    field.mapv(|v| v.norm().ln_1p())
}
