//! Min/max normalization policies mapping a buffer onto `[0, 1]`

use ndarray::{Array3, ArrayView3, Axis, Slice, Zip};
use num_traits::ToPrimitive;

/// How the minimum and maximum of a normalization are chosen
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalePolicy {
    /// Divide by the global maximum, minimum fixed at zero
    SingleMax,
    /// Global minimum and maximum shared by every channel
    SingleMinMax,
    /// Per-channel minimum and maximum over the whole image
    ChannelMinMax,
    /// Per-channel minimum and maximum over a centered sub-rectangle
    CenterMinMax {
        /// Fraction of each dimension covered by the sub-rectangle
        fraction: f64,
    },
}

impl ScalePolicy {
    /// Normalize `image` under this policy
    pub fn apply(self, image: &Array3<f64>) -> Array3<f64> {
        let range = match self {
            Self::SingleMax => ChannelRange::single_max(image.view()),
            Self::SingleMinMax => ChannelRange::single_min_max(image.view()),
            Self::ChannelMinMax => ChannelRange::per_channel(image.view()),
            Self::CenterMinMax { fraction } => {
                ChannelRange::per_channel(center_region(image.view(), fraction))
            }
        };
        scale_image(image, &range)
    }
}

/// Minimum and maximum used for each channel
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelRange {
    /// Value mapped to 0.0, one per channel
    pub min: Vec<f64>,
    /// Value mapped to 1.0, one per channel
    pub max: Vec<f64>,
}

impl ChannelRange {
    /// Zero to the global maximum, for every channel
    pub fn single_max(image: ArrayView3<'_, f64>) -> Self {
        let (_, max) = extremes(image.iter().copied());
        let channels = image.len_of(Axis(2));
        Self {
            min: vec![0.0; channels],
            max: vec![max; channels],
        }
    }

    /// Global minimum to global maximum, for every channel
    pub fn single_min_max(image: ArrayView3<'_, f64>) -> Self {
        let (min, max) = extremes(image.iter().copied());
        let channels = image.len_of(Axis(2));
        Self {
            min: vec![min; channels],
            max: vec![max; channels],
        }
    }

    /// Each channel's own minimum and maximum
    pub fn per_channel(image: ArrayView3<'_, f64>) -> Self {
        let (min, max) = image
            .axis_iter(Axis(2))
            .map(|channel| extremes(channel.iter().copied()))
            .unzip();
        Self { min, max }
    }
}

// An empty input yields (0, 0), which scales as a degenerate range
fn extremes(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max { (0.0, 0.0) } else { (min, max) }
}

/// Map each channel linearly so `range.min` becomes 0 and `range.max` 1
///
/// A channel whose range is empty or not finite maps to all zeros instead of
/// dividing by zero.
pub fn scale_image(image: &Array3<f64>, range: &ChannelRange) -> Array3<f64> {
    log::debug!("Value range [{:?}, {:?}]", range.min, range.max);
    let mut scaled = Array3::zeros(image.raw_dim());
    for (channel, (mut out, input)) in scaled
        .axis_iter_mut(Axis(2))
        .zip(image.axis_iter(Axis(2)))
        .enumerate()
    {
        let min = range.min.get(channel).copied().unwrap_or(0.0);
        let max = range.max.get(channel).copied().unwrap_or(0.0);
        let span = max - min;
        if !(span.is_finite() && span > 0.0) {
            continue;
        }
        Zip::from(&mut out)
            .and(&input)
            .for_each(|o, &v| *o = (v - min) / span);
    }
    scaled
}

/// The centered sub-rectangle covering `fraction` of each spatial dimension
///
/// At least one row and one column are kept for non-empty images.
pub fn center_region(image: ArrayView3<'_, f64>, fraction: f64) -> ArrayView3<'_, f64> {
    let (height, width, _) = image.dim();
    let (row_start, rows) = centered_span(height, fraction);
    let (col_start, cols) = centered_span(width, fraction);
    image
        .slice_axis_move(Axis(0), Slice::from(row_start..row_start + rows))
        .slice_axis_move(Axis(1), Slice::from(col_start..col_start + cols))
}

fn centered_span(length: usize, fraction: f64) -> (usize, usize) {
    if length == 0 {
        return (0, 0);
    }
    let span = ((length as f64 * fraction).floor() as usize).clamp(1, length);
    ((length - span) / 2, span)
}

/// Convert any numeric buffer to `f64`, mapping unrepresentable values to zero
pub fn to_float<T: ToPrimitive>(buffer: &Array3<T>) -> Array3<f64> {
    buffer.map(|value| value.to_f64().unwrap_or(0.0))
}

/// Divide by the global maximum
pub fn scale_single_max(image: &Array3<f64>) -> Array3<f64> {
    ScalePolicy::SingleMax.apply(image)
}

/// Subtract the global minimum and divide by the global range
pub fn scale_single_min_max(image: &Array3<f64>) -> Array3<f64> {
    ScalePolicy::SingleMinMax.apply(image)
}

/// Scale each channel by its own range, exposing relative color balance
pub fn scale_channel_min_max(image: &Array3<f64>) -> Array3<f64> {
    ScalePolicy::ChannelMinMax.apply(image)
}

/// Like [`scale_channel_min_max`] with statistics from the image center only
///
/// Edges may oversaturate, leaving more dynamic range for the center.
pub fn scale_center_min_max(image: &Array3<f64>, fraction: f64) -> Array3<f64> {
    ScalePolicy::CenterMinMax { fraction }.apply(image)
}
