//! Gamma-to-linear lookup table for 8-bit channel values

use crate::io::configuration::LINEAR_FULL_SCALE;

/// Precomputed mapping from an 8-bit gamma-encoded value to linear light
///
/// Entries are fixed-point with `LINEAR_FULL_SCALE` as unity and stored as
/// `u64` so that millions of them can be summed without overflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearizationTable {
    entries: [u64; 256],
}

impl LinearizationTable {
    /// Build the table for a transfer curve exponent at 16-bit precision
    pub fn new(gamma: f64) -> Self {
        Self::with_full_scale(gamma, LINEAR_FULL_SCALE)
    }

    /// Build the table for an arbitrary fixed-point scale
    pub fn with_full_scale(gamma: f64, full_scale: u64) -> Self {
        let mut entries = [0_u64; 256];
        let scale = full_scale as f64;
        for (value, entry) in entries.iter_mut().enumerate() {
            let normalized = value as f64 / 255.0;
            *entry = (normalized.powf(gamma) * scale).round() as u64;
        }
        Self { entries }
    }

    /// Linear magnitude of one encoded channel value
    #[inline]
    pub fn lookup(&self, value: u8) -> u64 {
        self.entries.get(usize::from(value)).copied().unwrap_or(0)
    }

    /// All 256 entries in encoded-value order
    pub const fn entries(&self) -> &[u64; 256] {
        &self.entries
    }
}
