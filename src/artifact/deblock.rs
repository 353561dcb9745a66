//! Complete artifact-removal pass from scaled image to cleaned image

use crate::artifact::flood::{FloodReport, flood_fill};
use crate::artifact::spectrum::{forward, inverse, log_magnitude};
use crate::io::configuration::ArtifactSettings;
use crate::io::error::Result;
use ndarray::Array3;

/// Output of [`remove_block_artifacts`]
#[derive(Clone, Debug)]
pub struct Deblocked {
    /// Image with the block-artifact spectrum removed
    pub cleaned: Array3<f64>,
    /// `ln(|F| + 1)` before the flood-fill
    pub spectrum_before: Array3<f64>,
    /// `ln(|F| + 1)` after the flood-fill
    pub spectrum_after: Array3<f64>,
    /// What the flood-fill touched
    pub report: FloodReport,
}

/// Remove the periodic block-compression signature from a scaled image
///
/// # Errors
///
/// Returns `InvalidParameter` if `settings` fail validation
pub fn remove_block_artifacts(scaled: &Array3<f64>, settings: &ArtifactSettings) -> Result<Deblocked> {
    settings.validate()?;
    log::info!("Removing block artifacts");

    let mut field = forward(scaled);
    let spectrum_before = log_magnitude(&field);
    let report = flood_fill(&mut field, settings);
    log::info!(
        "Flood-fill nulled {} coefficients from {} seeds",
        report.nulled.len(),
        report.seeds
    );
    let spectrum_after = log_magnitude(&field);

    Ok(Deblocked {
        cleaned: inverse(&field),
        spectrum_before,
        spectrum_after,
        report,
    })
}
