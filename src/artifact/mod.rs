//! Frequency-domain removal of periodic block-compression artifacts

/// End-to-end pass producing the cleaned image and spectrum diagnostics
pub mod deblock;
/// Hotspot seeding and flood-fill over the frequency grid
pub mod flood;
/// Forward and inverse 2-D transforms
pub mod spectrum;

pub use deblock::{Deblocked, remove_block_artifacts};
pub use spectrum::FrequencyField;
