//! Tone mapping of accumulated buffers into displayable 16-bit images

/// Gaussian low-pass, residual and gamma operators
pub mod filters;
/// Staged rendering of every output image
pub mod pipeline;
/// Min/max normalization policies
pub mod scaling;

pub use pipeline::{PostProcessor, RenderStage, ToneMapper};
pub use scaling::ScalePolicy;
