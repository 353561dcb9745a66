//! Average photograph builder
//!
//! Folds a stream of images into a persistent 64-bit linear-light sum buffer
//! using a pool of parallel workers with checkpoint/resume semantics, then
//! tone maps the buffer into 16-bit images and optionally removes the periodic
//! signature block compression leaves in the average.

#![forbid(unsafe_code)]

/// Linearization, normalization and the parallel accumulation rounds
pub mod accumulate;
/// Frequency-domain block artifact removal
pub mod artifact;
/// Input/output operations, configuration and error handling
pub mod io;
/// Scaling policies, filters and rendering of sum buffers
pub mod tone;

pub use io::error::{AverageError, Result};
