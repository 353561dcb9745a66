//! Linear-light accumulation of an image corpus into a persistent sum buffer

/// Parallel round loop: partition, dispatch, merge, persist, relocate
pub mod coordinator;
/// Gamma-to-linear lookup table
pub mod lut;
/// Decoding and canvas fitting of a single input image
pub mod normalize;
/// Per-batch accumulation into a private buffer
pub mod worker;

use ndarray::Array3;

pub use coordinator::{Coordinator, Phase, RoundReport, RunSummary};
pub use lut::LinearizationTable;
pub use worker::{Batch, BatchAccumulator, FailedItem, PartialResult};

/// Accumulated linear-light energy, shape `(height, width, 3)`
pub type SumBuffer = Array3<u64>;

/// Zero-filled sum buffer for a square canvas
pub fn zeroed_buffer(canvas_size: usize) -> SumBuffer {
    Array3::zeros((canvas_size, canvas_size, 3))
}
