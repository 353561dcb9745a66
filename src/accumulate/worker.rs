//! Folds one batch of input images into a private sum buffer

use crate::accumulate::lut::LinearizationTable;
use crate::accumulate::normalize::{NormalizedImage, normalize_image};
use crate::accumulate::{SumBuffer, zeroed_buffer};
use crate::io::configuration::{AccumulateSettings, ResizeMode};
use crate::io::error::{Result, computation_error};
use std::path::PathBuf;

/// Input filenames owned by one worker for one round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    /// Filenames relative to the input directory, in processing order
    pub names: Vec<String>,
}

impl Batch {
    /// Create a batch from filenames
    pub const fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Number of filenames in the batch
    pub const fn len(&self) -> usize {
        self.names.len()
    }

    /// Test if the batch has no filenames
    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Split filenames round-robin into at most `workers` non-empty batches
pub fn partition_round_robin(names: Vec<String>, workers: usize) -> Vec<Batch> {
    let workers = workers.max(1);
    let mut batches = vec![Batch::default(); workers];
    for (index, name) in names.into_iter().enumerate() {
        if let Some(batch) = batches.get_mut(index % workers) {
            batch.names.push(name);
        }
    }
    batches.retain(|batch| !batch.is_empty());
    batches
}

/// An input file that could not be summed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedItem {
    /// Filename relative to the input directory
    pub name: String,
    /// Human-readable failure classification
    pub reason: String,
}

/// A worker's private contribution for one round
#[derive(Clone, Debug)]
pub struct PartialResult {
    /// Sum of every successfully normalized image in the batch
    pub buffer: SumBuffer,
    /// Filenames folded into `buffer`
    pub completed: Vec<String>,
    /// Filenames that failed to decode or place
    pub failed: Vec<FailedItem>,
}

/// Normalizes batches into private buffers
///
/// Holds only immutable state, so one accumulator can be shared by every
/// worker thread of a round.
#[derive(Clone, Debug)]
pub struct BatchAccumulator {
    input_dir: PathBuf,
    canvas_size: usize,
    resize_mode: ResizeMode,
    gamma: f64,
}

impl BatchAccumulator {
    /// Create an accumulator reading from `input_dir`
    pub const fn new(
        input_dir: PathBuf,
        canvas_size: usize,
        resize_mode: ResizeMode,
        gamma: f64,
    ) -> Self {
        Self {
            input_dir,
            canvas_size,
            resize_mode,
            gamma,
        }
    }

    /// Create an accumulator from coordinator settings
    pub fn from_settings(settings: &AccumulateSettings) -> Self {
        Self::new(
            settings.input_dir.clone(),
            settings.canvas_size,
            settings.resize_mode,
            settings.gamma,
        )
    }

    /// Sum every image of `batch` into a fresh buffer
    ///
    /// Decode failures are recorded and skipped; `on_item` is called once per
    /// filename regardless of outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that are not specific to one image,
    /// such as an unrepresentable canvas size
    pub fn accumulate(&self, batch: &Batch, on_item: impl Fn()) -> Result<PartialResult> {
        let lut = LinearizationTable::new(self.gamma);
        let mut buffer = zeroed_buffer(self.canvas_size);
        let mut completed = Vec::with_capacity(batch.len());
        let mut failed = Vec::new();

        for name in &batch.names {
            let path = self.input_dir.join(name);
            match normalize_image(&path, self.canvas_size, self.resize_mode) {
                Ok(image) => {
                    add_linear(&mut buffer, &image, &lut)?;
                    completed.push(name.clone());
                }
                Err(error) if error.is_decode_failure() => {
                    log::warn!("{name}: {error}");
                    failed.push(FailedItem {
                        name: name.clone(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
            on_item();
        }

        Ok(PartialResult {
            buffer,
            completed,
            failed,
        })
    }
}

/// Add the linearized pixels of `image` at its canvas offset
///
/// Pixels falling outside the buffer are ignored; the letterbox border keeps
/// whatever the buffer already held.
///
/// # Errors
///
/// Returns `Computation` if an element would overflow; earlier pixels of the
/// image stay added
pub fn add_linear(
    buffer: &mut SumBuffer,
    image: &NormalizedImage,
    lut: &LinearizationTable,
) -> Result<()> {
    let (row_offset, col_offset) = image.offset;
    for (x, y, pixel) in image.pixels.enumerate_pixels() {
        let row = row_offset + y as usize;
        let col = col_offset + x as usize;
        for (channel, &value) in pixel.0.iter().enumerate() {
            if let Some(cell) = buffer.get_mut([row, col, channel]) {
                *cell = cell.checked_add(lut.lookup(value)).ok_or_else(|| {
                    computation_error("accumulate", &"sum buffer element overflowed u64")
                })?;
            }
        }
    }
    Ok(())
}
