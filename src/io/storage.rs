//! Durable storage of the sum buffer as a single `.npy` file

use crate::accumulate::{SumBuffer, zeroed_buffer};
use crate::io::error::{AverageError, Result, WithPath};
use ndarray_npy::WriteNpyExt;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Location of the persisted sum buffer
#[derive(Clone, Debug)]
pub struct BufferStore {
    path: PathBuf,
}

impl BufferStore {
    /// Create a store for the buffer file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the persisted buffer
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted buffer, or `None` if nothing has been persisted yet
    ///
    /// # Errors
    ///
    /// Returns `BufferLoad` if the file exists but is not a `u64` array of
    /// rank 3
    pub fn load(&self) -> Result<Option<SumBuffer>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let buffer: SumBuffer = ndarray_npy::read_npy(&self.path).with_path(&self.path)?;
        Ok(Some(buffer))
    }

    /// Load the persisted buffer or start from zero for a square canvas
    ///
    /// # Errors
    ///
    /// Returns `BufferLoad` for an unreadable file and `BufferShape` when the
    /// persisted shape differs from the canvas
    pub fn load_or_zeroed(&self, canvas_size: usize) -> Result<SumBuffer> {
        let expected = (canvas_size, canvas_size, 3);
        match self.load()? {
            Some(buffer) if buffer.dim() == expected => {
                log::info!("Loaded sum buffer from {}", self.path.display());
                Ok(buffer)
            }
            Some(buffer) => Err(AverageError::BufferShape {
                expected,
                actual: buffer.dim(),
            }),
            None => {
                log::info!("Creating new {canvas_size}x{canvas_size} sum buffer");
                Ok(zeroed_buffer(canvas_size))
            }
        }
    }

    /// Replace the persisted buffer with `buffer`
    ///
    /// The array is written and synced to a sibling temporary file which is
    /// then renamed over the target, so readers only ever see a complete
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns `BufferSave` or `FileSystem` if any step fails; the previous
    /// persisted buffer is left untouched in that case
    pub fn save(&self, buffer: &SumBuffer) -> Result<()> {
        let staging = self.staging_path();
        let fs_error = |operation: &'static str| {
            let path = staging.clone();
            move |source| AverageError::FileSystem {
                path,
                operation,
                source,
            }
        };

        let file = File::create(&staging).map_err(fs_error("create"))?;
        let mut writer = BufWriter::new(file);
        buffer.write_npy(&mut writer).with_path(&staging)?;
        let file = writer
            .into_inner()
            .map_err(|e| fs_error("flush")(e.into_error()))?;
        file.sync_all().map_err(fs_error("sync"))?;

        fs::rename(&staging, &self.path).map_err(|e| AverageError::FileSystem {
            path: self.path.clone(),
            operation: "replace",
            source: e,
        })?;

        log::debug!("Persisted sum buffer to {}", self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("sum"), ToOwned::to_owned);
        name.push(".partial");
        self.path.with_file_name(name)
    }
}
