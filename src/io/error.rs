//! Error types and path context for accumulation and rendering operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all accumulation and post-processing operations
#[derive(Debug)]
pub enum AverageError {
    /// Failed to decode an input image
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Decoded image does not fit the canvas it must be summed into
    GeometryMismatch {
        /// Path to the image file
        path: PathBuf,
        /// Required dimensions (width, height)
        expected: (u32, u32),
        /// Decoded dimensions (width, height)
        actual: (u32, u32),
    },

    /// Failed to save a rendered image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// Persisted sum buffer could not be read
    BufferLoad {
        /// Path to the buffer file
        path: PathBuf,
        /// Underlying npy decoding error
        source: ndarray_npy::ReadNpyError,
    },

    /// Sum buffer could not be written
    BufferSave {
        /// Path to the buffer file
        path: PathBuf,
        /// Underlying npy encoding error
        source: ndarray_npy::WriteNpyError,
    },

    /// Two buffers that must agree in shape do not
    BufferShape {
        /// Shape required by the current configuration
        expected: (usize, usize, usize),
        /// Shape actually found
        actual: (usize, usize, usize),
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl AverageError {
    /// Whether this error only concerns a single input image
    ///
    /// Decode failures are recovered by moving the offending file aside;
    /// everything else aborts the current round.
    pub const fn is_decode_failure(&self) -> bool {
        matches!(self, Self::ImageLoad { .. } | Self::GeometryMismatch { .. })
    }
}

impl fmt::Display for AverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::GeometryMismatch {
                path,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Image '{}' is {}x{}, expected {}x{}",
                    path.display(),
                    actual.0,
                    actual.1,
                    expected.0,
                    expected.1
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::BufferLoad { path, source } => {
                write!(
                    f,
                    "Failed to load sum buffer '{}': {source}",
                    path.display()
                )
            }
            Self::BufferSave { path, source } => {
                write!(
                    f,
                    "Failed to save sum buffer '{}': {source}",
                    path.display()
                )
            }
            Self::BufferShape { expected, actual } => {
                write!(
                    f,
                    "Sum buffer shape {}x{}x{} does not match expected {}x{}x{}",
                    actual.0, actual.1, actual.2, expected.0, expected.1, expected.2
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for AverageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::BufferLoad { source, .. } => Some(source),
            Self::BufferSave { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for crate results
pub type Result<T> = std::result::Result<T, AverageError>;

const UNKNOWN_PATH: &str = "<unknown>";

/// Attaches the path an operation was working on to its error
pub trait WithPath<T> {
    /// Replace the placeholder path left by a `From` conversion
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path applied
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T, E> WithPath<T> for std::result::Result<T, E>
where
    E: Into<AverageError>,
{
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            match &mut error {
                AverageError::ImageLoad { path: slot, .. }
                | AverageError::GeometryMismatch { path: slot, .. }
                | AverageError::ImageExport { path: slot, .. }
                | AverageError::BufferLoad { path: slot, .. }
                | AverageError::BufferSave { path: slot, .. }
                | AverageError::FileSystem { path: slot, .. } => {
                    if slot.as_os_str() == UNKNOWN_PATH {
                        *slot = path.to_path_buf();
                    }
                }
                _ => {}
            }
            error
        })
    }
}

impl From<image::ImageError> for AverageError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from(UNKNOWN_PATH),
            source: err,
        }
    }
}

impl From<std::io::Error> for AverageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from(UNKNOWN_PATH),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<ndarray_npy::ReadNpyError> for AverageError {
    fn from(err: ndarray_npy::ReadNpyError) -> Self {
        Self::BufferLoad {
            path: PathBuf::from(UNKNOWN_PATH),
            source: err,
        }
    }
}

impl From<ndarray_npy::WriteNpyError> for AverageError {
    fn from(err: ndarray_npy::WriteNpyError) -> Self {
        Self::BufferSave {
            path: PathBuf::from(UNKNOWN_PATH),
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> AverageError {
    AverageError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> AverageError {
    AverageError::Computation {
        operation,
        reason: reason.to_string(),
    }
}
