//! Input/output operations, configuration and error handling

/// Command-line interface and subcommand runner
pub mod cli;
/// Tunable constants and validated settings
pub mod configuration;
/// Error types and path context
pub mod error;
/// Per-round progress display
pub mod progress;
/// 16-bit TIFF export
pub mod render;
/// Durable sum buffer storage
pub mod storage;
/// Pending, completed and failed directory partitions
pub mod workspace;
