//! Error types for pageseg-core
//!
//! Provides a unified error type for geometry, pixel source and statistics
//! operations. Each variant carries enough context for diagnostics.

use thiserror::Error;

/// pageseg-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid grid dimensions
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Pixel buffer does not match the declared dimensions
    #[error("pixel buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Image decoding or conversion failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for pageseg-core operations
pub type Result<T> = std::result::Result<T, Error>;
