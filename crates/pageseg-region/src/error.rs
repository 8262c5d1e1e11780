//! Error types for pageseg-region

use thiserror::Error;

/// Errors that can occur during region extraction
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pageseg_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The flood fill outgrew its stack bound
    #[error("flood fill stack exceeded {limit} spans while filling from ({x}, {y})")]
    StackOverflow { limit: usize, x: i32, y: i32 },
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
