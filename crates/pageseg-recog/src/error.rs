//! Error types for pageseg-recog

use thiserror::Error;

/// Errors that can occur during page segmentation
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pageseg_core::Error),

    /// Region extraction error
    #[error("region error: {0}")]
    Region(#[from] pageseg_region::RegionError),

    /// Invalid parameter provided
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The page has no pixels to segment
    #[error("empty page: {width}x{height}")]
    EmptyPage { width: u32, height: u32 },
}

/// Result type for segmentation operations
pub type SegmentResult<T> = Result<T, SegmentError>;
