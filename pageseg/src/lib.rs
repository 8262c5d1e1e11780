//! Pageseg - Page segmentation for OCR
//!
//! Splits a scanned page into the units a letter recogniser works on.
//!
//! # Overview
//!
//! - Page rasters with black and separation thresholds taken from the
//!   page's own brightness percentiles
//! - Connected shape extraction and hole filling
//! - Rows, words and paragraphs, with guide lines per row
//! - Column detection and a debug overlay of the result
//!
//! # Example
//!
//! ```
//! use pageseg::recog::{SegmenterOptions, segment_page};
//! use pageseg_test::PageBuilder;
//!
//! let mut builder = PageBuilder::new(200, 60);
//! builder.text_line(10, 20, 8, 12, &[3, 3, 3, 20, 3, 3, 3]);
//! let page = builder.build().unwrap();
//! let segmented = segment_page(&page, SegmenterOptions::default().with_clean_segment(true)).unwrap();
//! assert!(segmented.shape_count() <= 8);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use pageseg_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use pageseg_recog as recog;
pub use pageseg_region as region;
