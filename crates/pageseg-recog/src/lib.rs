//! pageseg-recog - Page segmentation for OCR
//!
//! This crate turns a scanned page into a hierarchy ready for letter
//! recognition:
//!
//! - **Paragraphs** of rows, found per text column
//! - **Rows** of shapes sharing a baseline, with guide lines
//! - **Words** (groups of shapes) split at wide gaps
//! - **Shapes**, ideally one per letter, joined when broken and split when
//!   fused
//!
//! # Quick Start
//!
//! ```
//! use pageseg_core::RasterGrid;
//! use pageseg_recog::{SegmenterOptions, segment_page};
//!
//! let page = RasterGrid::bilevel(64, 32, vec![255u8; 64 * 32]).unwrap();
//! let segmented = segment_page(&page, SegmenterOptions::default()).unwrap();
//! assert!(segmented.paragraphs.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`segmenter`]: The segmentation pipeline and its stages
//! - [`page`], [`paragraph`], [`row`], [`group`], [`shape`]: The result
//! - [`guideline`]: Baseline, meanline and capline assignment
//! - [`bridge`]: Splitting fused letters at thin bridges
//! - [`vectorizer`]: Stroke lines and thickness of a shape
//! - [`columns`]: Column separators and column layout
//! - [`overlay`]: Debug drawing of a segmentation

pub mod bridge;
pub mod columns;
pub mod config;
mod error;
pub mod group;
pub mod guideline;
pub mod overlay;
pub mod page;
pub mod paragraph;
pub mod progress;
pub mod row;
pub mod segmenter;
pub mod shape;
pub mod vectorizer;

pub use error::{SegmentError, SegmentResult};

// Re-export commonly used types
pub use config::{SegmenterOptions, SegmenterTuning};
pub use group::GroupOfShapes;
pub use page::SegmentedPage;
pub use paragraph::Paragraph;
pub use progress::{NoProgress, ProgressFn, ProgressMonitor};
pub use row::RowOfShapes;
pub use segmenter::{Segmenter, segment_image, segment_page};
pub use shape::{Shape, ShapeArena, ShapeId};

// Re-export core for convenience
pub use pageseg_core;
