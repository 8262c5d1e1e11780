//! pageseg-core - Basic data structures for page segmentation
//!
//! This crate provides the building blocks shared by the segmentation
//! crates:
//!
//! - [`Rect`] / [`Bounded`] - Inclusive rectangles and anything that has one
//! - [`WritingDirection`] - Left-to-right or right-to-left reading order
//! - [`PixelSource`] / [`WritablePixelSource`] - Greyscale pixel grids
//! - [`RasterGrid`] / [`PageThresholds`] - The page image and its thresholds
//! - [`ShapeLocalView`] / [`WritableMirror`] - Shape views and fill masks
//! - [`stats`] - Percentiles, means, standard deviations, regression
//! - [`cluster`] - DBSCAN clustering
//!
//! # Example
//!
//! ```
//! use pageseg_core::{PixelSource, RasterGrid, Rect};
//!
//! let mut data = vec![255u8; 20 * 10];
//! data[5 * 20 + 7] = 0;
//! let page = RasterGrid::bilevel(20, 10, data).unwrap();
//! assert!(page.is_black(7, 5, page.separation_threshold()));
//! assert_eq!(page.count_black(&Rect::new(0, 0, 19, 9).unwrap(), 254), 1);
//! ```

pub mod cluster;
pub mod error;
pub mod pixel;
pub mod raster;
pub mod rect;
pub mod stats;

pub use error::{Error, Result};
pub use pixel::{PixelSource, ShapeLocalView, WHITE, WritableMirror, WritablePixelSource};
pub use raster::{
    DEFAULT_BLACK_THRESHOLD_PERCENTILE, DEFAULT_SEPARATION_THRESHOLD_PERCENTILE, PageThresholds,
    RasterGrid,
};
pub use rect::{
    Bounded, Rect, WritingDirection, cmp_left_to_right, cmp_reading_order, cmp_right_to_left,
    cmp_top_to_bottom,
};
pub use stats::{Percentiles, SimpleRegression};
