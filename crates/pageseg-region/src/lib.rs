//! pageseg-region - Region extraction for page segmentation
//!
//! - [`extract_shapes`] / [`fill_region`] - Connected dark regions by
//!   bounded scanline flood fill
//! - [`find_white_areas`] / [`find_white_areas_in`] - White rectangles
//!   between known black areas or in raw pixels
//! - [`fill_bits`] / [`fill_factor`] - Majority-rule filling of white gaps
//!   inside shapes

pub mod error;
pub mod extract;
pub mod filler;
pub mod white_area;

pub use error::{RegionError, RegionResult};
pub use extract::{
    ConnectivityType, DEFAULT_MAX_STACK_SIZE, ExtractOptions, ExtractedRegion, extract_shapes,
    fill_region,
};
pub use filler::{MAX_FILL_PASSES, fill_bits, fill_factor, shape_bits};
pub use white_area::{find_white_areas, find_white_areas_in};
