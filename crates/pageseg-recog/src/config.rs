//! Segmenter configuration
//!
//! [`SegmenterOptions`] carries the switches a caller normally sets;
//! [`SegmenterTuning`] carries the heuristic constants of the individual
//! stages, all of which keep their defaults unless a page type needs
//! something else.

use crate::error::{SegmentError, SegmentResult};
use pageseg_core::{
    DEFAULT_BLACK_THRESHOLD_PERCENTILE, DEFAULT_SEPARATION_THRESHOLD_PERCENTILE,
    WritingDirection,
};
use pageseg_region::DEFAULT_MAX_STACK_SIZE;

/// Named constants used by the segmentation heuristics
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterTuning {
    /// Lower bound on the speck height/width floors (default: 3)
    pub min_speck_floor: i32,
    /// Divisor applied to the average shape size to get speck floors (default: 10.0)
    pub speck_floor_divisor: f64,
    /// Speck clusters larger than this are removed outright (default: 20)
    pub max_speck_cluster: usize,
    /// Row search window, in median shape widths on each side (default: 8.0)
    pub row_search_widths: f64,
    /// Minimum vertical overlap, as a fraction of height, for joining a row (default: 0.10)
    pub min_row_overlap: f64,
    /// Histogram trigger for guide lines, as a multiple of the mean (default: 1.1)
    pub meanline_factor: f64,
    /// Minimum jump in baseline/x-height ratio opening a big-font area (default: 0.15)
    pub font_ratio_threshold: f64,
    /// Brightness ratio confirming a big-font area (default: 1.5)
    pub brightness_ratio_for_split: f64,
    /// Fraction of a shape's height that must fall in a split row (default: 0.8)
    pub row_split_overlap: f64,
    /// Maximum x-height ratio for a thin row to be merged into another (default: 0.6)
    pub max_combine_ratio: f64,
    /// Standard deviations above the mean letter gap that open a new word (default: 4.0)
    pub word_space_std_devs: f64,
    /// Number of vertical join passes (default: 5)
    pub vertical_join_passes: usize,
    /// Shape width divisor giving the bridge expansion limit (default: 6.0)
    pub bridge_expansion_divisor: f64,
    /// Shapes sampled for stroke thickness when splitting (default: 30)
    pub split_sample_size: usize,
    /// Shapes sampled for the page fill factor (default: 40)
    pub fill_factor_sample_size: usize,
}

impl Default for SegmenterTuning {
    fn default() -> Self {
        Self {
            min_speck_floor: 3,
            speck_floor_divisor: 10.0,
            max_speck_cluster: 20,
            row_search_widths: 8.0,
            min_row_overlap: 0.10,
            meanline_factor: 1.1,
            font_ratio_threshold: 0.15,
            brightness_ratio_for_split: 1.5,
            row_split_overlap: 0.8,
            max_combine_ratio: 0.6,
            word_space_std_devs: 4.0,
            vertical_join_passes: 5,
            bridge_expansion_divisor: 6.0,
            split_sample_size: 30,
            fill_factor_sample_size: 40,
        }
    }
}

/// Options for the segmenter
#[derive(Debug, Clone)]
pub struct SegmenterOptions {
    /// Build the diagnostic overlay (default: false)
    pub draw_segmented_image: bool,
    /// Bound on pending spans in one flood fill (default: 100000)
    pub max_shape_stack_size: usize,
    /// The page is known to be clean: skip oversized-shape removal,
    /// column separators and margin cleaning (default: false)
    pub clean_segment: bool,
    /// Histogram percentile for the black threshold (default: 0.6)
    pub black_threshold_percentile: f64,
    /// Histogram percentile for the separation threshold (default: 0.35)
    pub separation_threshold_percentile: f64,
    /// Join broken shapes and split fused ones (default: false)
    pub split_and_join: bool,
    /// Mean confidence under which rows, groups and paragraphs are junk (default: 0.75)
    pub junk_confidence_threshold: f64,
    /// Reading direction of the page (default: left to right)
    pub writing_direction: WritingDirection,
    /// Seed for shape sampling (default: 0)
    pub sample_seed: u64,
    /// Heuristic constants
    pub tuning: SegmenterTuning,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            draw_segmented_image: false,
            max_shape_stack_size: DEFAULT_MAX_STACK_SIZE,
            clean_segment: false,
            black_threshold_percentile: DEFAULT_BLACK_THRESHOLD_PERCENTILE,
            separation_threshold_percentile: DEFAULT_SEPARATION_THRESHOLD_PERCENTILE,
            split_and_join: false,
            junk_confidence_threshold: 0.75,
            writing_direction: WritingDirection::LeftToRight,
            sample_seed: 0,
            tuning: SegmenterTuning::default(),
        }
    }
}

impl SegmenterOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the diagnostic overlay
    pub fn with_draw_segmented_image(mut self, draw: bool) -> Self {
        self.draw_segmented_image = draw;
        self
    }

    /// Set the flood fill stack bound
    pub fn with_max_shape_stack_size(mut self, size: usize) -> Self {
        self.max_shape_stack_size = size;
        self
    }

    /// Mark the page as clean
    pub fn with_clean_segment(mut self, clean: bool) -> Self {
        self.clean_segment = clean;
        self
    }

    /// Set the black threshold percentile
    pub fn with_black_threshold_percentile(mut self, percentile: f64) -> Self {
        self.black_threshold_percentile = percentile;
        self
    }

    /// Set the separation threshold percentile
    pub fn with_separation_threshold_percentile(mut self, percentile: f64) -> Self {
        self.separation_threshold_percentile = percentile;
        self
    }

    /// Enable or disable shape joining and splitting
    pub fn with_split_and_join(mut self, split_and_join: bool) -> Self {
        self.split_and_join = split_and_join;
        self
    }

    /// Set the junk confidence threshold
    pub fn with_junk_confidence_threshold(mut self, threshold: f64) -> Self {
        self.junk_confidence_threshold = threshold;
        self
    }

    /// Set the writing direction
    pub fn with_writing_direction(mut self, direction: WritingDirection) -> Self {
        self.writing_direction = direction;
        self
    }

    /// Set the sampling seed
    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = seed;
        self
    }

    /// Replace the heuristic constants
    pub fn with_tuning(mut self, tuning: SegmenterTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Validate options
    pub fn validate(&self) -> SegmentResult<()> {
        if self.max_shape_stack_size == 0 {
            return Err(SegmentError::InvalidParameter(
                "max_shape_stack_size must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("black_threshold_percentile", self.black_threshold_percentile),
            (
                "separation_threshold_percentile",
                self.separation_threshold_percentile,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SegmentError::InvalidParameter(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.tuning.speck_floor_divisor <= 0.0 || self.tuning.bridge_expansion_divisor <= 0.0 {
            return Err(SegmentError::InvalidParameter(
                "tuning divisors must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SegmenterOptions::default().validate().is_ok());
        assert_eq!(SegmenterTuning::default().max_speck_cluster, 20);
    }

    #[test]
    fn test_invalid_percentile() {
        let options = SegmenterOptions::new().with_black_threshold_percentile(1.5);
        assert!(options.validate().is_err());
        let options = SegmenterOptions::new().with_separation_threshold_percentile(-0.1);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_zero_stack_size() {
        let options = SegmenterOptions::new().with_max_shape_stack_size(0);
        assert!(matches!(
            options.validate(),
            Err(SegmentError::InvalidParameter(_))
        ));
    }
}
