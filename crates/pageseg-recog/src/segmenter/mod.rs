//! Page segmentation pipeline
//!
//! This module turns a page raster into paragraphs, rows, words and letter
//! shapes.
//!
//! # Overview
//!
//! Segmentation runs in stages, each consuming the output of the previous
//! one:
//! 1. Extract connected shapes at the separation threshold
//! 2. Remove specks and, on unclean pages, oversized shapes
//! 3. Group shapes into rows around the page's white areas, find guide
//!    lines, then regroup along column separators with the page slope
//! 4. Split rows fused by tall shapes, join broken shapes and split fused
//!    ones
//! 5. Merge thin rows and false columns into their neighbours
//! 6. Group shapes into words and clean the margins
//! 7. Separate big-font words and group rows into paragraphs
//!
//! Every stage is also available as a free function so it can be run on
//! its own.
//!
//! # Example
//!
//! ```
//! use pageseg_core::RasterGrid;
//! use pageseg_recog::segmenter::{Segmenter, SegmenterOptions};
//!
//! let mut data = vec![255u8; 120 * 40];
//! for y in 10..30 {
//!     for x in 10..20 {
//!         data[y * 120 + x] = 0;
//!     }
//! }
//! let page = RasterGrid::bilevel(120, 40, data).unwrap();
//! let mut segmenter = Segmenter::new(&page, SegmenterOptions::default()).unwrap();
//! let segmented = segmenter.segment().unwrap();
//! assert!(segmented.rows.is_empty());
//! ```

mod joins;
mod margins;
mod oversized;
mod paragraphs;
mod rows;
mod specks;
mod split;
mod words;

pub use crate::config::{SegmenterOptions, SegmenterTuning};
pub use joins::{
    combine_rows_vertically, join_shapes_horizontally, join_shapes_vertically,
    join_shapes_vertically_in_row,
};
pub use margins::{clean_margins, remove_orphans};
pub use oversized::remove_oversized_shapes;
pub use paragraphs::{group_rows_into_paragraphs, remove_false_columns};
pub use rows::{add_rows, group_shapes_into_rows, split_rows};
pub use specks::remove_specks;
pub use split::{page_fill_factor, sample_shapes, split_shapes};
pub use words::group_shapes_into_words;

use crate::columns::find_column_separators;
use crate::error::{SegmentError, SegmentResult};
use crate::guideline::GuideLineContext;
use crate::overlay::draw_segmentation;
use crate::page::SegmentedPage;
use crate::progress::{NoProgress, ProgressMonitor};
use crate::shape::{Shape, ShapeId};
use image::GrayImage;
use pageseg_core::{PixelSource, RasterGrid};
use pageseg_region::{ExtractOptions, extract_shapes};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Drives the segmentation of one page
///
/// A segmenter borrows its page and owns the random generator used for
/// shape sampling, so two runs with the same seed give the same result.
pub struct Segmenter<'a> {
    source: &'a RasterGrid,
    options: SegmenterOptions,
    rng: StdRng,
}

impl<'a> Segmenter<'a> {
    /// Create a segmenter for a page
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidParameter`] for invalid options and
    /// [`SegmentError::EmptyPage`] for a page without pixels.
    pub fn new(source: &'a RasterGrid, options: SegmenterOptions) -> SegmentResult<Self> {
        options.validate()?;
        if source.width() == 0 || source.height() == 0 {
            return Err(SegmentError::EmptyPage {
                width: source.width(),
                height: source.height(),
            });
        }
        let rng = StdRng::seed_from_u64(options.sample_seed);
        Ok(Self {
            source,
            options,
            rng,
        })
    }

    /// The options in use
    pub fn options(&self) -> &SegmenterOptions {
        &self.options
    }

    /// Indices of the paragraphs of `page` whose letters are too unsure to keep
    ///
    /// Confidences come from a recogniser run after segmentation; a page
    /// without recognised letters is all junk.
    pub fn junk_paragraphs(&self, page: &SegmentedPage) -> Vec<usize> {
        let threshold = self.options.junk_confidence_threshold;
        page.paragraphs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_junk(&page.arena, threshold))
            .map(|(i, _)| i)
            .collect()
    }

    /// Segment the page
    pub fn segment(&mut self) -> SegmentResult<SegmentedPage> {
        self.segment_with_progress(&mut NoProgress)
    }

    /// Segment the page, reporting progress to `monitor`
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::Region`] if a flood fill exceeds the
    /// configured stack size.
    pub fn segment_with_progress(
        &mut self,
        monitor: &mut dyn ProgressMonitor,
    ) -> SegmentResult<SegmentedPage> {
        let source = self.source;
        let options = &self.options;
        let tuning = &options.tuning;
        let clean = options.clean_segment;
        log::debug!(
            "segmenting {}x{} page, black threshold {}, separation threshold {}",
            source.width(),
            source.height(),
            source.black_threshold(),
            source.separation_threshold()
        );

        monitor.set_current_action("findingShapes");
        let mut page = SegmentedPage::new(source, options.writing_direction);
        let mut shapes = find_shapes(&mut page, source, options.max_shape_stack_size)?;

        remove_specks(&page.arena, &mut shapes, tuning);
        if !clean {
            remove_oversized_shapes(&mut page, source, &mut shapes, options.max_shape_stack_size)?;
        }

        monitor.set_current_action("groupingShapesIntoRows");
        monitor.set_percent_complete(0.2);
        let white_areas = page.white_areas(&shapes);
        let rows = group_shapes_into_rows(&page, &mut shapes, &white_areas, false, tuning);
        add_rows(&mut page, rows);
        find_guide_lines(&mut page, source, tuning);

        if !clean {
            page.column_separators = find_column_separators(&page);
            let separators = page.column_separators.clone();
            let rows = group_shapes_into_rows(&page, &mut shapes, &separators, true, tuning);
            add_rows(&mut page, rows);
            find_guide_lines(&mut page, source, tuning);
        }

        split_rows(&mut page, source, tuning);

        if options.split_and_join {
            let fill_factor = page_fill_factor(&page, source, &mut self.rng, tuning);
            log::debug!("page fill factor {}", fill_factor);
            if fill_factor >= 2 {
                join_shapes_horizontally(&mut page, source);
            }
            monitor.set_current_action("splittingShapes");
            monitor.set_percent_complete(0.4);
            split_shapes(&mut page, source, fill_factor, &mut self.rng, tuning);
        }

        join_shapes_vertically(&mut page, tuning);
        find_guide_lines(&mut page, source, tuning);
        combine_rows_vertically(&mut page, source, tuning);
        remove_orphans(&mut page, false);
        remove_false_columns(&mut page, source, tuning);

        monitor.set_current_action("groupingShapesIntoWords");
        monitor.set_percent_complete(0.6);
        group_shapes_into_words(&mut page, tuning);
        remove_orphans(&mut page, true);
        if !clean {
            clean_margins(&mut page, source, tuning);
        }

        monitor.set_current_action("analysingFontSize");
        monitor.set_percent_complete(0.7);
        split_rows_by_font_size(&mut page, source, tuning);

        monitor.set_current_action("groupingRowsIntoParagraphs");
        monitor.set_percent_complete(0.9);
        group_rows_into_paragraphs(&mut page);
        page.reindex();
        let shape_count = page.update_shape_count();
        log::debug!(
            "segmented page: {} paragraphs, {} shapes",
            page.paragraphs.len(),
            shape_count
        );

        if options.draw_segmented_image {
            page.overlay = Some(draw_segmentation(&page, source));
        }
        monitor.set_finished();
        Ok(page)
    }
}

/// Segment a page with the given options
pub fn segment_page(source: &RasterGrid, options: SegmenterOptions) -> SegmentResult<SegmentedPage> {
    Segmenter::new(source, options)?.segment()
}

/// Segment a greyscale image, deriving its thresholds from the options
///
/// # Example
///
/// ```
/// use image::GrayImage;
/// use pageseg_recog::segmenter::{SegmenterOptions, segment_image};
///
/// let image = GrayImage::from_pixel(64, 32, image::Luma([255]));
/// let page = segment_image(&image, SegmenterOptions::default()).unwrap();
/// assert_eq!(page.shape_count(), 0);
/// ```
pub fn segment_image(image: &GrayImage, options: SegmenterOptions) -> SegmentResult<SegmentedPage> {
    options.validate()?;
    let source = RasterGrid::from_image(
        image,
        options.black_threshold_percentile,
        options.separation_threshold_percentile,
    )?;
    segment_page(&source, options)
}

/// Extract the page's shapes into its arena
///
/// # Returns
///
/// The new shapes, ordered top to bottom.
pub fn find_shapes(
    page: &mut SegmentedPage,
    source: &RasterGrid,
    max_stack_size: usize,
) -> SegmentResult<Vec<ShapeId>> {
    let options = ExtractOptions::new(source.separation_threshold()).with_max_stack_size(max_stack_size);
    let regions = extract_shapes(source, &options)?;
    Ok(regions
        .iter()
        .map(|region| page.arena.push(Shape::from_region(region)))
        .collect())
}

/// Guide line inputs for the page's current slope
pub(crate) fn guide_line_context(page: &SegmentedPage, tuning: &SegmenterTuning) -> GuideLineContext {
    GuideLineContext {
        slope: page.mean_horizontal_slope(),
        threshold: page.separation_threshold(),
        meanline_factor: tuning.meanline_factor,
    }
}

/// Assign guide lines to every row, then refresh the page statistics
pub fn find_guide_lines<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    let context = guide_line_context(page, tuning);
    for row in &mut page.rows {
        row.assign_guide_lines(&mut page.arena, source, &context);
    }
    page.recalculate();
}

/// Give big-font words of every row their own guide lines
pub fn split_rows_by_font_size<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    let context = guide_line_context(page, tuning);
    for row in &mut page.rows {
        row.split_by_font_size(
            &mut page.arena,
            source,
            &context,
            tuning.font_ratio_threshold,
            tuning.brightness_ratio_for_split,
        );
    }
}
