//! The segmented page
//!
//! [`SegmentedPage`] owns the shape arena, the rows (and, once paragraphs
//! are built, the paragraphs that own those rows) and every page-level
//! derived value: average shape size, mean horizontal slope, large shapes
//! and column separators.

use crate::columns::ColumnOutline;
use crate::paragraph::Paragraph;
use crate::row::{RowOfShapes, ShapeStatistics};
use crate::shape::{ShapeArena, ShapeId};
use image::RgbImage;
use pageseg_core::cluster::dbscan;
use pageseg_core::stats::{Percentiles, mean, std_dev};
use pageseg_core::{Bounded, PixelSource, RasterGrid, Rect, SimpleRegression, WritingDirection};
use pageseg_region::find_white_areas;

/// Horizontal shift that undoes a page slope at height `y`
pub fn x_adjustment_for(y: f64, slope: f64) -> f64 {
    if slope == 0.0 { 0.0 } else { -y * slope }
}

/// The result of segmenting one page
#[derive(Debug, Clone)]
pub struct SegmentedPage {
    width: u32,
    height: u32,
    black_threshold: u8,
    separation_threshold: u8,
    /// Reading direction
    pub direction: WritingDirection,
    /// Every shape ever created for the page
    pub arena: ShapeArena,
    /// Rows not yet assigned to a paragraph
    pub rows: Vec<RowOfShapes>,
    /// Paragraphs in reading order
    pub paragraphs: Vec<Paragraph>,
    /// Illustrations removed from the text
    pub large_shapes: Vec<Rect>,
    /// White vertical bands between text columns
    pub column_separators: Vec<Rect>,
    /// Margins and tabs of the columns found during paragraph grouping
    pub column_outlines: Vec<ColumnOutline>,
    /// Diagnostic overlay, when requested
    pub overlay: Option<RgbImage>,
    statistics: ShapeStatistics,
    mean_horizontal_slope: f64,
    shape_count: usize,
}

impl SegmentedPage {
    /// Create an empty page matching a raster
    pub fn new(source: &RasterGrid, direction: WritingDirection) -> Self {
        Self {
            width: source.width(),
            height: source.height(),
            black_threshold: source.black_threshold(),
            separation_threshold: source.separation_threshold(),
            direction,
            arena: ShapeArena::new(),
            rows: Vec::new(),
            paragraphs: Vec::new(),
            large_shapes: Vec::new(),
            column_separators: Vec::new(),
            column_outlines: Vec::new(),
            overlay: None,
            statistics: ShapeStatistics::default(),
            mean_horizontal_slope: 0.0,
            shape_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Threshold for letter pixels
    pub fn black_threshold(&self) -> u8 {
        self.black_threshold
    }

    /// Threshold for separating touching letters
    pub fn separation_threshold(&self) -> u8 {
        self.separation_threshold
    }

    /// Whole-page rectangle
    pub fn page_rect(&self) -> Rect {
        Rect::new_unchecked(0, 0, self.width as i32 - 1, self.height as i32 - 1)
    }

    /// Rows of the page, whether or not paragraphs own them
    pub fn all_rows(&self) -> impl Iterator<Item = &RowOfShapes> {
        self.rows
            .iter()
            .chain(self.paragraphs.iter().flat_map(|p| p.rows.iter()))
    }

    /// Recalculate every row, then the page statistics
    pub fn recalculate_rows(&mut self) {
        for row in &mut self.rows {
            row.recalculate(&self.arena, self.width);
        }
        self.recalculate();
    }

    /// Recompute the average shape size and the mean horizontal slope
    ///
    /// The average shape size is the 65th percentile over every row's
    /// shapes, with margins of half the 50th to 80th percentile spread.
    pub fn recalculate(&mut self) {
        let shapes: Vec<ShapeId> = self.all_rows().flat_map(|r| r.shapes.iter().copied()).collect();
        let widths = Percentiles::new(shapes.iter().map(|&id| self.arena[id].width() as f64));
        let heights = Percentiles::new(shapes.iter().map(|&id| self.arena[id].height() as f64));
        self.statistics = ShapeStatistics {
            width: widths.get(65.0),
            width_margin: (widths.get(80.0) - widths.get(50.0)) / 2.0,
            height: heights.get(65.0),
            height_margin: (heights.get(80.0) - heights.get(50.0)) / 2.0,
        };

        let regressions: Vec<&SimpleRegression> = self
            .all_rows()
            .map(|r| r.regression())
            .filter(|r| r.n() > 2)
            .collect();
        let slopes: Vec<f64> = regressions.iter().map(|r| r.slope()).collect();
        let (slope_mean, slope_sd) = (mean(&slopes), std_dev(&slopes));
        let kept: Vec<f64> = slopes
            .iter()
            .copied()
            .filter(|s| slope_mean - slope_sd <= *s && *s <= slope_mean + slope_sd)
            .collect();
        self.mean_horizontal_slope = mean(&kept);
        log::trace!(
            "page statistics: shape {:.1}x{:.1}, slope {:.4}",
            self.statistics.width,
            self.statistics.height,
            self.mean_horizontal_slope
        );
    }

    /// Average shape size with margins
    pub fn statistics(&self) -> ShapeStatistics {
        self.statistics
    }

    /// Mean slope of the rows' baselines
    pub fn mean_horizontal_slope(&self) -> f64 {
        self.mean_horizontal_slope
    }

    /// Horizontal shift that undoes the page slope at height `y`
    pub fn x_adjustment(&self, y: f64) -> f64 {
        x_adjustment_for(y, self.mean_horizontal_slope)
    }

    /// Slope of the black pixels of a representative row
    ///
    /// The representative row is the first one wider than three quarters
    /// of the mean row width; only its average-height shapes contribute.
    pub fn inclination(&self, source: &RasterGrid) -> f64 {
        let widths: Vec<f64> = self
            .all_rows()
            .map(|r| (r.right() - r.left()) as f64)
            .collect();
        let min_width = mean(&widths) * 0.75;
        let Some(row) = self.all_rows().find(|r| (r.right() - r.left()) as f64 > min_width) else {
            return 0.0;
        };
        let stats = row.statistics();
        let (min_h, max_h) = (stats.height - stats.height_margin, stats.height + stats.height_margin);
        let mut regression = SimpleRegression::new();
        for &id in &row.shapes {
            let shape = &self.arena[id];
            let h = shape.height() as f64;
            if h < min_h || h > max_h {
                continue;
            }
            let view = shape.view(source);
            for y in 0..shape.height() {
                for x in 0..shape.width() {
                    if view.is_black(x, y, self.black_threshold) {
                        regression.add((shape.left() + x) as f64, (shape.top() + y) as f64);
                    }
                }
            }
        }
        regression.slope()
    }

    /// Rows clustered by the x-height of their first shape
    ///
    /// Returns clusters of row indices into [`SegmentedPage::rows`].
    pub fn row_clusters(&self) -> Vec<Vec<usize>> {
        let heights: Vec<[f64; 1]> = self
            .rows
            .iter()
            .map(|r| [r.shapes.first().map_or(0.0, |&id| self.arena[id].x_height() as f64)])
            .collect();
        let flat: Vec<f64> = heights.iter().map(|h| h[0]).collect();
        dbscan(&heights, std_dev(&flat), 2, true)
    }

    /// White areas between a set of shapes
    ///
    /// Sizes are relative to the 75th percentile shape size. Horizontal
    /// and square areas are added to the black areas before the later
    /// passes, as are the white areas around the page's large shapes.
    pub fn white_areas(&self, shapes: &[ShapeId]) -> Vec<Rect> {
        let Some(bounds) = self.arena.bounds_of(shapes) else {
            return Vec::new();
        };
        let aw = Percentiles::new(shapes.iter().map(|&id| self.arena[id].width() as f64)).get(75.0);
        let ah = Percentiles::new(shapes.iter().map(|&id| self.arena[id].height() as f64)).get(75.0);

        let mut black: Vec<Rect> = shapes.iter().map(|&id| self.arena[id].bounds).collect();
        let mut white = Vec::new();

        let horizontal = find_white_areas(&black, bounds, 40.0 * aw, 2.5 * ah);
        black.extend_from_slice(&horizontal);
        white.extend(horizontal);

        white.extend(find_white_areas(&black, bounds, 2.5 * aw, 10.0 * ah));

        let square = find_white_areas(&black, bounds, 4.0 * aw, 4.0 * ah);
        black.extend_from_slice(&square);
        white.extend(square);

        let around: Vec<Rect> = shapes.iter().map(|&id| self.arena[id].bounds).collect();
        black.extend(self.white_areas_around_large_shapes(&around));

        white.extend(find_white_areas(&black, bounds, aw, 20.0 * ah));
        white
    }

    /// White rectangles between each large shape and its nearest neighbours
    pub fn white_areas_around_large_shapes(&self, neighbours: &[Rect]) -> Vec<Rect> {
        self.large_shapes
            .iter()
            .map(|large| {
                let mut nearest_above = 0;
                let mut nearest_below = self.height as i32;
                let mut nearest_right = self.width as i32;
                let mut nearest_left = 0;
                for r in neighbours {
                    let beside = r.top <= large.bottom && r.bottom >= large.top;
                    if beside && r.right <= large.left && r.right >= nearest_left {
                        nearest_left = r.right;
                    } else if beside && r.left >= large.right && r.left <= nearest_right {
                        nearest_right = r.left;
                    }
                }
                for r in neighbours {
                    let level = r.left <= nearest_right && r.right >= nearest_left;
                    if level && r.bottom <= large.top && r.bottom >= nearest_above {
                        nearest_above = r.bottom;
                    } else if level && r.top >= large.bottom && r.top <= nearest_below {
                        nearest_below = r.top;
                    }
                }
                Rect::new_unchecked(
                    nearest_left + 1,
                    nearest_above + 1,
                    nearest_right - 1,
                    nearest_below - 1,
                )
            })
            .collect()
    }

    /// White rectangles between each large shape and its nearest rows
    pub fn white_areas_around_large_shapes_by_row(&self) -> Vec<Rect> {
        let rows: Vec<Rect> = self.all_rows().map(|r| r.bounds()).collect();
        self.white_areas_around_large_shapes(&rows)
    }

    /// Replace the row at `index` with `new_rows`, keeping their order
    pub fn replace_row(&mut self, index: usize, new_rows: Vec<RowOfShapes>) {
        self.rows.splice(index..=index, new_rows);
    }

    /// Refresh the back-references of every row, group and shape
    pub fn reindex(&mut self) {
        let Self {
            rows,
            paragraphs,
            arena,
            ..
        } = self;
        for (p_index, paragraph) in paragraphs.iter_mut().enumerate() {
            paragraph.index = p_index;
        }
        let all = rows
            .iter_mut()
            .chain(paragraphs.iter_mut().flat_map(|p| p.rows.iter_mut()));
        for (r_index, row) in all.enumerate() {
            row.index = r_index;
            for (s_index, &id) in row.shapes.iter().enumerate() {
                let shape = &mut arena[id];
                shape.row = Some(r_index);
                shape.group = None;
                shape.index = s_index;
            }
            for (g_index, group) in row.groups.iter_mut().enumerate() {
                group.index = g_index;
                for (s_index, &id) in group.shapes.iter().enumerate() {
                    let shape = &mut arena[id];
                    shape.group = Some(g_index);
                    shape.index = s_index;
                }
            }
        }
    }

    /// Count the shapes reachable through groups and cache the result
    pub fn update_shape_count(&mut self) -> usize {
        self.shape_count = self
            .all_rows()
            .flat_map(|r| r.groups.iter())
            .map(|g| g.shapes.len())
            .sum();
        self.shape_count
    }

    /// Number of shapes in words, as of the last count
    pub fn shape_count(&self) -> usize {
        self.shape_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn blank_page(width: u32, height: u32) -> SegmentedPage {
        let raster = RasterGrid::bilevel(width, height, vec![255; (width * height) as usize]).unwrap();
        SegmentedPage::new(&raster, WritingDirection::LeftToRight)
    }

    fn add_row(page: &mut SegmentedPage, top: i32, count: i32, slope_num: i32) {
        let ids = (0..count)
            .map(|i| {
                let left = 10 + i * 12;
                let shift = left * slope_num / 100;
                page.arena
                    .push(Shape::new(Rect::new_unchecked(left, top + shift, left + 9, top + 19 + shift)))
            })
            .collect();
        let row = RowOfShapes::new(ids, &page.arena, page.width());
        page.rows.push(row);
    }

    #[test]
    fn test_x_adjustment() {
        assert_eq!(x_adjustment_for(100.0, 0.0), 0.0);
        assert_eq!(x_adjustment_for(100.0, 0.05), -5.0);
    }

    #[test]
    fn test_mean_slope() {
        let mut page = blank_page(400, 300);
        for top in [10, 60, 110] {
            add_row(&mut page, top, 25, 5);
        }
        page.recalculate();
        assert!((page.mean_horizontal_slope() - 0.05).abs() < 0.01);
        assert_eq!(page.statistics().width, 10.0);
        assert_eq!(page.statistics().height, 20.0);
    }

    #[test]
    fn test_reindex_and_shape_count() {
        let mut page = blank_page(400, 300);
        add_row(&mut page, 10, 3, 0);
        add_row(&mut page, 60, 2, 0);
        for row in &mut page.rows {
            row.organise_shapes_in_groups(&page.arena, 100.0, WritingDirection::LeftToRight);
        }
        page.reindex();
        let second = page.rows[1].shapes[1];
        assert_eq!(page.arena[second].row, Some(1));
        assert_eq!(page.arena[second].group, Some(0));
        assert_eq!(page.arena[second].index, 1);
        assert_eq!(page.update_shape_count(), 5);
    }

    #[test]
    fn test_white_areas_around_large_shape() {
        let mut page = blank_page(200, 200);
        page.large_shapes.push(Rect::new_unchecked(80, 80, 120, 120));
        let neighbours = [
            Rect::new_unchecked(10, 90, 40, 100),
            Rect::new_unchecked(150, 90, 180, 100),
            Rect::new_unchecked(50, 20, 140, 30),
        ];
        let areas = page.white_areas_around_large_shapes(&neighbours);
        assert_eq!(areas, vec![Rect::new_unchecked(41, 31, 149, 199)]);
    }

    #[test]
    fn test_row_clusters() {
        let mut page = blank_page(400, 300);
        for top in [10, 40, 70] {
            add_row(&mut page, top, 3, 0);
        }
        for row in &page.rows {
            for &id in &row.shapes {
                page.arena[id].base_line = 15;
                page.arena[id].mean_line = 5;
            }
        }
        let clusters = page.row_clusters();
        assert_eq!(clusters, vec![vec![0, 1, 2]]);
    }
}
