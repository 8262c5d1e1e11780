//! Rows of shapes
//!
//! A [`RowOfShapes`] holds its shapes in reading order and, once words have
//! been found, the [`GroupOfShapes`] partitioning them. Everything derived
//! from the shapes (bounds, size statistics, the baseline regression) is
//! cached in plain fields and refreshed by [`RowOfShapes::recalculate`].

use crate::group::GroupOfShapes;
use crate::page::x_adjustment_for;
use crate::shape::{ShapeArena, ShapeId};
use pageseg_core::stats::{Percentiles, mean};
use pageseg_core::{Bounded, Rect, SimpleRegression, WritingDirection, cmp_reading_order};

/// Fewer regression points than this give a horizontal baseline
const MIN_REGRESSION_SHAPES: u64 = 10;

/// Median shape size of a row with its spread
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeStatistics {
    /// Median shape width
    pub width: f64,
    /// Half the distance between the 33rd and 66th width percentiles
    pub width_margin: f64,
    /// Median shape height
    pub height: f64,
    /// Half the distance between the 33rd and 66th height percentiles
    pub height_margin: f64,
}

/// An ordered sequence of shapes forming one line of text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOfShapes {
    /// Shapes in reading order
    pub shapes: Vec<ShapeId>,
    /// Words, once grouping has run
    pub groups: Vec<GroupOfShapes>,
    /// Position on the page
    pub index: usize,
    /// X-height of the dominant font
    pub x_height: i32,
    /// X-height of the largest font in the row
    pub x_height_max: i32,
    bounds: Rect,
    statistics: ShapeStatistics,
    max_shape_width: i32,
    mean_height: f64,
    regression: SimpleRegression,
}

impl RowOfShapes {
    /// Create a row from shapes and compute its geometry
    pub fn new(shapes: Vec<ShapeId>, arena: &ShapeArena, page_width: u32) -> Self {
        let mut row = Self {
            shapes,
            ..Self::default()
        };
        row.recalculate(arena, page_width);
        row
    }

    /// Recompute every derived value from the current shapes
    pub fn recalculate(&mut self, arena: &ShapeArena, page_width: u32) {
        self.bounds = arena.bounds_of(&self.shapes).unwrap_or_default();

        let widths: Vec<f64> = self
            .shapes
            .iter()
            .map(|&id| arena[id].width() as f64)
            .collect();
        let heights: Vec<f64> = self
            .shapes
            .iter()
            .map(|&id| arena[id].height() as f64)
            .collect();
        let width_stats = Percentiles::new(widths.iter().copied());
        let height_stats = Percentiles::new(heights.iter().copied());

        self.statistics = ShapeStatistics {
            width: width_stats.get(50.0),
            width_margin: (width_stats.get(66.0) - width_stats.get(33.0)) / 2.0,
            height: height_stats.get(50.0),
            height_margin: (height_stats.get(66.0) - height_stats.get(33.0)) / 2.0,
        };
        self.max_shape_width = self
            .shapes
            .iter()
            .map(|&id| arena[id].width())
            .max()
            .unwrap_or(0);
        self.mean_height = mean(&heights);
        self.regression = self.baseline_regression(arena, &width_stats, &height_stats, page_width);
    }

    /// Least-squares line through the bottoms of the average-sized shapes
    fn baseline_regression(
        &self,
        arena: &ShapeArena,
        width_stats: &Percentiles,
        height_stats: &Percentiles,
        page_width: u32,
    ) -> SimpleRegression {
        let (min_w, max_w) = (width_stats.get(25.0), width_stats.get(75.0));
        let (min_h, max_h) = (height_stats.get(25.0), height_stats.get(75.0));
        let average: Vec<&crate::shape::Shape> = self
            .shapes
            .iter()
            .map(|&id| &arena[id])
            .filter(|s| {
                let (w, h) = (s.width() as f64, s.height() as f64);
                w >= min_w && w <= max_w && h >= min_h && h <= max_h
            })
            .collect();

        let mut regression = SimpleRegression::new();
        for shape in &average {
            regression.add(shape.bounds.mid_x(), shape.bounds.bottom as f64);
        }

        let narrow = ((self.bounds.right - self.bounds.left) as f64) < page_width as f64 / 6.0;
        if regression.n() >= MIN_REGRESSION_SHAPES && !narrow {
            return regression;
        }

        let mut bottoms: Vec<f64> = average.iter().map(|s| s.bounds.bottom as f64).collect();
        if bottoms.is_empty() {
            bottoms = self
                .shapes
                .iter()
                .map(|&id| arena[id].bounds.bottom as f64)
                .collect();
        }
        let mean_bottom = mean(&bottoms);
        let mut horizontal = SimpleRegression::new();
        horizontal.add(self.bounds.left as f64, mean_bottom);
        horizontal.add(self.bounds.right as f64, mean_bottom);
        horizontal
    }

    /// Median shape sizes with margins
    pub fn statistics(&self) -> ShapeStatistics {
        self.statistics
    }

    /// Widest shape
    pub fn max_shape_width(&self) -> i32 {
        self.max_shape_width
    }

    /// Mean shape height
    pub fn mean_height(&self) -> f64 {
        self.mean_height
    }

    /// Baseline regression
    pub fn regression(&self) -> &SimpleRegression {
        &self.regression
    }

    /// Order the shapes for the writing direction
    pub fn reorder_shapes(&mut self, arena: &ShapeArena, direction: WritingDirection) {
        self.shapes
            .sort_by(|&a, &b| cmp_reading_order(direction, &arena[a].bounds, &arena[b].bounds));
        self.shapes.dedup();
    }

    /// Replace the shapes with the concatenation of the groups' shapes
    pub fn sync_shapes_with_groups(&mut self) {
        self.shapes = self.groups.iter().flat_map(|g| g.shapes.iter().copied()).collect();
    }

    /// The shape spanning column `x`, if any
    pub fn find_enclosing_shape(&self, arena: &ShapeArena, x: i32) -> Option<ShapeId> {
        self.shapes
            .iter()
            .copied()
            .find(|&id| arena[id].bounds.left <= x && x <= arena[id].bounds.right)
    }

    /// The shape spanning column `x`, else the one with the closest edge
    ///
    /// Shapes are walked in order and the walk stops as soon as a shape
    /// fails to improve on the best distance, so the answer is only
    /// meaningful for rows in reading order.
    pub fn find_nearest_shape(&self, arena: &ShapeArena, x: i32) -> Option<ShapeId> {
        let mut nearest: Option<ShapeId> = None;
        let mut smallest = -1;
        for &id in &self.shapes {
            let b = arena[id].bounds;
            if b.left <= x && x <= b.right {
                return Some(id);
            }
            if nearest.is_none() || (x - b.left).abs() <= smallest {
                smallest = (x - b.left).abs();
                nearest = Some(id);
            }
            if (x - b.right).abs() <= smallest {
                smallest = (x - b.right).abs();
                nearest = Some(id);
            }
            if nearest != Some(id) {
                break;
            }
        }
        nearest
    }

    /// Baseline height at the row's horizontal middle
    pub fn baseline_mid_point(&self, arena: &ShapeArena) -> f64 {
        let x_mid = (self.bounds.left as f64 + self.bounds.right as f64) / 2.0;
        match self.find_nearest_shape(arena, x_mid.round() as i32) {
            Some(id) => (arena[id].bounds.top + arena[id].base_line) as f64,
            None => (self.bounds.top as f64 + self.bounds.bottom as f64) / 2.0,
        }
    }

    /// Horizontal shift that undoes the page slope at this row
    pub fn x_adjustment(&self, arena: &ShapeArena, page_slope: f64) -> f64 {
        x_adjustment_for(self.baseline_mid_point(arena), page_slope)
    }

    /// Split the shapes into groups wherever the gap exceeds `threshold`
    pub fn organise_shapes_in_groups(
        &mut self,
        arena: &ShapeArena,
        threshold: f64,
        direction: WritingDirection,
    ) {
        let mut groups: Vec<Vec<ShapeId>> = vec![Vec::new()];
        let mut previous: Option<ShapeId> = None;
        for &id in &self.shapes {
            if let Some(prev) = previous {
                let gap = direction.gap(&arena[prev].bounds, &arena[id].bounds);
                if gap as f64 > threshold {
                    groups.push(Vec::new());
                }
            }
            if let Some(current) = groups.last_mut() {
                current.push(id);
            }
            previous = Some(id);
        }
        self.groups = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .enumerate()
            .map(|(index, shapes)| {
                let mut group = GroupOfShapes::new(shapes, arena);
                group.index = index;
                group
            })
            .collect();
    }

    /// Mean confidence over the shapes of every group
    pub fn mean_confidence(&self, arena: &ShapeArena) -> Option<f64> {
        let confidences: Vec<f64> = self
            .groups
            .iter()
            .flat_map(|g| g.shapes.iter())
            .map(|&id| arena[id].confidence)
            .collect();
        if confidences.is_empty() {
            None
        } else {
            Some(mean(&confidences))
        }
    }

    /// True when the row has no words or its mean confidence is below `threshold`
    pub fn is_junk(&self, arena: &ShapeArena, threshold: f64) -> bool {
        self.mean_confidence(arena).is_none_or(|c| c < threshold)
    }
}

impl Bounded for RowOfShapes {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn row_of(rects: &[Rect], page_width: u32) -> (ShapeArena, RowOfShapes) {
        let mut arena = ShapeArena::new();
        let ids = rects.iter().map(|&r| arena.push(Shape::new(r))).collect();
        let row = RowOfShapes::new(ids, &arena, page_width);
        (arena, row)
    }

    fn letters(count: i32, slope_num: i32) -> Vec<Rect> {
        (0..count)
            .map(|i| {
                let left = i * 12;
                let shift = left * slope_num / 100;
                Rect::new_unchecked(left, 10 + shift, left + 9, 29 + shift)
            })
            .collect()
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let (arena, mut row) = row_of(&letters(12, 5), 200);
        let before = row.clone();
        row.recalculate(&arena, 200);
        assert_eq!(row, before);
    }

    #[test]
    fn test_sloped_regression() {
        let (_, row) = row_of(&letters(20, 10), 300);
        assert!((row.regression().slope() - 0.1).abs() < 0.02);
        assert_eq!(row.statistics().width, 10.0);
        assert_eq!(row.max_shape_width(), 10);
    }

    #[test]
    fn test_short_row_is_horizontal() {
        let (_, row) = row_of(&letters(4, 10), 300);
        assert_eq!(row.regression().slope(), 0.0);
    }

    #[test]
    fn test_find_nearest_shape() {
        let (arena, row) = row_of(&letters(3, 0), 100);
        assert_eq!(row.find_nearest_shape(&arena, 14), Some(row.shapes[1]));
        // gap between the first two shapes, closer to the first
        assert_eq!(row.find_nearest_shape(&arena, 10), Some(row.shapes[0]));
        assert_eq!(row.find_enclosing_shape(&arena, 11), None);
    }

    #[test]
    fn test_organise_shapes_in_groups() {
        let rects = [
            Rect::new_unchecked(0, 0, 9, 19),
            Rect::new_unchecked(13, 0, 22, 19),
            Rect::new_unchecked(43, 0, 52, 19),
        ];
        let (arena, mut row) = row_of(&rects, 100);
        row.organise_shapes_in_groups(&arena, 5.0, WritingDirection::LeftToRight);
        assert_eq!(row.groups.len(), 2);
        assert_eq!(row.groups[0].shapes.len(), 2);
        assert_eq!(row.groups[1].index, 1);
        let union: Vec<ShapeId> = row.groups.iter().flat_map(|g| g.shapes.clone()).collect();
        assert_eq!(union, row.shapes);
    }

    #[test]
    fn test_junk_without_groups() {
        let (arena, row) = row_of(&letters(2, 0), 100);
        assert!(row.is_junk(&arena, 0.5));
    }
}
