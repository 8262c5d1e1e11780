//! Guide line detection
//!
//! The meanline and baseline of a row are found from a vertical histogram
//! of black pixels. Every shape is first placed on a common vertical axis
//! by following the page slope from the row's mid point, then its black
//! pixels are counted per relative row. The meanline is the last point in
//! the upper half where the count rises above a trigger level; the
//! baseline is the symmetric point in the lower half. A zone that never
//! triggers, as with solid shapes, falls back to the edge of the rows
//! holding at least half the busiest row's pixels.
//!
//! Rows mixing two font sizes (a heading word inside body text, say) are
//! detected by [`RowOfShapes::split_by_font_size`], which reassigns the
//! guide lines of each font separately.

use crate::row::RowOfShapes;
use crate::shape::{ShapeArena, ShapeId};
use pageseg_core::stats::{Percentiles, mean};
use pageseg_core::{Bounded, PixelSource};

/// Shapes must be at least this tall relative to the x-height to vote on font size
const MIN_HEIGHT_RATIO: f64 = 0.7;

/// Page-level inputs of guide line detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLineContext {
    /// Mean horizontal slope of the page
    pub slope: f64,
    /// Pixel threshold for the histogram
    pub threshold: u8,
    /// Histogram trigger as a multiple of the mean count
    pub meanline_factor: f64,
}

/// Assign meanline and baseline offsets to shapes of a row
///
/// Size filters are computed over the whole row, but only the shapes of
/// the groups listed in `groups` (or every shape of the row when `None`)
/// receive guide lines and feed the histogram.
///
/// # Returns
///
/// The x-height, the distance from meanline to baseline.
pub fn assign_guide_lines<S: PixelSource + ?Sized>(
    row: &RowOfShapes,
    arena: &mut ShapeArena,
    source: &S,
    context: &GuideLineContext,
    groups: Option<&[usize]>,
) -> i32 {
    let shapes: Vec<ShapeId> = match groups {
        Some(indices) => indices
            .iter()
            .filter_map(|&i| row.groups.get(i))
            .flat_map(|g| g.shapes.iter().copied())
            .collect(),
        None => row.shapes.clone(),
    };
    if shapes.is_empty() {
        return 0;
    }

    let widths = Percentiles::new(row.shapes.iter().map(|&id| arena[id].width() as f64));
    let heights = Percentiles::new(row.shapes.iter().map(|&id| arena[id].height() as f64));
    let (min_w, max_w) = (widths.get(25.0), widths.get(75.0));
    let (min_h, max_h) = (heights.get(45.0), heights.get(75.0));

    let row_mid_x = (row.left() + row.right()) as f64 / 2.0;
    let average_mids: Vec<f64> = row
        .shapes
        .iter()
        .map(|&id| &arena[id])
        .filter(|s| {
            let (w, h) = (s.width() as f64, s.height() as f64);
            w >= min_w && w <= max_w && h >= min_h && h <= max_h
        })
        .map(|s| (s.top() + s.bottom()) as f64 / 2.0)
        .collect();
    let row_mid_y = if average_mids.is_empty() {
        (row.top() + row.bottom()) as f64 / 2.0
    } else {
        mean(&average_mids)
    };

    let mid_ys: Vec<i32> = shapes
        .iter()
        .map(|&id| {
            let shape_mid_x = (arena[id].left() + arena[id].right()) as f64 / 2.0;
            (row_mid_y + context.slope * (shape_mid_x - row_mid_x)).round() as i32
        })
        .collect();

    let mut min_top = i32::MAX;
    let mut max_bottom = i32::MIN;
    for (&id, &mid_y) in shapes.iter().zip(&mid_ys) {
        min_top = min_top.min(arena[id].top() - mid_y);
        max_bottom = max_bottom.max(arena[id].bottom() - mid_y);
    }
    let y_top = -min_top.min(0);
    let y_bottom = max_bottom.max(0);
    let interval = (y_top + 1 + y_bottom) as usize;

    let mut counts = vec![0u32; interval];
    let mut tall_shapes = 0;
    for (&id, &mid_y) in shapes.iter().zip(&mid_ys) {
        let shape = &arena[id];
        if (shape.height() as f64) < min_h {
            continue;
        }
        tall_shapes += 1;
        let top_index = shape.top() - (mid_y - y_top);
        let view = shape.view(source);
        for y in 0..shape.height() {
            let index = top_index + y;
            if index < 0 || index as usize >= interval {
                continue;
            }
            for x in 0..shape.width() {
                if view.is_black(x, y, context.threshold) {
                    counts[index as usize] += 1;
                }
            }
        }
    }
    let few_shapes = tall_shapes < 3;

    let trigger_level = |zone: &[u32]| {
        let values: Vec<f64> = zone.iter().map(|&c| c as f64).collect();
        let threshold = mean(&values) * context.meanline_factor;
        if few_shapes { threshold / 2.0 } else { threshold }
    };

    let top_zone = &counts[..=y_top as usize];
    let threshold = trigger_level(top_zone);
    let mut mean_line = 0;
    let mut mean_line_found = false;
    let mut armed = true;
    for (i, &count) in top_zone.iter().enumerate() {
        let count = count as f64;
        if armed && count > threshold {
            mean_line = i as i32;
            mean_line_found = true;
            armed = false;
        } else if !armed && count < threshold / 2.0 {
            armed = true;
        }
    }

    let bottom_zone = &counts[y_top as usize..];
    let threshold = trigger_level(bottom_zone);
    let mut base_line = mean_line;
    let mut base_line_found = false;
    let mut armed = true;
    for (i, &count) in bottom_zone.iter().enumerate().rev() {
        let count = count as f64;
        if armed && count > threshold {
            base_line = y_top + i as i32;
            base_line_found = true;
            armed = false;
        } else if !armed && count < threshold / 2.0 {
            armed = true;
        }
    }

    if !mean_line_found || !base_line_found {
        if let Some((first, last)) = occupied_extent(&counts) {
            if !mean_line_found {
                mean_line = first;
            }
            if !base_line_found {
                base_line = last.max(mean_line);
            }
        }
    }

    for (&id, &mid_y) in shapes.iter().zip(&mid_ys) {
        let zero_line = mid_y - y_top;
        let shape = &mut arena[id];
        shape.mean_line = zero_line + mean_line - shape.bounds.top;
        shape.base_line = zero_line + base_line - shape.bounds.top;
    }

    log::trace!(
        "guide lines: meanline {}, baseline {}, {} tall shapes",
        mean_line,
        base_line,
        tall_shapes
    );
    base_line - mean_line
}

/// First and last histogram rows holding at least half the busiest row
fn occupied_extent(counts: &[u32]) -> Option<(i32, i32)> {
    let max = counts.iter().copied().max().filter(|&m| m > 0)?;
    let dense = |&c: &u32| c * 2 >= max;
    let first = counts.iter().position(dense)?;
    let last = counts.iter().rposition(dense)?;
    Some((first as i32, last as i32))
}

impl RowOfShapes {
    /// Assign guide lines to every shape and set both x-heights
    pub fn assign_guide_lines<S: PixelSource + ?Sized>(
        &mut self,
        arena: &mut ShapeArena,
        source: &S,
        context: &GuideLineContext,
    ) {
        let x_height = assign_guide_lines(self, arena, source, context, None);
        self.x_height = x_height;
        self.x_height_max = x_height;
    }

    /// Separate big-font words from the rest and give each their own guide lines
    ///
    /// Groups vote with their mean baseline-to-x-height ratio. A rise of at
    /// least `ratio_threshold` opens a big-font area, a fall of the same
    /// amount closes it. An area is confirmed when its shapes are on
    /// average `brightness_ratio` times darker than the rest of the row.
    pub fn split_by_font_size<S: PixelSource + ?Sized>(
        &mut self,
        arena: &mut ShapeArena,
        source: &S,
        context: &GuideLineContext,
        ratio_threshold: f64,
        brightness_ratio: f64,
    ) {
        let x_height = self.x_height as f64;
        if x_height <= 0.0 || self.groups.is_empty() {
            return;
        }
        let votes = |id: &ShapeId| arena[*id].height() as f64 / x_height > MIN_HEIGHT_RATIO;

        let ratios: Vec<f64> = self
            .groups
            .iter()
            .map(|g| {
                let values: Vec<f64> = g
                    .shapes
                    .iter()
                    .filter(|id| votes(id))
                    .map(|&id| arena[id].base_line as f64 / x_height)
                    .collect();
                mean(&values)
            })
            .collect();

        let mut big_areas: Vec<(usize, usize)> = Vec::new();
        let mut area_start = 0;
        let mut in_big_area: Option<bool> = None;
        let mut last_ratio = 0.0;
        for (i, &ratio) in ratios.iter().enumerate() {
            if i > 0 && ratio != 0.0 {
                if in_big_area != Some(false) && last_ratio - ratio >= ratio_threshold {
                    big_areas.push((area_start, i - 1));
                    in_big_area = Some(false);
                } else if in_big_area != Some(true) && ratio - last_ratio >= ratio_threshold {
                    area_start = i;
                    in_big_area = Some(true);
                }
            }
            if ratio != 0.0 {
                last_ratio = ratio;
            }
        }
        if in_big_area == Some(true) {
            big_areas.push((area_start, self.groups.len() - 1));
        }
        if big_areas.is_empty() {
            return;
        }

        let area_of = |i: usize| big_areas.iter().position(|&(a, b)| i >= a && i <= b);
        let mut area_brightness: Vec<Vec<f64>> = vec![Vec::new(); big_areas.len()];
        let mut rest_brightness: Vec<f64> = Vec::new();
        for (i, group) in self.groups.iter().enumerate() {
            for id in group.shapes.iter().filter(|id| votes(id)) {
                let brightness = arena[*id].total_brightness(source) as f64;
                match area_of(i) {
                    Some(a) => area_brightness[a].push(brightness),
                    None => rest_brightness.push(brightness),
                }
            }
        }
        let rest = mean(&rest_brightness);
        let confirmed: Vec<bool> = area_brightness
            .iter()
            .map(|b| mean(b) / rest > brightness_ratio)
            .collect();
        if !confirmed.iter().any(|&c| c) {
            return;
        }

        let mut big: Vec<usize> = Vec::new();
        let mut little: Vec<usize> = Vec::new();
        let mut last_single_little = false;
        let mut last_big = false;
        for (i, group) in self.groups.iter().enumerate() {
            let mut single_little = false;
            if area_of(i).is_some_and(|a| confirmed[a]) {
                if last_single_little {
                    if let Some(promoted) = little.pop() {
                        big.push(promoted);
                    }
                }
                big.push(i);
                last_big = true;
            } else {
                little.push(i);
                single_little = group.shapes.len() == 1 && last_big;
                last_big = false;
            }
            last_single_little = single_little;
        }
        if big.is_empty() || little.is_empty() {
            return;
        }
        big.sort_unstable();

        let x_height_big = assign_guide_lines(self, arena, source, context, Some(&big));
        let x_height_little = assign_guide_lines(self, arena, source, context, Some(&little));
        log::debug!(
            "row {} split by font size: {} big groups (x-height {}), {} little groups (x-height {})",
            self.index,
            big.len(),
            x_height_big,
            little.len(),
            x_height_little
        );
        self.x_height = if big.len() > little.len() {
            x_height_big
        } else {
            x_height_little
        };
        self.x_height_max = x_height_big;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use pageseg_core::{RasterGrid, Rect};

    /// Hollow letters with an x-height of 10 and an occasional ascender
    fn letter_row(slope: f64) -> (RasterGrid, ShapeArena, RowOfShapes) {
        let (width, height) = (400u32, 120u32);
        let mut data = vec![255u8; (width * height) as usize];
        let mut arena = ShapeArena::new();
        let mut ids = Vec::new();
        for i in 0..25 {
            let left = 10 + i * 15;
            let base = 60 + (slope * (left as f64 + 4.5 - 200.0)).round() as i32;
            let top = if i % 5 == 0 { base - 16 } else { base - 9 };
            let rect = Rect::new_unchecked(left, top, left + 8, base);
            for y in rect.top..=rect.bottom {
                for x in rect.left..=rect.right {
                    let edge = y == rect.top || y == rect.bottom || x == rect.left || x == rect.right;
                    if edge {
                        data[(y as u32 * width + x as u32) as usize] = 0;
                    }
                }
            }
            ids.push(arena.push(Shape::new(rect)));
        }
        let raster = RasterGrid::bilevel(width, height, data).unwrap();
        let row = RowOfShapes::new(ids, &arena, width);
        (raster, arena, row)
    }

    #[test]
    fn test_recovers_x_height_on_slopes() {
        for slope in [-0.1, -0.05, 0.0, 0.05, 0.1] {
            let (raster, mut arena, mut row) = letter_row(slope);
            let context = GuideLineContext {
                slope,
                threshold: 254,
                meanline_factor: 1.1,
            };
            row.assign_guide_lines(&mut arena, &raster, &context);
            assert!(
                (row.x_height - 9).abs() <= 1,
                "slope {}: x-height {}",
                slope,
                row.x_height
            );
            assert_eq!(row.x_height_max, row.x_height);
        }
    }

    /// Twenty solid 10x10 squares sitting on a sloped baseline
    fn square_row(slope: f64) -> (RasterGrid, ShapeArena, RowOfShapes) {
        let (width, height) = (400u32, 120u32);
        let mut data = vec![255u8; (width * height) as usize];
        let mut arena = ShapeArena::new();
        let mut ids = Vec::new();
        for i in 0..20 {
            let left = 10 + i * 18;
            let base = 60 + (slope * (left as f64 + 4.5 - 200.0)).round() as i32;
            let rect = Rect::new_unchecked(left, base - 9, left + 9, base);
            for y in rect.top..=rect.bottom {
                for x in rect.left..=rect.right {
                    data[(y as u32 * width + x as u32) as usize] = 0;
                }
            }
            ids.push(arena.push(Shape::new(rect)));
        }
        let raster = RasterGrid::bilevel(width, height, data).unwrap();
        let row = RowOfShapes::new(ids, &arena, width);
        (raster, arena, row)
    }

    #[test]
    fn test_solid_squares_x_height() {
        for slope in [-0.1, -0.05, 0.0, 0.05, 0.1] {
            let (raster, mut arena, mut row) = square_row(slope);
            let context = GuideLineContext {
                slope,
                threshold: 254,
                meanline_factor: 1.1,
            };
            row.assign_guide_lines(&mut arena, &raster, &context);
            assert!(
                (row.x_height - 9).abs() <= 1,
                "slope {}: x-height {}",
                slope,
                row.x_height
            );
        }
    }

    #[test]
    fn test_flat_square_lines_on_edges() {
        let (raster, mut arena, mut row) = square_row(0.0);
        let context = GuideLineContext {
            slope: 0.0,
            threshold: 254,
            meanline_factor: 1.1,
        };
        row.assign_guide_lines(&mut arena, &raster, &context);
        assert_eq!(row.x_height, 9);
        let square = &arena[row.shapes[3]];
        assert_eq!(square.mean_line, 0);
        assert_eq!(square.base_line, 9);
    }

    #[test]
    fn test_occupied_extent() {
        assert_eq!(occupied_extent(&[0, 2, 8, 8, 3, 0]), Some((2, 3)));
        assert_eq!(occupied_extent(&[0, 0]), None);
    }

    #[test]
    fn test_shape_offsets_follow_baseline() {
        let (raster, mut arena, mut row) = letter_row(0.0);
        let context = GuideLineContext {
            slope: 0.0,
            threshold: 254,
            meanline_factor: 1.1,
        };
        row.assign_guide_lines(&mut arena, &raster, &context);
        let short = &arena[row.shapes[1]];
        assert!((short.top() + short.base_line - 60).abs() <= 1);
        let tall = &arena[row.shapes[0]];
        assert!(tall.base_line > tall.mean_line);
    }

    #[test]
    fn test_single_font_row_is_not_split() {
        let (raster, mut arena, mut row) = letter_row(0.0);
        let context = GuideLineContext {
            slope: 0.0,
            threshold: 254,
            meanline_factor: 1.1,
        };
        row.assign_guide_lines(&mut arena, &raster, &context);
        row.organise_shapes_in_groups(&arena, 10.0, pageseg_core::WritingDirection::LeftToRight);
        let before = row.x_height;
        row.split_by_font_size(&mut arena, &raster, &context, 0.15, 1.5);
        assert_eq!(row.x_height, before);
    }
}
