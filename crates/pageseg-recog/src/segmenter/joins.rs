//! Joining broken shapes and thin rows

use super::guide_line_context;
use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use crate::row::RowOfShapes;
use crate::shape::{Shape, ShapeArena, ShapeId};
use pageseg_core::{Bounded, PixelSource, WritingDirection, cmp_top_to_bottom};
use std::collections::{HashSet, VecDeque};
use std::ops::Range;

/// Maximum gap, and maximum vertical offset of border pixels, for a horizontal join
const JOIN_DISTANCE: i32 = 2;
/// Number of preceding shapes a shape may be joined to
const MAX_PREVIOUS_SHAPES: usize = 4;
/// Number of following shapes checked for a vertical join
const VERTICAL_JOIN_LOOKAHEAD: usize = 6;

/// Page rows of the black pixels in a band of columns
fn border_rows<S: PixelSource + ?Sized>(
    shape: &Shape,
    source: &S,
    columns: Range<i32>,
    threshold: u8,
) -> Vec<i32> {
    let view = shape.view(source);
    let mut rows = Vec::new();
    for x in columns {
        for y in 0..shape.height() {
            if view.is_black(x, y, threshold) {
                rows.push(shape.top() + y);
            }
        }
    }
    rows
}

/// True if the facing borders of two neighbouring shapes have black pixels at about the same height
fn borders_touch<S: PixelSource + ?Sized>(
    previous: &Shape,
    current: &Shape,
    source: &S,
    threshold: u8,
    direction: WritingDirection,
) -> bool {
    let (previous_columns, current_columns) = if direction.is_left_to_right() {
        (previous.width() - JOIN_DISTANCE..previous.width(), 0..JOIN_DISTANCE)
    } else {
        (0..JOIN_DISTANCE, current.width() - JOIN_DISTANCE..current.width())
    };
    let previous_rows = border_rows(previous, source, previous_columns, threshold);
    let current_rows = border_rows(current, source, current_columns, threshold);
    previous_rows
        .iter()
        .any(|a| current_rows.iter().any(|b| (a - b).abs() <= JOIN_DISTANCE))
}

fn join_row_horizontally<S: PixelSource + ?Sized>(
    row: &mut RowOfShapes,
    arena: &mut ShapeArena,
    source: &S,
    threshold: u8,
    max_joined_width: i32,
    direction: WritingDirection,
) -> usize {
    let mut previous_shapes: VecDeque<ShapeId> = VecDeque::with_capacity(MAX_PREVIOUS_SHAPES + 1);
    let mut deleted: HashSet<ShapeId> = HashSet::new();
    for &id in &row.shapes {
        for &previous in &previous_shapes {
            if deleted.contains(&previous) {
                continue;
            }
            let (p, c) = (arena[previous].bounds, arena[id].bounds);
            let space = direction.gap(&p, &c);
            if space <= JOIN_DISTANCE
                && p.top <= c.bottom
                && p.bottom >= c.top
                && p.width() + c.width() <= max_joined_width
                && borders_touch(&arena[previous], &arena[id], source, threshold, direction)
            {
                log::trace!("joining {:?} to {:?}", p, c);
                arena[id].absorb(p);
                deleted.insert(previous);
            }
        }
        previous_shapes.push_back(id);
        if previous_shapes.len() > MAX_PREVIOUS_SHAPES {
            previous_shapes.pop_front();
        }
    }
    row.shapes.retain(|id| !deleted.contains(id));
    deleted.len()
}

/// Join neighbouring shapes that are two halves of a broken letter
///
/// Shapes are joined when they are almost touching, overlap vertically,
/// are no wider together than one and a half average shapes, and their
/// facing borders carry black pixels at about the same height.
pub fn join_shapes_horizontally<S: PixelSource + ?Sized>(page: &mut SegmentedPage, source: &S) {
    let threshold = page.black_threshold();
    let max_joined_width = (page.statistics().width * 1.5).round() as i32;
    let (width, direction) = (page.width(), page.direction);
    let mut joined = 0;
    for row in &mut page.rows {
        let count = join_row_horizontally(row, &mut page.arena, source, threshold, max_joined_width, direction);
        if count > 0 {
            row.recalculate(&page.arena, width);
            joined += count;
        }
    }
    log::debug!("joined {} shapes horizontally", joined);
}

/// Join shapes of a row that share the same horizontal space
///
/// A shape absorbs any of the next few shapes whose horizontal overlap is
/// at least a quarter of either width, such as the dot of an i. Specks
/// never absorb anything. The row is not recalculated.
///
/// # Returns
///
/// The number of shapes absorbed.
pub fn join_shapes_vertically_in_row(
    row: &mut RowOfShapes,
    arena: &mut ShapeArena,
    average_width: f64,
    average_height: f64,
    passes: usize,
) -> usize {
    let max_speck_height = (average_height / 6.0).ceil() as i32;
    let max_speck_width = (average_width / 6.0).ceil() as i32;
    let mut total = 0;
    for _ in 0..passes {
        let mut deleted: HashSet<ShapeId> = HashSet::new();
        for i in 0..row.shapes.len() {
            let id = row.shapes[i];
            let b = arena[id].bounds;
            if deleted.contains(&id) || (b.height() < max_speck_height && b.width() < max_speck_width) {
                continue;
            }
            let end = row.shapes.len().min(i + VERTICAL_JOIN_LOOKAHEAD + 1);
            for &other in &row.shapes[i + 1..end] {
                if deleted.contains(&other) {
                    continue;
                }
                let (s, o) = (arena[id].bounds, arena[other].bounds);
                if o.left > s.right || o.right < s.left {
                    continue;
                }
                let intersection = s.right.min(o.right) - s.left.max(o.left) + 1;
                if intersection * 4 >= s.width() || intersection * 4 >= o.width() {
                    log::trace!("joining {:?} to {:?}", o, s);
                    arena[id].absorb(o);
                    deleted.insert(other);
                }
            }
        }
        if deleted.is_empty() {
            break;
        }
        total += deleted.len();
        row.shapes.retain(|id| !deleted.contains(id));
    }
    total
}

/// Join vertically overlapping shapes in every row
pub fn join_shapes_vertically(page: &mut SegmentedPage, tuning: &SegmenterTuning) {
    let stats = page.statistics();
    let width = page.width();
    let mut joined = 0;
    for row in &mut page.rows {
        let count = join_shapes_vertically_in_row(
            row,
            &mut page.arena,
            stats.width,
            stats.height,
            tuning.vertical_join_passes,
        );
        if count > 0 {
            row.recalculate(&page.arena, width);
            joined += count;
        }
    }
    log::debug!("joined {} shapes vertically", joined);
}

/// Merge rows of thin marks into the row right above or below them
///
/// A row is merged into its nearest neighbour when its x-height is small
/// compared to the neighbour's and the gap between one's baseline and the
/// other's meanline is under a third of the larger x-height. Rows holding
/// very wide shapes, such as rules, are never merged.
pub fn combine_rows_vertically<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    if page.rows.len() < 2 {
        return;
    }
    page.rows.sort_by(|a, b| cmp_top_to_bottom(&a.bounds(), &b.bounds()));
    let max_row_height = page.rows.iter().map(|r| r.x_height_max).max().unwrap_or(0) as f64;
    let stats = page.statistics();
    let max_shape_width = stats.width * 8.0;
    let context = guide_line_context(page, tuning);
    let (width, direction) = (page.width(), page.direction);

    let mut deleted = vec![false; page.rows.len()];
    let mut i = 0;
    while i < page.rows.len() {
        if deleted[i] {
            i += 1;
            continue;
        }
        let current = &page.rows[i];
        let current_mid = current.baseline_mid_point(&page.arena);
        let current_height = current.x_height_max;

        let mut nearest: Option<(usize, f64, i32)> = None;
        for (j, other) in page.rows.iter().enumerate() {
            if j == i || deleted[j] {
                continue;
            }
            let other_mid = other.baseline_mid_point(&page.arena);
            if (current_mid - other_mid).abs() >= 2.0 * max_row_height
                || current.right() < other.left()
                || other.right() < current.left()
            {
                continue;
            }
            let other_height = other.x_height_max;
            let (master, slave) = if current_height > other_height {
                (current, other)
            } else {
                (other, current)
            };
            let ratio = slave.x_height_max as f64 / master.x_height_max as f64;
            if ratio > tuning.max_combine_ratio {
                continue;
            }
            if master.max_shape_width() as f64 > max_shape_width
                || slave.max_shape_width() as f64 > max_shape_width
            {
                continue;
            }
            let distance = if current_mid < other_mid {
                (other_mid - other_height as f64) - current_mid
            } else {
                (current_mid - current_height as f64) - other_mid
            };
            if nearest.is_none_or(|(_, shortest, _)| distance < shortest) {
                nearest = Some((j, distance, current_height.max(other_height)));
            }
        }

        let combined = match nearest {
            Some((j, distance, master_height)) if distance < master_height as f64 / 3.0 => {
                log::debug!("combining row {} into row {}, distance {:.1}", j, i, distance);
                deleted[j] = true;
                let moved = std::mem::take(&mut page.rows[j].shapes);
                let row = &mut page.rows[i];
                row.shapes.extend(moved);
                row.reorder_shapes(&page.arena, direction);
                join_shapes_vertically_in_row(
                    row,
                    &mut page.arena,
                    stats.width,
                    stats.height,
                    tuning.vertical_join_passes,
                );
                row.recalculate(&page.arena, width);
                row.assign_guide_lines(&mut page.arena, source, &context);
                true
            }
            _ => false,
        };
        if !combined {
            i += 1;
        }
    }

    let mut index = 0;
    page.rows.retain(|_| {
        index += 1;
        !deleted[index - 1]
    });
    page.reindex();
    page.recalculate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::add_rows;
    use pageseg_core::RasterGrid;
    use pageseg_test::PageBuilder;

    fn page_of(builder: &PageBuilder) -> (RasterGrid, SegmentedPage) {
        let source = builder.build().unwrap();
        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let shapes: Vec<ShapeId> = builder
            .glyphs()
            .iter()
            .map(|&r| page.arena.push(Shape::new(r)))
            .collect();
        add_rows(&mut page, vec![shapes]);
        (source, page)
    }

    #[test]
    fn test_broken_letter_joined() {
        let mut builder = PageBuilder::new(100, 40);
        builder.block(10, 10, 4, 12).block(15, 10, 4, 12);
        builder.text_line(26, 10, 8, 12, &[3, 3, 3]);
        let (source, mut page) = page_of(&builder);
        join_shapes_horizontally(&mut page, &source);
        let row = &page.rows[0];
        assert_eq!(row.shapes.len(), 5);
        assert_eq!(page.arena[row.shapes[0]].bounds.left, 10);
        assert_eq!(page.arena[row.shapes[0]].bounds.right, 18);
    }

    #[test]
    fn test_offset_halves_not_joined() {
        let mut builder = PageBuilder::new(100, 60);
        builder.block(10, 10, 4, 6).block(15, 20, 4, 6);
        builder.text_line(26, 10, 8, 16, &[3, 3, 3]);
        let (source, mut page) = page_of(&builder);
        join_shapes_horizontally(&mut page, &source);
        assert_eq!(page.rows[0].shapes.len(), 6);
    }

    #[test]
    fn test_dots_joined_vertically() {
        let mut arena = ShapeArena::new();
        let stem = arena.push(Shape::new(pageseg_core::Rect::new_unchecked(10, 20, 17, 29)));
        let dot = arena.push(Shape::new(pageseg_core::Rect::new_unchecked(12, 12, 15, 15)));
        let next = arena.push(Shape::new(pageseg_core::Rect::new_unchecked(21, 20, 28, 29)));
        let mut row = RowOfShapes::new(vec![stem, dot, next], &arena, 100);
        let joined = join_shapes_vertically_in_row(&mut row, &mut arena, 8.0, 10.0, 5);
        assert_eq!(joined, 1);
        assert_eq!(row.shapes, vec![stem, next]);
        assert_eq!(arena[stem].bounds.top, 12);
    }

    #[test]
    fn test_accent_row_combined() {
        let mut builder = PageBuilder::new(120, 60);
        builder.text_line(10, 30, 8, 12, &[3, 3, 3, 3, 3, 3, 3]);
        for left in [12, 34, 56] {
            builder.block(left, 26, 3, 3);
        }
        let source = builder.build().unwrap();
        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let glyphs = builder.glyphs().to_vec();
        let (letters, accents): (Vec<_>, Vec<_>) = glyphs.into_iter().partition(|g| g.top == 30);
        let letters: Vec<ShapeId> = letters
            .into_iter()
            .map(|r| {
                let mut shape = Shape::new(r);
                shape.base_line = 11;
                shape.mean_line = 1;
                page.arena.push(shape)
            })
            .collect();
        let accents: Vec<ShapeId> = accents
            .into_iter()
            .map(|r| {
                let mut shape = Shape::new(r);
                shape.base_line = 2;
                page.arena.push(shape)
            })
            .collect();
        add_rows(&mut page, vec![letters, accents]);
        page.rows[0].x_height_max = 3;
        page.rows[1].x_height_max = 10;

        combine_rows_vertically(&mut page, &source, &SegmenterTuning::default());
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].shapes.len(), 8);
        assert_eq!(page.rows[0].top(), 26);
    }
}
