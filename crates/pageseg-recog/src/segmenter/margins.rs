//! Orphan and margin cleanup
//!
//! Orphans are specks that survived row building, alone or as whole
//! words and rows. Margin cleanup finds the page's left and right text
//! margins from the rows' slope-adjusted edges and chops off words that
//! stand outside them, such as marginal notes or scanner noise.

use super::guide_line_context;
use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use crate::shape::{Shape, ShapeArena, ShapeId};
use pageseg_core::cluster::{by_descending_size, dbscan};
use pageseg_core::stats::mean;
use pageseg_core::{Bounded, PixelSource};
use std::collections::HashSet;

/// Rows needed to confirm a margin
const MIN_MARGIN_ROWS: usize = 8;
/// Rows crossing a margin before it is rejected
const MAX_CROSSING_ROWS: usize = 3;
/// Rows ending beyond this share of the page width vote for the right margin
const RIGHT_MARGIN_ZONE: f64 = 0.67;
/// Rows starting before this share of the page width vote for the left margin
const LEFT_MARGIN_ZONE: f64 = 0.33;

/// Size limits below which shapes, words and rows are orphans
#[derive(Debug, Clone, Copy)]
struct OrphanLimits {
    speck_width: i32,
    speck_height: i32,
    lone_speck_width: i32,
    group_speck_width: i32,
    group_speck_height: i32,
    row_width: i32,
    row_height: i32,
    wide_row_width: i32,
    wide_row_height: i32,
    row_speck_width: i32,
    row_speck_height: i32,
}

impl OrphanLimits {
    fn new(aw: f64, ah: f64) -> Self {
        let ceil = |v: f64| v.ceil() as i32;
        Self {
            speck_width: ceil(aw / 6.0),
            speck_height: ceil(ah / 6.0),
            lone_speck_width: ceil(aw / 8.0),
            group_speck_width: ceil(aw / 4.0),
            group_speck_height: ceil(ah / 4.0),
            row_width: ceil(aw),
            row_height: ceil(ah),
            wide_row_width: ceil(aw * 2.0),
            wide_row_height: ceil(ah * 0.75),
            row_speck_width: ceil(aw / 2.0),
            row_speck_height: ceil(ah / 2.0),
        }
    }

    fn is_speck(&self, shape: &Shape) -> bool {
        let (w, h) = (shape.width(), shape.height());
        (w < self.speck_width && h < self.speck_height) || w < self.lone_speck_width
    }
}

/// True when any shape exceeds `max_width` or `max_height`
fn has_non_speck<'a>(
    arena: &ShapeArena,
    mut ids: impl Iterator<Item = &'a ShapeId>,
    max_width: i32,
    max_height: i32,
) -> bool {
    ids.any(|&id| arena[id].height() > max_height || arena[id].width() > max_width)
}

/// Remove specks left over after row building
///
/// Before words exist (`has_groups == false`) only lone specks are removed,
/// along with rows they leave empty. Afterwards, words made only of specks
/// and rows too small or too speckled to hold text go as well.
pub fn remove_orphans(page: &mut SegmentedPage, has_groups: bool) {
    let stats = page.statistics();
    let limits = OrphanLimits::new(stats.width, stats.height);
    log::debug!("orphan limits {:?}", limits);

    let SegmentedPage { rows, arena, .. } = &mut *page;
    let arena: &ShapeArena = arena;
    let mut altered = false;
    let mut removed_rows: HashSet<usize> = HashSet::new();

    for (r, row) in rows.iter_mut().enumerate() {
        if has_groups {
            let mut row_altered = false;
            for group in &mut row.groups {
                let before = group.shapes.len();
                group.shapes.retain(|&id| !limits.is_speck(&arena[id]));
                if group.shapes.len() != before {
                    row_altered = true;
                    group.recalculate(arena);
                }
            }
            let before = row.groups.len();
            row.groups.retain(|g| {
                has_non_speck(
                    arena,
                    g.shapes.iter(),
                    limits.group_speck_width,
                    limits.group_speck_height,
                )
            });
            if row_altered || row.groups.len() != before {
                altered = true;
                row.sync_shapes_with_groups();
            }
            if row.groups.is_empty() {
                removed_rows.insert(r);
                continue;
            }

            let b = row.bounds();
            let (row_w, row_h) = (b.right - b.left, b.bottom - b.top);
            let too_small = (row_h < limits.row_height && row_w < limits.row_width)
                || (row_h < limits.wide_row_height && row_w < limits.wide_row_width);
            let speckled = !has_non_speck(
                arena,
                row.shapes.iter(),
                limits.row_speck_width,
                limits.row_speck_height,
            );
            if too_small || speckled {
                log::debug!("removing orphan row {:?}", b);
                removed_rows.insert(r);
            }
        } else {
            let before = row.shapes.len();
            row.shapes.retain(|&id| !limits.is_speck(&arena[id]));
            if row.shapes.len() != before {
                altered = true;
                log::debug!("removed {} orphan shapes from row {}", before - row.shapes.len(), r);
            }
            if row.shapes.is_empty() {
                removed_rows.insert(r);
            }
        }
    }

    if !altered && removed_rows.is_empty() {
        return;
    }
    let mut index = 0;
    rows.retain(|_| {
        let keep = !removed_rows.contains(&index);
        index += 1;
        keep
    });
    page.recalculate_rows();
    page.reindex();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A row's slope-adjusted left and right edges
fn adjusted_edges(page: &SegmentedPage, r: usize) -> (f64, f64) {
    let row = &page.rows[r];
    let x_adjustment = row.x_adjustment(&page.arena, page.mean_horizontal_slope());
    (row.left() as f64 - x_adjustment, row.right() as f64 - x_adjustment)
}

/// Slope-adjusted position beyond which words are outside the margin
fn find_margin(page: &SegmentedPage, side: Side) -> Option<f64> {
    let aw = page.statistics().width;
    let page_width = page.width() as f64;
    let in_zone = |r: usize| match side {
        Side::Right => page.rows[r].right() as f64 >= page_width * RIGHT_MARGIN_ZONE,
        Side::Left => page.rows[r].left() as f64 <= page_width * LEFT_MARGIN_ZONE,
    };
    let edge = |r: usize| {
        let (left, right) = adjusted_edges(page, r);
        if side == Side::Right { right } else { left }
    };

    let candidates: Vec<usize> = (0..page.rows.len()).filter(|&r| in_zone(r)).collect();
    let points: Vec<[f64; 1]> = candidates.iter().map(|&r| [edge(r)]).collect();
    let mut margin: Option<f64> = None;
    for cluster in by_descending_size(dbscan(&points, aw, MIN_MARGIN_ROWS, true)) {
        if cluster.len() < MIN_MARGIN_ROWS {
            continue;
        }
        let edges: Vec<f64> = cluster.iter().map(|&i| points[i][0]).collect();
        let cluster_mean = mean(&edges);
        let further = match side {
            Side::Right => margin.is_none_or(|m| m < cluster_mean),
            Side::Left => margin.is_none_or(|m| m > cluster_mean),
        };
        if further {
            margin = Some(cluster_mean);
        }
    }
    let margin = margin?;
    let limit = match side {
        Side::Right => margin + aw,
        Side::Left => margin - aw,
    };

    let crossing = candidates
        .iter()
        .filter(|&&r| {
            let (left, right) = adjusted_edges(page, r);
            left <= limit && right >= limit
        })
        .count();
    log::debug!(
        "{:?} margin {:.1}, limit {:.1}, {} crossing rows",
        side,
        margin,
        limit,
        crossing
    );
    if crossing >= MAX_CROSSING_ROWS {
        log::debug!("too many rows cross the {:?} margin, ignoring it", side);
        return None;
    }
    Some(limit)
}

/// Chop the words beyond `limit` on one side of every row
fn chop_margin<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    side: Side,
    limit: f64,
    tuning: &SegmenterTuning,
) {
    let context = guide_line_context(page, tuning);
    let slope = page.mean_horizontal_slope();
    let width = page.width();
    let SegmentedPage { rows, arena, .. } = &mut *page;
    let mut empty: HashSet<usize> = HashSet::new();
    for (r, row) in rows.iter_mut().enumerate() {
        let x_adjustment = row.x_adjustment(arena, slope);
        let beyond = match side {
            Side::Right => row.right() as f64 - x_adjustment >= limit,
            Side::Left => row.left() as f64 - x_adjustment <= limit,
        };
        if !beyond {
            continue;
        }
        let before = row.groups.len();
        row.groups.retain(|g| match side {
            Side::Right => g.left() as f64 - x_adjustment <= limit,
            Side::Left => g.right() as f64 - x_adjustment >= limit,
        });
        if row.groups.len() == before {
            continue;
        }
        log::debug!("chopped {} words outside the {:?} margin", before - row.groups.len(), side);
        row.sync_shapes_with_groups();
        if row.groups.is_empty() {
            empty.insert(r);
        } else {
            row.recalculate(arena, width);
            row.assign_guide_lines(arena, source, &context);
        }
    }
    let mut index = 0;
    rows.retain(|_| {
        let keep = !empty.contains(&index);
        index += 1;
        keep
    });
}

/// Remove words outside the page's right and left text margins
///
/// A margin is the mean edge of the largest group of at least eight rows
/// ending (or starting) at the same slope-adjusted position, furthest
/// towards the page edge. It is ignored when three or more rows cross it.
pub fn clean_margins<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    for side in [Side::Right, Side::Left] {
        if let Some(limit) = find_margin(page, side) {
            chop_margin(page, source, side, limit, tuning);
            page.reindex();
            page.recalculate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::{add_rows, group_shapes_into_words};
    use pageseg_core::{RasterGrid, Rect, WritingDirection};
    use pageseg_test::PageBuilder;

    fn page_of(builder: &PageBuilder, rows: &[Vec<usize>]) -> (RasterGrid, SegmentedPage) {
        let source = builder.build().unwrap();
        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let ids: Vec<ShapeId> = builder
            .glyphs()
            .iter()
            .map(|&r| page.arena.push(Shape::new(r)))
            .collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|&i| ids[i]).collect())
            .collect();
        add_rows(&mut page, rows);
        (source, page)
    }

    #[test]
    fn test_lone_speck_removed() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 10, 8, 12, &[3, 3, 3, 3, 3]);
        builder.block(90, 15, 1, 1);
        let (_, mut page) = page_of(&builder, &[(0..7).collect()]);
        remove_orphans(&mut page, false);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].shapes.len(), 6);
    }

    #[test]
    fn test_small_row_removed() {
        let mut builder = PageBuilder::new(200, 80);
        builder.text_line(5, 10, 8, 12, &[3, 3, 3, 3, 3, 3, 3]);
        builder.block(50, 50, 3, 3);
        let (_, mut page) = page_of(&builder, &[(0..8).collect(), vec![8]]);
        group_shapes_into_words(&mut page, &SegmenterTuning::default());
        remove_orphans(&mut page, true);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].shapes.len(), 8);
    }

    #[test]
    fn test_orphan_limits() {
        let limits = OrphanLimits::new(8.0, 12.0);
        assert_eq!(limits.speck_width, 2);
        assert_eq!(limits.speck_height, 2);
        assert_eq!(limits.lone_speck_width, 1);
        assert_eq!(limits.wide_row_width, 16);
        assert_eq!(limits.wide_row_height, 9);
        assert!(limits.is_speck(&Shape::new(Rect::new_unchecked(0, 0, 0, 0))));
        assert!(!limits.is_speck(&Shape::new(Rect::new_unchecked(0, 0, 1, 5))));
    }

    #[test]
    fn test_marginal_note_chopped() {
        let mut builder = PageBuilder::new(300, 270);
        let gaps = [3, 3, 3, 12, 3, 3, 3, 12, 3, 3, 3, 12, 3, 3, 3];
        let mut rows: Vec<Vec<usize>> = Vec::new();
        for i in 0..10 {
            let top = 10 + i * 25;
            let first = builder.glyphs().len();
            builder.text_line(10, top, 8, 12, &gaps);
            if i == 2 || i == 6 {
                builder.text_line(240, top, 8, 12, &[3]);
            }
            rows.push((first..builder.glyphs().len()).collect());
        }
        let (source, mut page) = page_of(&builder, &rows);
        let tuning = SegmenterTuning::default();
        group_shapes_into_words(&mut page, &tuning);
        clean_margins(&mut page, &source, &tuning);

        assert_eq!(page.rows.len(), 10);
        for row in &page.rows {
            assert_eq!(row.shapes.len(), 16);
            assert_eq!(row.groups.len(), 4);
            assert_eq!(row.right(), 209);
        }
    }
}
