//! False column removal and paragraph detection
//!
//! Both work on the page's [`ColumnLayout`]. A false column is a narrow
//! strip of row ends that broke off from their rows, typically across a
//! wide word gap. Paragraphs are found per column from the margins and
//! tab position shared by the columns of a column group.

use super::guide_line_context;
use super::joins::join_shapes_vertically_in_row;
use crate::columns::{AdjustedRow, Column, ColumnLayout, ColumnOutline, adjusted_rows};
use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use crate::paragraph::Paragraph;
use crate::row::RowOfShapes;
use pageseg_core::cluster::{by_descending_size, dbscan};
use pageseg_core::stats::mean;
use pageseg_core::{PixelSource, Rect, WritingDirection};
use std::collections::HashSet;

/// Rows needed for a margin or tab cluster
const MIN_MARGIN_ROWS: usize = 5;
/// Rows with at most this many shapes become paragraphs of their own
const MAX_STANDALONE_SHAPES: usize = 2;
/// A false column is at most this share of its neighbour's width
const MAX_FALSE_COLUMN_RATIO: f64 = 0.5;

/// Columns of a group merged into one, for neighbour comparisons
fn merged_columns(layout: &ColumnLayout, rows: &[AdjustedRow], page: &SegmentedPage) -> Vec<Column> {
    layout
        .groups()
        .into_iter()
        .map(|group| {
            let mut merged = Column {
                rows: group
                    .iter()
                    .flat_map(|&c| layout.columns[c].rows.iter().copied())
                    .collect(),
                ..Column::default()
            };
            merged.recalculate(rows, page.width(), page.height(), page.direction);
            merged
        })
        .collect()
}

/// Neighbours following each column in the writing direction
fn following_neighbours(columns: &[Column], direction: WritingDirection) -> Vec<Vec<usize>> {
    let mut right: Vec<Vec<usize>> = vec![Vec::new(); columns.len()];
    let mut left: Vec<Vec<usize>> = vec![Vec::new(); columns.len()];
    for i in 0..columns.len() {
        for j in i + 1..columns.len() {
            let (a, b) = (&columns[i].outline, &columns[j].outline);
            if a.top > b.bottom || a.bottom < b.top {
                continue;
            }
            if a.adjusted_left <= b.adjusted_left {
                right[i].push(j);
                left[j].push(i);
            } else {
                left[i].push(j);
                right[j].push(i);
            }
        }
    }
    if direction.is_left_to_right() { right } else { left }
}

/// Row pairs `(main, continuation)` of narrow columns that continue another's rows
fn false_column_matches(page: &SegmentedPage) -> Vec<(usize, usize)> {
    let rows = adjusted_rows(page);
    let layout = ColumnLayout::new(&rows, page.width(), page.height(), page.direction);
    let columns = merged_columns(&layout, &rows, page);
    let stats = page.statistics();
    let ltr = page.direction.is_left_to_right();

    let mut matches = Vec::new();
    for (c, neighbours) in following_neighbours(&columns, page.direction).into_iter().enumerate() {
        let column = &columns[c];
        if column.width() <= 0 {
            continue;
        }
        for n in neighbours {
            let other = &columns[n];
            if f64::from(other.width()) / f64::from(column.width()) > MAX_FALSE_COLUMN_RATIO {
                continue;
            }
            let small = column.rows.len() <= 4 || other.rows.len() as f64 <= 0.4 * column.rows.len() as f64;
            if !small {
                log::debug!("narrow column {:?} has too many rows", other.outline);
                continue;
            }
            let pairs: Vec<(usize, usize)> = other
                .rows
                .iter()
                .filter_map(|&o| {
                    let continuation = &rows[o];
                    column.rows.iter().copied().find(|&r| {
                        let row = &rows[r];
                        let gap = if ltr {
                            continuation.bounds.left - row.bounds.right
                        } else {
                            row.bounds.left - continuation.bounds.right
                        };
                        (row.baseline_mid - continuation.baseline_mid).abs() < stats.height / 4.0
                            && f64::from(gap) < stats.width * 2.0
                    })
                    .map(|r| (rows[r].index, continuation.index))
                })
                .collect();
            if pairs.len() == other.rows.len() {
                log::debug!("merging false column {:?} into {:?}", other.outline, column.outline);
                matches.extend(pairs);
            }
        }
    }
    matches
}

/// Merge narrow columns of row ends back into the rows they continue
///
/// A column qualifies when it is at most half as wide as a column it
/// follows in the writing direction, has few rows, and every one of its
/// rows sits on the baseline of a row of that column within two average
/// shape widths. Runs until no more columns merge.
pub fn remove_false_columns<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    loop {
        let matches = false_column_matches(page);
        if matches.is_empty() {
            break;
        }
        let stats = page.statistics();
        let context = guide_line_context(page, tuning);
        let (width, direction) = (page.width(), page.direction);
        let mut continuations: HashSet<usize> = HashSet::new();
        for (main, continuation) in matches {
            if main == continuation
                || continuations.contains(&main)
                || !continuations.insert(continuation)
            {
                continue;
            }
            let shapes = std::mem::take(&mut page.rows[continuation].shapes);
            let SegmentedPage { rows, arena, .. } = &mut *page;
            let row = &mut rows[main];
            row.shapes.extend(shapes);
            row.reorder_shapes(arena, direction);
            row.recalculate(arena, width);
            join_shapes_vertically_in_row(row, arena, stats.width, stats.height, tuning.vertical_join_passes);
            row.recalculate(arena, width);
            row.assign_guide_lines(arena, source, &context);
        }
        let mut index = 0;
        page.rows.retain(|_| {
            let keep = !continuations.contains(&index);
            index += 1;
            keep
        });
        page.reindex();
        page.recalculate();
    }
}

/// Margin and tab of one side of a column group, from clustered row edges
///
/// `further` tells whether the first edge lies further towards the page
/// edge than the second.
fn margin_and_tab(edges: &[f64], epsilon: f64, further: impl Fn(f64, f64) -> bool) -> (Option<f64>, Option<f64>) {
    let points: Vec<[f64; 1]> = edges.iter().map(|&e| [e]).collect();
    let mut margin: Option<f64> = None;
    let mut tab: Option<f64> = None;
    for cluster in by_descending_size(dbscan(&points, epsilon, MIN_MARGIN_ROWS, true)) {
        if cluster.len() < MIN_MARGIN_ROWS {
            break;
        }
        let values: Vec<f64> = cluster.iter().map(|&i| edges[i]).collect();
        let cluster_mean = mean(&values);
        match margin {
            Some(m) if !further(cluster_mean, m) => {
                if tab.is_none_or(|t| further(cluster_mean, t)) {
                    tab = Some(cluster_mean);
                }
            }
            _ => {
                if margin.is_some() {
                    tab = margin;
                }
                margin = Some(cluster_mean);
            }
        }
    }
    (margin, tab)
}

/// Set start margin, tab and end margin on every column of a group
fn assign_margins(
    page: &SegmentedPage,
    rows: &[AdjustedRow],
    layout: &mut ColumnLayout,
    group: &[usize],
) {
    let aw = page.statistics().width;
    let (mut top, mut bottom) = (f64::from(page.height()), 0.0f64);
    let (mut left, mut right) = (f64::from(page.width()), 0.0f64);
    for &c in group {
        let o = &layout.columns[c].outline;
        top = top.min(o.top.round());
        bottom = bottom.max(o.bottom.round());
        left = left.min(o.adjusted_left.round());
        right = right.max(o.adjusted_right.round());
    }
    let members: Vec<&AdjustedRow> = group
        .iter()
        .flat_map(|&c| layout.columns[c].rows.iter().map(|&r| &rows[r]))
        .collect();
    let rights: Vec<f64> = members.iter().map(|r| r.right()).collect();
    let lefts: Vec<f64> = members.iter().map(|r| r.left()).collect();
    let (right_margin, right_tab) = margin_and_tab(&rights, aw / 2.0, |a, b| a > b);
    let (left_margin, left_tab) = margin_and_tab(&lefts, aw / 2.0, |a, b| a < b);

    let spans = |s: &Rect| f64::from(s.top) <= top && f64::from(s.bottom) >= bottom;
    let right_margin = right_margin.unwrap_or_else(|| {
        page.column_separators
            .iter()
            .filter(|s| spans(*s) && f64::from(s.left) >= right)
            .map(|s| f64::from(s.left))
            .fold(f64::from(page.width()), f64::min)
    });
    let left_margin = left_margin.unwrap_or_else(|| {
        page.column_separators
            .iter()
            .filter(|s| spans(*s) && f64::from(s.right) <= left)
            .map(|s| f64::from(s.right))
            .fold(0.0, f64::max)
    });
    log::debug!(
        "column group margins: left {:.1} (tab {:?}), right {:.1} (tab {:?})",
        left_margin,
        left_tab,
        right_margin,
        right_tab
    );

    for &c in group {
        let outline = &mut layout.columns[c].outline;
        if page.direction.is_left_to_right() {
            outline.start_margin = left_margin;
            outline.start_tab = left_tab.unwrap_or(left_margin + 5.0 * aw);
            outline.has_tab = left_tab.is_some();
            outline.end_margin = right_margin;
        } else {
            outline.start_margin = right_margin;
            outline.start_tab = right_tab.unwrap_or(right_margin - 5.0 * aw);
            outline.has_tab = right_tab.is_some();
            outline.end_margin = left_margin;
        }
    }
}

/// A row's start and end, mirrored for right-to-left pages so that larger
/// values always lie further along the writing direction
#[derive(Debug, Clone, Copy)]
struct RowPlacement {
    start: f64,
    end: f64,
}

impl RowPlacement {
    fn new(row: &AdjustedRow, direction: WritingDirection, start_overlap: f64, end_overlap: f64) -> Self {
        if direction.is_left_to_right() {
            Self {
                start: row.left() + start_overlap,
                end: row.right() - end_overlap,
            }
        } else {
            Self {
                start: -(row.right() - start_overlap),
                end: -(row.left() + end_overlap),
            }
        }
    }
}

/// Margins mirrored so that "further in" is always greater
fn inward(outline: &ColumnOutline, direction: WritingDirection) -> ColumnOutline {
    if direction.is_left_to_right() {
        *outline
    } else {
        ColumnOutline {
            start_margin: -outline.start_margin,
            start_tab: -outline.start_tab,
            end_margin: -outline.end_margin,
            ..*outline
        }
    }
}

/// How far white space around a large shape pushes into a row's margins
///
/// Returns the overlaps on the start and end sides.
fn large_shape_overlaps(
    row: &AdjustedRow,
    outline: &ColumnOutline,
    white_areas: &[Rect],
    direction: WritingDirection,
) -> (f64, f64) {
    let (left_margin, right_margin) = if direction.is_left_to_right() {
        (outline.start_margin, outline.end_margin)
    } else {
        (outline.end_margin, outline.start_margin)
    };
    let (mut left_overlap, mut right_overlap) = (0.0, 0.0);
    for area in white_areas {
        if area.top > row.bounds.bottom || area.bottom < row.bounds.top {
            continue;
        }
        let area_left = f64::from(area.left) - row.x_adjustment;
        let area_right = f64::from(area.right) - row.x_adjustment;
        if area_left < left_margin && area_right > left_margin {
            left_overlap = area_right - left_margin;
        }
        if area_left < right_margin && area_right > right_margin {
            right_overlap = right_margin - area_left;
        }
    }
    if direction.is_left_to_right() {
        (left_overlap, right_overlap)
    } else {
        (right_overlap, left_overlap)
    }
}

/// Whether new paragraphs start with an indented or an outdented row
///
/// Counts the rows following a partial row that start at the tab versus
/// at the margin, over columns with a real tab.
fn is_indented(
    layout: &ColumnLayout,
    groups: &[Vec<usize>],
    rows: &[AdjustedRow],
    direction: WritingDirection,
    safety: f64,
) -> bool {
    let (mut indents, mut outdents) = (0, 0);
    for group in groups {
        let mut previous_partial = false;
        for &c in group {
            let column = &layout.columns[c];
            if !column.outline.has_tab {
                continue;
            }
            let outline = inward(&column.outline, direction);
            for &r in &column.rows {
                let placement = RowPlacement::new(&rows[r], direction, 0.0, 0.0);
                if previous_partial {
                    if placement.start > outline.start_tab - safety {
                        indents += 1;
                    } else if placement.start < outline.start_margin + safety {
                        outdents += 1;
                    }
                }
                previous_partial = placement.end < outline.end_margin - safety;
            }
        }
    }
    log::debug!("{} indented and {} outdented paragraph starts", indents, outdents);
    indents + 2 >= outdents
}

/// Split every column into paragraphs, in reading order
///
/// A paragraph ends after a row that stops short of the end margin, and
/// starts at an indented (or outdented) row when the column has a tab.
/// Rows of one or two shapes become paragraphs of their own. The page's
/// rows move into [`SegmentedPage::paragraphs`], and the column outlines
/// are kept in [`SegmentedPage::column_outlines`].
pub fn group_rows_into_paragraphs(page: &mut SegmentedPage) {
    let rows = adjusted_rows(page);
    let direction = page.direction;
    let mut layout = ColumnLayout::new(&rows, page.width(), page.height(), direction);
    let groups = layout.groups();
    for group in &groups {
        assign_margins(page, &rows, &mut layout, group);
    }

    let safety = 1.5 * page.statistics().width;
    let indented = is_indented(&layout, &groups, &rows, direction, safety);
    let white_areas = page.white_areas_around_large_shapes_by_row();

    let order = layout.reading_order(direction);
    let mut paragraphs: Vec<Vec<usize>> = Vec::new();
    for &c in &order {
        let column = &layout.columns[c];
        let outline = inward(&column.outline, direction);
        let mut standalone: Vec<usize> = Vec::new();
        let mut previous: Option<RowPlacement> = None;
        for &r in &column.rows {
            let row = &rows[r];
            if row.shape_count <= MAX_STANDALONE_SHAPES {
                standalone.push(row.index);
                continue;
            }
            let (start_overlap, end_overlap) = large_shape_overlaps(row, &column.outline, &white_areas, direction);
            let placement = RowPlacement::new(row, direction, start_overlap, end_overlap);
            let new_paragraph = match previous {
                None => true,
                Some(prev) => {
                    // the previous row's end is measured with this row's overlap
                    let prev_end = prev.end - end_overlap;
                    prev_end < outline.end_margin - safety
                        || (outline.has_tab && indented && placement.start > outline.start_tab - safety)
                        || (outline.has_tab && !indented && placement.start < outline.start_margin + safety)
                }
            };
            if new_paragraph {
                paragraphs.extend(standalone.drain(..).map(|s| vec![s]));
                paragraphs.push(Vec::new());
            }
            if let Some(current) = paragraphs.last_mut() {
                current.push(row.index);
            }
            previous = Some(RowPlacement::new(row, direction, 0.0, 0.0));
        }
        paragraphs.extend(standalone.into_iter().map(|s| vec![s]));
    }

    let mut slots: Vec<Option<RowOfShapes>> = std::mem::take(&mut page.rows).into_iter().map(Some).collect();
    let mut built: Vec<Paragraph> = paragraphs
        .into_iter()
        .map(|indices| indices.into_iter().filter_map(|i| slots[i].take()).collect::<Vec<_>>())
        .filter(|rows| !rows.is_empty())
        .map(Paragraph::new)
        .collect();
    built.extend(slots.into_iter().flatten().map(|row| Paragraph::new(vec![row])));
    log::debug!("grouped rows into {} paragraphs", built.len());

    page.paragraphs = built;
    page.column_outlines = order.iter().map(|&c| layout.columns[c].outline).collect();
    page.reindex();
}
