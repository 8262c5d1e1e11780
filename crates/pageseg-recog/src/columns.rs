//! Text columns
//!
//! Two complementary views of a page's column structure:
//!
//! - [`find_column_separators`] looks for tall white bands in the
//!   projection of every shape onto the horizontal axis, restricted to the
//!   main text block. The bands guide the second pass of row grouping.
//! - [`ColumnLayout::new`] splits the page into areas at wide horizontal
//!   gaps and stacks the rows of each area into [`Column`]s, which are then
//!   grouped across areas. Paragraph detection works per column group.
//!
//! Horizontal positions are compared after removing the page slope, which
//! is what "adjusted" means throughout.

use crate::page::SegmentedPage;
use crate::row::RowOfShapes;
use pageseg_core::stats::{mean, percentile};
use pageseg_core::{Bounded, Rect, WritingDirection, cmp_top_to_bottom};
use std::cmp::Ordering;

/// White bands must be this many median x-heights tall to split areas
const AREA_BREAK_FACTOR: f64 = 1.3;

/// A row's geometry with the page slope removed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedRow {
    /// Index of the row in the page's row list
    pub index: usize,
    pub bounds: Rect,
    pub x_adjustment: f64,
    pub x_height: i32,
    pub shape_count: usize,
    /// Baseline height at the row's middle
    pub baseline_mid: f64,
}

impl AdjustedRow {
    pub fn from_row(index: usize, row: &RowOfShapes, page: &SegmentedPage) -> Self {
        Self {
            index,
            bounds: row.bounds(),
            x_adjustment: row.x_adjustment(&page.arena, page.mean_horizontal_slope()),
            x_height: row.x_height,
            shape_count: row.shapes.len(),
            baseline_mid: row.baseline_mid_point(&page.arena),
        }
    }

    /// Left edge with the slope removed
    pub fn left(&self) -> f64 {
        self.bounds.left as f64 - self.x_adjustment
    }

    /// Right edge with the slope removed
    pub fn right(&self) -> f64 {
        self.bounds.right as f64 - self.x_adjustment
    }
}

/// The page's rows with slope-adjusted geometry
pub fn adjusted_rows(page: &SegmentedPage) -> Vec<AdjustedRow> {
    page.rows
        .iter()
        .enumerate()
        .map(|(i, row)| AdjustedRow::from_row(i, row, page))
        .collect()
}

/// Margins and tab position of a column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnOutline {
    pub adjusted_left: f64,
    pub adjusted_right: f64,
    pub top: f64,
    pub bottom: f64,
    /// Margin on the side where rows begin
    pub start_margin: f64,
    /// Indentation position of a paragraph's first row
    pub start_tab: f64,
    /// Margin on the side where rows end
    pub end_margin: f64,
    /// Whether the tab came from a real cluster of indented rows
    pub has_tab: bool,
}

/// Rows stacked in one vertical reading channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    /// Positions in the row slice the column was built from
    pub rows: Vec<usize>,
    pub outline: ColumnOutline,
    pub closed: bool,
}

impl Column {
    fn with_row(row: usize) -> Self {
        Self {
            rows: vec![row],
            ..Self::default()
        }
    }

    /// Recompute the extent and default margins from the rows
    pub fn recalculate(
        &mut self,
        rows: &[AdjustedRow],
        page_width: u32,
        page_height: u32,
        direction: WritingDirection,
    ) {
        let outline = &mut self.outline;
        outline.adjusted_left = page_width as f64;
        outline.adjusted_right = 0.0;
        outline.top = page_height as f64;
        outline.bottom = 0.0;
        for &r in &self.rows {
            let row = &rows[r];
            outline.adjusted_left = outline.adjusted_left.min(row.left());
            outline.adjusted_right = outline.adjusted_right.max(row.right());
            outline.top = outline.top.min(row.bounds.top as f64);
            outline.bottom = outline.bottom.max(row.bounds.bottom as f64);
        }
        if direction.is_left_to_right() {
            outline.start_margin = outline.adjusted_left;
            outline.end_margin = outline.adjusted_right;
        } else {
            outline.start_margin = outline.adjusted_right;
            outline.end_margin = outline.adjusted_left;
        }
    }

    pub fn width(&self) -> i32 {
        (self.outline.adjusted_right - self.outline.adjusted_left + 1.0) as i32
    }

    fn overlaps_horizontally(&self, other: &Column) -> bool {
        self.outline.adjusted_right >= other.outline.adjusted_left
            && self.outline.adjusted_left <= other.outline.adjusted_right
    }

    /// Order for reading: side by side columns by direction, else top first
    fn cmp_reading(&self, other: &Column, direction: WritingDirection) -> Ordering {
        let (a, b) = (&self.outline, &other.outline);
        let vertical_overlap = a.top < b.bottom && b.top < a.bottom;
        let (before, after) = if direction.is_left_to_right() {
            (a.adjusted_right < b.adjusted_left, b.adjusted_right < a.adjusted_left)
        } else {
            (a.adjusted_left > b.adjusted_right, b.adjusted_left > a.adjusted_right)
        };
        if before && vertical_overlap {
            Ordering::Less
        } else if after && vertical_overlap {
            Ordering::Greater
        } else {
            a.top.total_cmp(&b.top)
        }
    }
}

/// Columns found per horizontal area of the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    pub columns: Vec<Column>,
    /// Column indices per area, top area first
    pub areas: Vec<Vec<usize>>,
}

impl ColumnLayout {
    /// Split rows into areas and stack each area's rows into columns
    pub fn new(
        rows: &[AdjustedRow],
        page_width: u32,
        page_height: u32,
        direction: WritingDirection,
    ) -> Self {
        let mut layout = Self::default();
        for area in areas(rows, page_height) {
            let mut in_area: Vec<usize> = Vec::new();
            for r in area {
                let row = &rows[r];
                let overlapping: Vec<usize> = in_area
                    .iter()
                    .copied()
                    .filter(|&c| {
                        let column = &layout.columns[c];
                        let last = column.rows.last().map(|&l| &rows[l]);
                        !column.closed
                            && last.is_some_and(|last| {
                                row.right() >= last.left() && row.left() <= last.right()
                            })
                    })
                    .collect();

                if let [mine] = overlapping[..] {
                    let my_last_top = layout.columns[mine]
                        .rows
                        .last()
                        .map(|&l| rows[l].bounds.top)
                        .unwrap_or(row.bounds.top);
                    for &c in &in_area {
                        let column = &mut layout.columns[c];
                        if c == mine || column.closed {
                            continue;
                        }
                        if let Some(&last) = column.rows.last() {
                            if my_last_top > rows[last].bounds.bottom {
                                column.closed = true;
                            }
                        }
                    }
                    layout.columns[mine].rows.push(r);
                } else {
                    for c in overlapping {
                        layout.columns[c].closed = true;
                    }
                    layout.columns.push(Column::with_row(r));
                    in_area.push(layout.columns.len() - 1);
                }
            }
            if !in_area.is_empty() {
                layout.areas.push(in_area);
            }
        }
        for column in &mut layout.columns {
            column.recalculate(rows, page_width, page_height, direction);
        }
        log::debug!(
            "found {} columns in {} areas",
            layout.columns.len(),
            layout.areas.len()
        );
        layout
    }

    /// Group columns of consecutive areas that line up with each other
    ///
    /// A column joins the group of a column in the previous area when it is
    /// the only column overlapping it and overlaps no other column there.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let group_of = |groups: &mut Vec<Vec<usize>>, column: usize| -> usize {
            match groups.iter().position(|g| g.contains(&column)) {
                Some(g) => g,
                None => {
                    groups.push(vec![column]);
                    groups.len() - 1
                }
            }
        };

        for pair in self.areas.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            for &prev in previous {
                let g = group_of(&mut groups, prev);
                let prev_column = &self.columns[prev];
                let mut overlapping = current
                    .iter()
                    .copied()
                    .filter(|&c| self.columns[c].overlaps_horizontally(prev_column));
                let unique = match (overlapping.next(), overlapping.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                };
                let Some(c) = unique else {
                    continue;
                };
                let shared = previous
                    .iter()
                    .any(|&other| other != prev && self.columns[c].overlaps_horizontally(&self.columns[other]));
                if !shared {
                    groups[g].push(c);
                }
            }
        }
        if let Some(last) = self.areas.last() {
            for &column in last {
                group_of(&mut groups, column);
            }
        }
        groups
    }

    /// Column indices in reading order
    pub fn reading_order(&self, direction: WritingDirection) -> Vec<usize> {
        let mut ordered: Vec<usize> = Vec::with_capacity(self.columns.len());
        for c in 0..self.columns.len() {
            let column = &self.columns[c];
            let at = ordered.partition_point(|&o| {
                self.columns[o].cmp_reading(column, direction) == Ordering::Less
            });
            ordered.insert(at, c);
        }
        ordered
    }
}

/// Rows between wide horizontal white bands, each area top to bottom
fn areas(rows: &[AdjustedRow], page_height: u32) -> Vec<Vec<usize>> {
    let height = page_height as i32;
    let mut full = vec![false; page_height as usize];
    for row in rows {
        for y in row.bounds.top.max(0)..=row.bounds.bottom.min(height - 1) {
            full[y as usize] = true;
        }
    }
    let x_heights: Vec<f64> = rows.iter().map(|r| r.x_height as f64).collect();
    let mut typical = percentile(&x_heights, 50.0);
    if typical <= 0.0 {
        let heights: Vec<f64> = rows.iter().map(|r| r.bounds.height() as f64).collect();
        typical = percentile(&heights, 50.0);
    }
    let min_white = typical * AREA_BREAK_FACTOR;

    let mut whites: Vec<(i32, i32)> = Vec::new();
    let mut white_start: Option<i32> = None;
    for y in 0..height {
        match (full[y as usize], white_start) {
            (false, None) => white_start = Some(y),
            (true, Some(start)) => {
                if (y - start) as f64 > min_white {
                    whites.push((start, y - 1));
                }
                white_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = white_start {
        whites.push((start, height - 1));
    }
    whites.push((height, height));

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| cmp_top_to_bottom(&rows[a].bounds, &rows[b].bounds));

    let mut result = Vec::new();
    let mut start_y = -1;
    for (white_top, white_bottom) in whites {
        let area: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&r| rows[r].bounds.top >= start_y && rows[r].bounds.bottom <= white_top)
            .collect();
        if !area.is_empty() {
            result.push(area);
        }
        start_y = white_bottom;
    }
    result
}

/// Runs where `is_empty` holds, as `(first, first non-empty)` pairs
fn empty_ranges(counts: &[i64], from: usize, to: usize, is_empty: impl Fn(i64) -> bool) -> Vec<(i32, i32)> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &count) in counts.iter().enumerate().take(to + 1).skip(from) {
        match (is_empty(count), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                ranges.push((s as i32, i as i32));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push((s as i32, to as i32));
    }
    ranges
}

/// Vertical white bands separating text columns within the main text block
///
/// The main text block is bounded by the first big horizontal gaps at the
/// top and bottom of the page, to skip running headers and footers.
pub fn find_column_separators(page: &SegmentedPage) -> Vec<Rect> {
    let (width, height) = (page.width() as usize, page.height() as usize);
    if page.rows.is_empty() || width == 0 || height == 0 {
        return Vec::new();
    }
    let slope = page.mean_horizontal_slope();
    let mid_x = page.width() as f64 / 2.0;
    let adjusted_top = |b: &Rect| (b.top as f64 + slope * (b.mid_x() - mid_x)).round() as i64;

    let mut horizontal = vec![0i64; height];
    let x_heights: Vec<f64> = page.rows.iter().map(|r| r.x_height as f64).collect();
    for row in &page.rows {
        for &id in &row.shapes {
            let b = page.arena[id].bounds;
            let top = adjusted_top(&b);
            if top < 0 || top >= height as i64 {
                continue;
            }
            for y in top..(top + b.height() as i64).min(height as i64) {
                horizontal[y as usize] += b.width() as i64;
            }
        }
    }

    let non_empty: Vec<f64> = horizontal.iter().filter(|&&c| c > 0).map(|&c| c as f64).collect();
    let max_empty_row = mean(&non_empty) / 8.0;
    let horizontal_ranges = empty_ranges(&horizontal, 0, height - 1, |c| c as f64 <= max_empty_row);

    let mean_x_height = mean(&x_heights);
    let min_horizontal_break = mean_x_height * 2.0;
    let half_x_height = (mean_x_height / 2.0) as i32;

    let (mut small, mut big) = (0, 0);
    let mut main_top = 0;
    for &(start, end) in &horizontal_ranges {
        let gap = (end - start) as f64;
        if big < 2 && small < 2 && gap > min_horizontal_break {
            main_top = end;
            big += 1;
        }
        if gap <= min_horizontal_break {
            small += 1;
        }
    }
    let min_top = (main_top - half_x_height).max(0);
    let mut y = main_top;
    while y > min_top {
        main_top = y;
        if horizontal.get(y as usize).is_some_and(|&c| c == 0) {
            break;
        }
        y -= 1;
    }

    let (mut small, mut big) = (0, 0);
    let mut main_bottom = height as i32;
    for &(start, end) in horizontal_ranges.iter().rev() {
        let gap = (end - start) as f64;
        if big + small <= 2 && gap > min_horizontal_break {
            main_bottom = start;
            big += 1;
        }
        if gap <= min_horizontal_break {
            small += 1;
        }
        if big + small > 2 {
            break;
        }
    }
    let max_bottom = (main_bottom + half_x_height).min(height as i32);
    for y in main_bottom..max_bottom {
        main_bottom = y;
        if horizontal[y as usize] == 0 {
            break;
        }
    }
    let main_bottom = main_bottom.min(height as i32 - 1);

    let mut vertical = vec![0i64; width];
    for row in &page.rows {
        let x_adjustment = row.x_adjustment(&page.arena, slope);
        for &id in &row.shapes {
            let b = page.arena[id].bounds;
            let left = (b.left as f64 - x_adjustment).round() as i64;
            let top = adjusted_top(&b);
            if top < main_top as i64 || top > main_bottom as i64 || left < 0 || left >= width as i64 {
                continue;
            }
            for x in left..(left + b.width() as i64).min(width as i64) {
                vertical[x as usize] += b.height() as i64;
            }
        }
    }

    let non_empty: Vec<f64> = vertical.iter().filter(|&&c| c > 0).map(|&c| c as f64).collect();
    let max_empty_column = percentile(&non_empty, 1.0);
    let min_vertical_break = percentile(&x_heights, 50.0);

    let separators: Vec<Rect> = empty_ranges(&vertical, 0, width - 1, |c| (c as f64) < max_empty_column)
        .into_iter()
        .filter(|&(start, end)| (end - start) as f64 >= min_vertical_break)
        .map(|column_break| {
            let (left, right) = widest_empty_core(&vertical, column_break, max_empty_column);
            Rect::new_unchecked(left, main_top, right, main_bottom)
        })
        .collect();
    log::debug!(
        "main text block {}..{}, {} column separators",
        main_top,
        main_bottom,
        separators.len()
    );
    separators
}

/// Narrow a column break to its widest run of near-empty columns
///
/// The emptiness threshold starts at zero and rises in eighths of
/// `max_count` until some run is found.
fn widest_empty_core(counts: &[i64], column_break: (i32, i32), max_count: f64) -> (i32, i32) {
    if max_count <= 0.0 {
        return column_break;
    }
    let (from, to) = (column_break.0 as usize, column_break.1 as usize);
    let mut threshold = 0.0;
    while threshold <= max_count {
        let best = empty_ranges(counts, from, to, |c| c as f64 <= threshold)
            .into_iter()
            .reduce(|best, r| if r.1 - r.0 > best.1 - best.0 { r } else { best });
        if let Some(best) = best {
            return best;
        }
        threshold += max_count / 8.0;
    }
    column_break
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, left: i32, top: i32, right: i32) -> AdjustedRow {
        AdjustedRow {
            index,
            bounds: Rect::new_unchecked(left, top, right, top + 19),
            x_adjustment: 0.0,
            x_height: 10,
            shape_count: 10,
            baseline_mid: (top + 15) as f64,
        }
    }

    #[test]
    fn test_two_columns_in_one_area() {
        let mut rows = Vec::new();
        for i in 0..4 {
            rows.push(row(rows.len(), 10, 10 + i * 25, 190));
            rows.push(row(rows.len(), 250, 10 + i * 25, 430));
        }
        let layout = ColumnLayout::new(&rows, 450, 200, WritingDirection::LeftToRight);
        assert_eq!(layout.areas.len(), 1);
        assert_eq!(layout.columns.len(), 2);
        assert!(layout.columns.iter().all(|c| c.rows.len() == 4));
        assert_eq!(layout.columns[0].outline.start_margin, 10.0);
        assert_eq!(layout.columns[1].outline.end_margin, 430.0);

        let order = layout.reading_order(WritingDirection::LeftToRight);
        assert_eq!(layout.columns[order[0]].outline.adjusted_left, 10.0);
        let order = layout.reading_order(WritingDirection::RightToLeft);
        assert_eq!(layout.columns[order[0]].outline.adjusted_left, 250.0);
    }

    #[test]
    fn test_areas_and_groups() {
        let mut rows = Vec::new();
        for i in 0..3 {
            rows.push(row(rows.len(), 10, 10 + i * 25, 190));
        }
        // a wide gap, then two columns below the first one
        for i in 0..3 {
            rows.push(row(rows.len(), 10, 200 + i * 25, 90));
            rows.push(row(rows.len(), 110, 200 + i * 25, 190));
        }
        let layout = ColumnLayout::new(&rows, 200, 300, WritingDirection::LeftToRight);
        assert_eq!(layout.areas.len(), 2);
        assert_eq!(layout.columns.len(), 3);
        let groups = layout.groups();
        // the top column overlaps both lower columns, so nothing is grouped
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_aligned_areas_are_grouped() {
        let mut rows = Vec::new();
        for i in 0..3 {
            rows.push(row(rows.len(), 10, 10 + i * 25, 190));
        }
        for i in 0..3 {
            rows.push(row(rows.len(), 10, 200 + i * 25, 190));
        }
        let layout = ColumnLayout::new(&rows, 200, 300, WritingDirection::LeftToRight);
        assert_eq!(layout.areas.len(), 2);
        assert_eq!(layout.groups(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_rows_without_x_height_share_an_area() {
        let mut rows = Vec::new();
        for i in 0..6 {
            let mut r = row(rows.len(), 10, 10 + i * 25, 190);
            r.x_height = 0;
            rows.push(r);
        }
        let layout = ColumnLayout::new(&rows, 200, 200, WritingDirection::LeftToRight);
        assert_eq!(layout.areas.len(), 1);
        assert_eq!(layout.columns.len(), 1);
        assert_eq!(layout.columns[0].rows.len(), 6);
    }

    #[test]
    fn test_reading_order_is_antisymmetric() {
        let column = |left: f64, right: f64, top: f64| Column {
            rows: vec![0],
            outline: ColumnOutline {
                adjusted_left: left,
                adjusted_right: right,
                top,
                bottom: top + 50.0,
                ..ColumnOutline::default()
            },
            closed: false,
        };
        let a = column(10.0, 100.0, 20.0);
        let b = column(50.0, 150.0, 20.0);
        let direction = WritingDirection::LeftToRight;
        assert_eq!(a.cmp_reading(&b, direction), Ordering::Equal);
        assert_eq!(b.cmp_reading(&a, direction), Ordering::Equal);
        let c = column(50.0, 150.0, 90.0);
        assert_eq!(a.cmp_reading(&c, direction), Ordering::Less);
        assert_eq!(c.cmp_reading(&a, direction), Ordering::Greater);
    }

    #[test]
    fn test_widest_empty_core() {
        let counts = [5, 0, 0, 3, 0, 0, 0, 4];
        assert_eq!(widest_empty_core(&counts, (0, 7), 8.0), (4, 7));
        assert_eq!(empty_ranges(&counts, 0, 7, |c| c == 0), vec![(1, 3), (4, 7)]);
    }
}
