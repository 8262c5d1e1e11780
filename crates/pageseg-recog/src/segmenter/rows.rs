//! Row grouping and row splitting

use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use crate::row::RowOfShapes;
use crate::shape::{ShapeArena, ShapeId};
use pageseg_core::stats::mean;
use pageseg_core::{Bounded, Percentiles, PixelSource, Rect, SimpleRegression, cmp_top_to_bottom};

/// Horizontal search range around a shape, narrowed by white areas
///
/// Columns on each side keep the vertical interval still open for
/// neighbours. A white area covering the shape's full height closes the
/// range beyond it; a partial one shrinks the interval of every column
/// behind it, and the range closes at the first column left with nothing.
#[derive(Debug)]
struct SearchWindow {
    shape: Rect,
    search_left: i32,
    new_search_left: i32,
    new_search_right: i32,
    /// Index `k` is column `search_left + k`
    left_area: Vec<(i32, i32)>,
    /// Index `k` is column `shape.right + k`
    right_area: Vec<(i32, i32)>,
}

impl SearchWindow {
    fn new(shape: Rect, reach: f64, white_areas: &[Rect], x_adjustment: f64) -> Self {
        let search_left = (shape.left as f64 - reach) as i32;
        let search_right = (shape.right as f64 + reach) as i32;
        let open = (shape.top, shape.bottom);
        let mut window = Self {
            shape,
            search_left,
            new_search_left: search_left,
            new_search_right: search_right,
            left_area: vec![open; (shape.left - search_left).max(0) as usize],
            right_area: vec![open; (search_right - shape.right).max(0) as usize],
        };
        for white in white_areas {
            window.narrow(white, x_adjustment);
        }
        window
    }

    fn narrow(&mut self, white: &Rect, x_adjustment: f64) {
        let shape = self.shape;
        let white_left = white.left as f64 + x_adjustment;
        let white_right = white.right as f64 + x_adjustment;
        if white.top > shape.bottom || white.bottom < shape.top {
            return;
        }
        let covers = white.top <= shape.top && white.bottom >= shape.bottom;
        let tighten = |limit: &mut (i32, i32)| {
            if white.bottom < shape.bottom && limit.0 < white.bottom {
                limit.0 = white.bottom + 1;
            } else if white.top > shape.top && limit.1 > white.top {
                limit.1 = white.top - 1;
            }
            limit.0 >= limit.1
        };

        if white_right > self.new_search_left as f64 && white_left < shape.left as f64 {
            if covers {
                self.new_search_left = white_right.round() as i32;
                return;
            }
            let start = white_right.round() as i32 - self.search_left;
            for k in (0..=start).rev() {
                let Some(limit) = self.left_area.get_mut(k as usize) else {
                    continue;
                };
                if tighten(limit) && self.search_left + k > self.new_search_left {
                    self.new_search_left = self.search_left + k;
                    break;
                }
            }
        } else if white_left < self.new_search_right as f64 && white_right > shape.right as f64 {
            if covers {
                self.new_search_right = white_left.round() as i32;
                return;
            }
            let start = (white_left.round() as i32 - shape.right).max(1) as usize;
            for k in start..self.right_area.len() {
                if tighten(&mut self.right_area[k]) && shape.right + (k as i32) < self.new_search_right {
                    self.new_search_right = shape.right + k as i32;
                    break;
                }
            }
        }
    }

    /// True if `other` lies beside the shape within the open range
    fn reaches(&self, other: &Rect) -> bool {
        let shape = self.shape;
        if other.top > shape.bottom || other.bottom < shape.top {
            return false;
        }
        let open = |limit: Option<&(i32, i32)>| {
            limit.is_some_and(|&(top, bottom)| other.top <= bottom && other.bottom >= top)
        };
        if other.right > self.new_search_left && other.right < shape.left {
            open(self.left_area.get((other.right - self.search_left) as usize))
        } else if other.left < self.new_search_right && other.left > shape.right {
            open(self.right_area.get((other.left - shape.right) as usize))
        } else {
            false
        }
    }
}

/// Group shapes into rows by vertical overlap with nearby shapes
///
/// Shapes enclosed by a white area are dropped from `shapes` first. With
/// `use_slope`, white areas are taken to be in slope-adjusted coordinates.
/// `shapes` must be ordered top to bottom.
///
/// # Returns
///
/// The shapes of each row, in no particular order.
pub fn group_shapes_into_rows(
    page: &SegmentedPage,
    shapes: &mut Vec<ShapeId>,
    white_areas: &[Rect],
    use_slope: bool,
    tuning: &SegmenterTuning,
) -> Vec<Vec<ShapeId>> {
    let arena = &page.arena;
    let shift = |y: i32| if use_slope { page.x_adjustment(y as f64) } else { 0.0 };

    shapes.retain(|&id| {
        let b = arena[id].bounds;
        let dx = shift(b.top);
        !white_areas.iter().any(|w| {
            w.right as f64 + dx > b.right as f64
                && (w.left as f64 + dx) < b.left as f64
                && w.top < b.top
                && w.bottom > b.bottom
        })
    });
    if shapes.is_empty() {
        return Vec::new();
    }

    let average_width = Percentiles::new(shapes.iter().map(|&id| arena[id].width() as f64)).get(50.0);
    let reach = tuning.row_search_widths * average_width;
    log::debug!("row search reach {:.1}, slope {}", reach, use_slope);

    let mut row_of: Vec<Option<usize>> = vec![None; shapes.len()];
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for i in 0..shapes.len() {
        let current = match row_of[i] {
            Some(row) => row,
            None => {
                rows.push(vec![i]);
                row_of[i] = Some(rows.len() - 1);
                rows.len() - 1
            }
        };
        let shape = arena[shapes[i]].bounds;
        let window = SearchWindow::new(shape, reach, white_areas, shift(shape.top));

        for j in 0..shapes.len() {
            if j == i || row_of[j] == Some(current) {
                continue;
            }
            let other = arena[shapes[j]].bounds;
            if other.top > shape.bottom {
                break;
            }
            if !window.reaches(&other) {
                continue;
            }
            let overlap = (shape.bottom - other.top + 1).min(other.bottom - shape.top + 1) as f64;
            if overlap / shape.height() as f64 <= tuning.min_row_overlap
                && overlap / other.height() as f64 <= tuning.min_row_overlap
            {
                continue;
            }
            match row_of[j] {
                None => {
                    rows[current].push(j);
                    row_of[j] = Some(current);
                }
                Some(other_row) => {
                    log::trace!("merging row {} into row {}", other_row, current);
                    let moved = std::mem::take(&mut rows[other_row]);
                    for &m in &moved {
                        row_of[m] = Some(current);
                    }
                    rows[current].extend(moved);
                }
            }
        }
    }

    rows.into_iter()
        .filter(|r| !r.is_empty())
        .map(|r| r.into_iter().map(|i| shapes[i]).collect())
        .collect()
}

/// Replace the page's rows, ordered top to bottom
pub fn add_rows(page: &mut SegmentedPage, rows: Vec<Vec<ShapeId>>) {
    let (width, direction) = (page.width(), page.direction);
    let mut new_rows: Vec<RowOfShapes> = rows
        .into_iter()
        .filter(|shapes| !shapes.is_empty())
        .map(|shapes| {
            let mut row = RowOfShapes::new(shapes, &page.arena, width);
            row.reorder_shapes(&page.arena, direction);
            row
        })
        .collect();
    new_rows.sort_by(|a, b| cmp_top_to_bottom(&a.bounds(), &b.bounds()));
    log::debug!("added {} rows", new_rows.len());
    page.rows = new_rows;
    page.reindex();
    page.recalculate();
}

/// Split a row whose horizontal projection shows several text lines
///
/// The projection follows the page slope. A line is entered when a pixel
/// row count rises above twice the mean and left when it falls below half
/// of it; consecutive lines are separated at the lowest count between them.
///
/// # Returns
///
/// The shapes of each line, or `None` if the row is a single line.
fn split_row<S: PixelSource + ?Sized>(
    row: &RowOfShapes,
    arena: &ShapeArena,
    source: &S,
    threshold: u8,
    slope: f64,
    min_overlap: f64,
) -> Option<Vec<Vec<ShapeId>>> {
    let b = row.bounds();
    let mut regression = SimpleRegression::new();
    regression.add(b.left as f64, b.top as f64);
    let right_y = b.top as f64 + (b.right - b.left) as f64 * slope;
    regression.add(b.right as f64, right_y);

    let y_delta = (right_y - b.top as f64).abs().ceil() as i32;
    let interval = (2 * y_delta + b.height()) as usize;
    let top_index = |r: &Rect| r.top - regression.predict(r.left as f64).round() as i32 + y_delta;

    let mut counts = vec![0u32; interval];
    for &id in &row.shapes {
        let shape = &arena[id];
        let top = top_index(&shape.bounds);
        let view = shape.view(source);
        for y in 0..shape.height() {
            let Some(count) = usize::try_from(top + y).ok().and_then(|i| counts.get_mut(i)) else {
                continue;
            };
            for x in 0..shape.width() {
                if view.is_black(x, y, threshold) {
                    *count += 1;
                }
            }
        }
    }

    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    let average = mean(&values);
    let (low, high) = (average / 2.0, average * 2.0);
    let mut switches: Vec<usize> = Vec::new();
    let mut in_line = false;
    for (i, &count) in values.iter().enumerate() {
        if !in_line && count > high {
            in_line = true;
            switches.push(i);
        } else if in_line && count < low {
            in_line = false;
            switches.push(i);
        }
    }
    if switches.len() <= 2 {
        return None;
    }

    let mut separations: Vec<i32> = Vec::new();
    for pair in switches[1..switches.len() - 1].chunks_exact(2) {
        let (out_of_line, into_line) = (pair[0], pair[1]);
        let mut lowest = high.ceil() as u32;
        let mut lowest_index = None;
        for (i, &count) in counts.iter().enumerate().take(into_line + 1).skip(out_of_line) {
            if count < lowest {
                lowest = count;
                lowest_index = Some(i as i32);
            }
        }
        separations.extend(lowest_index);
    }
    if separations.is_empty() {
        return None;
    }
    log::debug!("splitting row {} at {:?}", row.index, separations);

    let mut boundaries = vec![0];
    boundaries.extend(separations);
    boundaries.push(interval as i32 + 1);
    let mut lines: Vec<Vec<ShapeId>> = vec![Vec::new(); boundaries.len() - 1];
    for &id in &row.shapes {
        let shape = &arena[id];
        let top = top_index(&shape.bounds);
        let bottom = top + shape.height();
        let before = boundaries.iter().rposition(|&s| s <= top);
        let after = boundaries.iter().position(|&s| s >= bottom).unwrap_or(boundaries.len());
        if let Some(line) = before.filter(|&l| l + 1 == after) {
            lines[line].push(id);
            continue;
        }
        let best = boundaries
            .windows(2)
            .map(|w| bottom.min(w[1]) - top.max(w[0]))
            .enumerate()
            .filter(|&(_, pixels)| pixels > 0)
            .max_by_key(|&(line, pixels)| (pixels, std::cmp::Reverse(line)));
        match best {
            Some((line, pixels)) if pixels as f64 / shape.height() as f64 >= min_overlap => {
                lines[line].push(id);
            }
            _ => log::trace!("dropping shape {:?} straddling lines", shape.bounds),
        }
    }
    Some(lines)
}

/// Split rows made of several text lines fused by tall shapes
///
/// Shapes straddling two lines without a clear majority in one of them
/// are dropped.
pub fn split_rows<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    tuning: &SegmenterTuning,
) {
    let min_height = page.statistics().height;
    let slope = page.mean_horizontal_slope();
    let threshold = page.black_threshold();

    let mut replacements: Vec<(usize, Vec<Vec<ShapeId>>)> = Vec::new();
    for (index, row) in page.rows.iter().enumerate() {
        let b = row.bounds();
        if b.right == b.left || ((b.bottom - b.top) as f64) < min_height {
            continue;
        }
        if let Some(lines) = split_row(row, &page.arena, source, threshold, slope, tuning.row_split_overlap) {
            replacements.push((index, lines));
        }
    }
    if replacements.is_empty() {
        return;
    }

    let (width, direction) = (page.width(), page.direction);
    for (index, lines) in replacements.into_iter().rev() {
        let new_rows: Vec<RowOfShapes> = lines
            .into_iter()
            .filter(|shapes| !shapes.is_empty())
            .map(|shapes| {
                let mut row = RowOfShapes::new(shapes, &page.arena, width);
                row.reorder_shapes(&page.arena, direction);
                row
            })
            .collect();
        page.replace_row(index, new_rows);
    }
    page.reindex();
    page.recalculate();
}
