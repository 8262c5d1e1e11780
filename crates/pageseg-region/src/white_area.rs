//! White area detection
//!
//! Finds rectangles of white space at least `min_width` wide and
//! `min_height` tall inside a bounding rectangle. The scan walks down one
//! row at a time keeping a list of open rectangles: each white run on the
//! current row either extends an open rectangle it overlaps by at least
//! `min_width` (narrowing it to the overlap) or opens a new one. Open
//! rectangles that are not extended are closed and kept if tall enough.
//! Rectangles contained in another one are discarded as they appear.
//!
//! Dimensions are measured as coordinate differences (`right - left`,
//! `bottom - top`), so a `min_width` of 10 requires 11 white columns.

use pageseg_core::{PixelSource, Rect, cmp_top_to_bottom};

/// Find white areas around a set of known black rectangles
///
/// Only `black_areas` count as black; pixels are never read.
///
/// # Example
///
/// ```
/// use pageseg_core::Rect;
/// use pageseg_region::find_white_areas;
///
/// // two black columns with a white gutter between them
/// let black = [Rect::new(0, 0, 9, 99).unwrap(), Rect::new(30, 0, 39, 99).unwrap()];
/// let bounds = Rect::new(0, 0, 39, 99).unwrap();
/// let white = find_white_areas(&black, bounds, 5.0, 50.0);
/// assert_eq!(white, vec![Rect::new(10, 0, 29, 99).unwrap()]);
/// ```
pub fn find_white_areas(
    black_areas: &[Rect],
    bounds: Rect,
    min_width: f64,
    min_height: f64,
) -> Vec<Rect> {
    let mut pending: Vec<Rect> = black_areas.to_vec();
    pending.sort_by(cmp_top_to_bottom);
    let mut next = 0;
    let mut active: Vec<Rect> = Vec::new();

    scan(bounds, min_width, min_height, |y, row| {
        active.retain(|r| r.bottom >= y);
        while next < pending.len() && pending[next].top <= y {
            if pending[next].bottom >= y {
                active.push(pending[next]);
            }
            next += 1;
        }
        for area in &active {
            let from = area.left.max(bounds.left);
            let to = area.right.min(bounds.right);
            for x in from..=to {
                row[(x - bounds.left) as usize] = true;
            }
        }
    })
}

/// Find white areas by reading the pixels of a source
pub fn find_white_areas_in<S: PixelSource + ?Sized>(
    source: &S,
    threshold: u8,
    bounds: Rect,
    min_width: f64,
    min_height: f64,
) -> Vec<Rect> {
    scan(bounds, min_width, min_height, |y, row| {
        for (i, cell) in row.iter_mut().enumerate() {
            *cell = source.is_black(bounds.left + i as i32, y, threshold);
        }
    })
}

fn scan<F>(bounds: Rect, min_width: f64, min_height: f64, mut black_row: F) -> Vec<Rect>
where
    F: FnMut(i32, &mut [bool]),
{
    let mut white_areas = Vec::new();
    if bounds.is_empty() {
        return white_areas;
    }
    let mut open: Vec<Rect> = Vec::new();
    let mut row = vec![false; bounds.width() as usize];

    for y in bounds.top..=bounds.bottom {
        row.fill(false);
        black_row(y, &mut row);

        let mut current: Vec<Rect> = Vec::new();
        for (start, end) in white_runs(&row, bounds.left) {
            for area in &open {
                let left = start.max(area.left);
                let right = end.min(area.right);
                if (right - left) as f64 >= min_width {
                    current.push(Rect::new_unchecked(left, area.top, right, y));
                }
            }
            current.push(Rect::new_unchecked(start, y, end, y));
        }
        current.extend(open.iter().copied());

        let current = drop_contained(current);

        open.clear();
        for area in current {
            if area.bottom < y {
                if (area.bottom - area.top) as f64 >= min_height {
                    white_areas.push(area);
                }
            } else {
                open.push(area);
            }
        }
    }

    white_areas.extend(
        open.into_iter()
            .filter(|a| (a.bottom - a.top) as f64 >= min_height),
    );
    log::trace!(
        "found {} white areas of at least {}x{} in {:?}",
        white_areas.len(),
        min_width,
        min_height,
        bounds
    );
    white_areas
}

/// Maximal white runs of a row as inclusive `(start, end)` columns
fn white_runs(row: &[bool], offset: i32) -> Vec<(i32, i32)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &black) in row.iter().enumerate() {
        match (start, black) {
            (None, false) => start = Some(i),
            (Some(s), true) => {
                runs.push((offset + s as i32, offset + i as i32 - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((offset + s as i32, offset + row.len() as i32 - 1));
    }
    runs
}

/// Remove rectangles contained in another one (keeping one of equal pairs)
fn drop_contained(areas: Vec<Rect>) -> Vec<Rect> {
    let mut keep = vec![true; areas.len()];
    for i in 0..areas.len() {
        for j in (i + 1)..areas.len() {
            if !keep[j] {
                continue;
            }
            if areas[j].contains(&areas[i]) {
                keep[i] = false;
                break;
            } else if areas[i].contains(&areas[j]) {
                keep[j] = false;
            }
        }
    }
    areas
        .into_iter()
        .zip(keep)
        .filter_map(|(a, k)| k.then_some(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageseg_core::WritableMirror;

    #[test]
    fn test_white_runs() {
        let row = [true, false, false, true, false];
        assert_eq!(white_runs(&row, 10), vec![(11, 12), (14, 14)]);
        assert_eq!(white_runs(&[true, true], 0), vec![]);
    }

    #[test]
    fn test_drop_contained() {
        let a = Rect::new_unchecked(0, 0, 10, 10);
        let b = Rect::new_unchecked(2, 2, 5, 5);
        let kept = drop_contained(vec![b, a, a]);
        assert_eq!(kept, vec![a]);
    }

    #[test]
    fn test_empty_page_is_one_area() {
        let bounds = Rect::new_unchecked(0, 0, 49, 19);
        let white = find_white_areas(&[], bounds, 10.0, 10.0);
        assert_eq!(white, vec![bounds]);
    }

    #[test]
    fn test_too_small_areas_dropped() {
        // a black bar leaves a 3-row white strip above it
        let black = [Rect::new_unchecked(0, 3, 49, 19)];
        let bounds = Rect::new_unchecked(0, 0, 49, 19);
        assert!(find_white_areas(&black, bounds, 10.0, 5.0).is_empty());
        assert_eq!(
            find_white_areas(&black, bounds, 10.0, 2.0),
            vec![Rect::new_unchecked(0, 0, 49, 2)]
        );
    }

    #[test]
    fn test_pixel_and_rect_modes_agree() {
        let mut page = WritableMirror::new(40, 30);
        let blacks = [
            Rect::new_unchecked(5, 5, 12, 24),
            Rect::new_unchecked(25, 0, 30, 10),
        ];
        for r in &blacks {
            for y in r.top..=r.bottom {
                for x in r.left..=r.right {
                    page.set(x, y, true);
                }
            }
        }
        let bounds = Rect::new_unchecked(0, 0, 39, 29);
        let mut from_rects = find_white_areas(&blacks, bounds, 4.0, 4.0);
        let mut from_pixels = find_white_areas_in(&page, 0, bounds, 4.0, 4.0);
        from_rects.sort_by(cmp_top_to_bottom);
        from_pixels.sort_by(cmp_top_to_bottom);
        assert_eq!(from_rects, from_pixels);
        assert!(from_rects.contains(&Rect::new_unchecked(13, 0, 24, 29)));
    }
}
