//! Shape filling
//!
//! Bilevel scans often show letters with speckled white gaps inside their
//! strokes. A filling pass turns a white pixel black when at least five of
//! its eight neighbours are black; neighbours are read from the state
//! before the pass, so one pass grows the shape by at most one pixel.
//!
//! The *fill factor* of a shape is the number of passes it takes until a
//! pass changes nothing. Clean shapes have a fill factor of 0 or 1; noisy
//! scans have higher ones, and the segmenter uses the page's mean fill
//! factor to decide how aggressively to join broken shapes.

use pageseg_core::{PixelSource, WritableMirror};

/// Upper bound on the passes counted by [`fill_factor`]
pub const MAX_FILL_PASSES: u32 = 10;

/// Minimum black neighbours (out of 8) for a white pixel to be filled
const FILL_NEIGHBOURS: u32 = 5;

/// Black pixels of a source as a bit grid
pub fn shape_bits<S: PixelSource + ?Sized>(source: &S, threshold: u8) -> WritableMirror {
    let mut bits = WritableMirror::like(source);
    for y in 0..source.height() as i32 {
        for x in 0..source.width() as i32 {
            if source.is_black(x, y, threshold) {
                bits.set(x, y, true);
            }
        }
    }
    bits
}

/// Apply `passes` filling passes to a bit grid
///
/// # Example
///
/// ```
/// use pageseg_core::WritableMirror;
/// use pageseg_region::fill_bits;
///
/// // a 3x3 block with a hole in the middle
/// let mut bits = WritableMirror::new(3, 3);
/// for y in 0..3 {
///     for x in 0..3 {
///         bits.set(x, y, !(x == 1 && y == 1));
///     }
/// }
/// let filled = fill_bits(&bits, 1);
/// assert!(filled.get(1, 1));
/// ```
pub fn fill_bits(bits: &WritableMirror, passes: u32) -> WritableMirror {
    let mut current = bits.clone();
    for _ in 0..passes {
        let (next, changed) = fill_pass(&current);
        current = next;
        if changed == 0 {
            break;
        }
    }
    current
}

/// Number of filling passes until the shape stops changing
///
/// Capped at `max_passes`.
pub fn fill_factor<S: PixelSource + ?Sized>(source: &S, threshold: u8, max_passes: u32) -> u32 {
    let mut current = shape_bits(source, threshold);
    let mut passes = 0;
    while passes < max_passes {
        let (next, changed) = fill_pass(&current);
        if changed == 0 {
            break;
        }
        current = next;
        passes += 1;
    }
    log::trace!(
        "fill factor {} for {}x{} shape",
        passes,
        source.width(),
        source.height()
    );
    passes
}

/// One filling pass; returns the new grid and the number of pixels filled
fn fill_pass(bits: &WritableMirror) -> (WritableMirror, usize) {
    let mut next = bits.clone();
    let mut changed = 0;
    for y in 0..bits.height() as i32 {
        for x in 0..bits.width() as i32 {
            if bits.get(x, y) {
                continue;
            }
            let mut neighbours = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx != 0 || dy != 0) && bits.get(x + dx, y + dy) {
                        neighbours += 1;
                    }
                }
            }
            if neighbours >= FILL_NEIGHBOURS {
                next.set(x, y, true);
                changed += 1;
            }
        }
    }
    (next, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_from(rows: &[&str]) -> WritableMirror {
        let mut m = WritableMirror::new(rows[0].len() as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                m.set(x as i32, y as i32, c == 'x');
            }
        }
        m
    }

    #[test]
    fn test_solid_shape_is_stable() {
        let bits = bits_from(&["xxx", "xxx"]);
        assert_eq!(fill_factor(&bits, 0, MAX_FILL_PASSES), 0);
        assert_eq!(fill_bits(&bits, 3), bits);
    }

    #[test]
    fn test_single_hole_needs_one_pass() {
        let bits = bits_from(&["xxxxx", "xx.xx", "xxxxx"]);
        assert_eq!(fill_factor(&bits, 0, MAX_FILL_PASSES), 1);
        assert_eq!(fill_bits(&bits, 1).count_ones(), 15);
    }

    #[test]
    fn test_square_hole_fills_inwards() {
        // corners of the hole first, then edge middles, then the centre
        let bits = bits_from(&["xxxxx", "x...x", "x...x", "x...x", "xxxxx"]);
        assert_eq!(fill_factor(&bits, 0, MAX_FILL_PASSES), 3);
        assert_eq!(fill_factor(&bits, 0, 1), 1);
        assert_eq!(fill_bits(&bits, 1).count_ones(), 20);
        assert_eq!(fill_bits(&bits, 3).count_ones(), 25);
    }

    #[test]
    fn test_edges_are_not_grown() {
        // an isolated line has at most 2 black neighbours per white pixel
        let bits = bits_from(&[".....", "xxxxx", "....."]);
        assert_eq!(fill_bits(&bits, 5), bits);
    }
}
