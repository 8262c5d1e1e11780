//! Shape extraction by scanline flood fill
//!
//! The page is scanned row-major. Every black pixel that has not been
//! claimed yet seeds a flood fill that collects its connected region as a
//! sequence of horizontal spans. Spans wait on an explicit stack, so very
//! large regions never recurse; the stack is bounded and the fill fails
//! with [`RegionError::StackOverflow`] past the bound.

use crate::error::{RegionError, RegionResult};
use pageseg_core::{PixelSource, Rect, WritableMirror, cmp_top_to_bottom};

/// Default bound on pending spans during a single flood fill
pub const DEFAULT_MAX_STACK_SIZE: usize = 100_000;

/// Pixel connectivity used when joining spans of adjacent rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// Spans join only when they share a column
    FourWay,
    /// Spans also join when they touch diagonally
    #[default]
    EightWay,
}

/// Options for shape extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Brightness at or below which a pixel is black
    pub threshold: u8,
    /// Maximum number of pending spans (default: 100000)
    pub max_stack_size: usize,
    /// Span connectivity (default: eight-way)
    pub connectivity: ConnectivityType,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            threshold: 127,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            connectivity: ConnectivityType::EightWay,
        }
    }
}

impl ExtractOptions {
    /// Create options for a black threshold
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Set the stack bound
    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    /// Set the connectivity
    pub fn with_connectivity(mut self, connectivity: ConnectivityType) -> Self {
        self.connectivity = connectivity;
        self
    }

    fn validate(&self) -> RegionResult<()> {
        if self.max_stack_size == 0 {
            return Err(RegionError::InvalidParameters(
                "max_stack_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A connected dark region found by the flood fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedRegion {
    /// Bounding rectangle
    pub bounds: Rect,
    /// First black pixel found, the seed of the fill
    pub start: (i32, i32),
    /// Number of pixels in the region
    pub pixel_count: u64,
}

/// A pending horizontal run: columns `x_min..x_max` on row `y`
#[derive(Debug, Clone, Copy)]
struct Span {
    x_min: i32,
    x_max: i32,
    y: i32,
}

/// Extract every connected dark region of a source
///
/// # Arguments
///
/// * `source` - Pixel source to scan
/// * `options` - Threshold, stack bound and connectivity
///
/// # Returns
///
/// Regions ordered top-to-bottom, then left-to-right.
///
/// # Errors
///
/// Returns [`RegionError::StackOverflow`] if a single region needs more
/// pending spans than `options.max_stack_size`.
///
/// # Example
///
/// ```
/// use pageseg_core::RasterGrid;
/// use pageseg_region::{ExtractOptions, extract_shapes};
///
/// let mut data = vec![255u8; 10 * 4];
/// data[1 * 10 + 1] = 0;
/// data[1 * 10 + 2] = 0;
/// data[2 * 10 + 7] = 0;
/// let page = RasterGrid::bilevel(10, 4, data).unwrap();
/// let regions = extract_shapes(&page, &ExtractOptions::new(254)).unwrap();
/// assert_eq!(regions.len(), 2);
/// assert_eq!(regions[0].pixel_count, 2);
/// ```
pub fn extract_shapes<S: PixelSource + ?Sized>(
    source: &S,
    options: &ExtractOptions,
) -> RegionResult<Vec<ExtractedRegion>> {
    options.validate()?;
    let mut mirror = WritableMirror::like(source);
    let mut regions = Vec::new();

    for y in 0..source.height() as i32 {
        for x in 0..source.width() as i32 {
            if mirror.get(x, y) || !source.is_black(x, y, options.threshold) {
                continue;
            }
            regions.push(fill_region(source, &mut mirror, x, y, options)?);
        }
    }

    regions.sort_by(|a, b| cmp_top_to_bottom(&a.bounds, &b.bounds));
    log::debug!(
        "extracted {} regions at threshold {}",
        regions.len(),
        options.threshold
    );
    Ok(regions)
}

/// Flood fill the region containing `(x, y)`, marking it in `mirror`
///
/// Pixels already set in the mirror are treated as claimed and are not
/// revisited, so successive fills into one mirror never overlap.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] if the seed is not an
/// unclaimed black pixel, and [`RegionError::StackOverflow`] past the
/// stack bound.
pub fn fill_region<S: PixelSource + ?Sized>(
    source: &S,
    mirror: &mut WritableMirror,
    x: i32,
    y: i32,
    options: &ExtractOptions,
) -> RegionResult<ExtractedRegion> {
    options.validate()?;
    let threshold = options.threshold;
    if !source.is_black(x, y, threshold) || mirror.get(x, y) {
        return Err(RegionError::InvalidParameters(format!(
            "fill seed ({}, {}) is not an unclaimed black pixel",
            x, y
        )));
    }

    let is_free = |mirror: &WritableMirror, px: i32, py: i32| {
        !mirror.get(px, py) && source.is_black(px, py, threshold)
    };

    let mut bounds = Rect::new_unchecked(i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    let mut pixel_count = 0u64;
    let mut stack: Vec<Span> = Vec::new();

    let seed = claim_run(mirror, x, y, &is_free);
    stack.push(seed);

    let reach = match options.connectivity {
        ConnectivityType::EightWay => 1,
        ConnectivityType::FourWay => 0,
    };

    while let Some(span) = stack.pop() {
        bounds.include_point(span.x_min, span.y);
        bounds.include_point(span.x_max - 1, span.y);
        pixel_count += (span.x_max - span.x_min) as u64;

        for probe_y in [span.y - 1, span.y + 1] {
            let mut probe_x = span.x_min - reach;
            let probe_end = span.x_max - 1 + reach;
            while probe_x <= probe_end {
                if !is_free(mirror, probe_x, probe_y) {
                    probe_x += 1;
                    continue;
                }
                let run = claim_run(mirror, probe_x, probe_y, &is_free);
                probe_x = run.x_max + 1;
                stack.push(run);
                if stack.len() > options.max_stack_size {
                    log::debug!(
                        "flood fill from ({}, {}) exceeded {} spans",
                        x,
                        y,
                        options.max_stack_size
                    );
                    return Err(RegionError::StackOverflow {
                        limit: options.max_stack_size,
                        x,
                        y,
                    });
                }
            }
        }
    }

    log::trace!(
        "filled region from ({}, {}): {:?}, {} pixels",
        x,
        y,
        bounds,
        pixel_count
    );
    Ok(ExtractedRegion {
        bounds,
        start: (x, y),
        pixel_count,
    })
}

/// Extend a free pixel into its maximal free run on its row and claim it
fn claim_run<F>(mirror: &mut WritableMirror, x: i32, y: i32, is_free: &F) -> Span
where
    F: Fn(&WritableMirror, i32, i32) -> bool,
{
    let mut x_min = x;
    while is_free(mirror, x_min - 1, y) {
        x_min -= 1;
    }
    let mut x_max = x + 1;
    while is_free(mirror, x_max, y) {
        x_max += 1;
    }
    for px in x_min..x_max {
        mirror.set(px, y, true);
    }
    Span { x_min, x_max, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror_from(rows: &[&str]) -> WritableMirror {
        let mut m = WritableMirror::new(rows[0].len() as u32, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                m.set(x as i32, y as i32, c == 'x');
            }
        }
        m
    }

    #[test]
    fn test_extract_u_shape() {
        // a U whose arms are discovered as separate runs on the first row
        let page = mirror_from(&["x...x", "x...x", "xxxxx"]);
        let regions = extract_shapes(&page, &ExtractOptions::new(0)).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds, Rect::new_unchecked(0, 0, 4, 2));
        assert_eq!(regions[0].pixel_count, 9);
        assert_eq!(regions[0].start, (0, 0));
    }

    #[test]
    fn test_extract_diagonal_connectivity() {
        let page = mirror_from(&["x..", ".x.", "..x"]);
        let eight = extract_shapes(&page, &ExtractOptions::new(0)).unwrap();
        assert_eq!(eight.len(), 1);

        let four = extract_shapes(
            &page,
            &ExtractOptions::new(0).with_connectivity(ConnectivityType::FourWay),
        )
        .unwrap();
        assert_eq!(four.len(), 3);
    }

    #[test]
    fn test_extract_order() {
        let page = mirror_from(&["....x", "x....", "....."]);
        let regions = extract_shapes(&page, &ExtractOptions::new(0)).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds.left, 4);
        assert_eq!(regions[1].bounds.top, 1);
    }

    #[test]
    fn test_stack_overflow() {
        // a comb: every tooth becomes its own pending span
        let page = mirror_from(&["xxxxxxxxx", "x.x.x.x.x", "x.x.x.x.x"]);
        let options = ExtractOptions::new(0).with_max_stack_size(2);
        match extract_shapes(&page, &options) {
            Err(RegionError::StackOverflow { limit, .. }) => assert_eq!(limit, 2),
            other => panic!("expected stack overflow, got {:?}", other),
        }
        assert!(extract_shapes(&page, &ExtractOptions::new(0)).is_ok());
    }

    #[test]
    fn test_fill_region_rejects_claimed_seed() {
        let page = mirror_from(&["xx"]);
        let mut mirror = WritableMirror::like(&page);
        let options = ExtractOptions::new(0);
        let region = fill_region(&page, &mut mirror, 0, 0, &options).unwrap();
        assert_eq!(region.pixel_count, 2);
        assert!(fill_region(&page, &mut mirror, 1, 0, &options).is_err());
    }

    #[test]
    fn test_invalid_stack_size() {
        let page = mirror_from(&["x"]);
        assert!(extract_shapes(&page, &ExtractOptions::new(0).with_max_stack_size(0)).is_err());
    }
}
