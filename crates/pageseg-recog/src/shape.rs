//! Letter shapes
//!
//! A [`Shape`] is a rectangle over the page plus the guide lines and
//! classification results attached to it. Shapes never own pixels: every
//! pixel query takes the page source and reads it through a
//! [`ShapeLocalView`], so coordinates passed to those methods are relative
//! to the shape's top-left corner.
//!
//! Shapes live in a [`ShapeArena`] owned by the page; rows and groups refer
//! to them by [`ShapeId`].

use pageseg_core::{Bounded, PixelSource, Rect, ShapeLocalView, WritableMirror};
use pageseg_region::{ExtractedRegion, fill_bits, shape_bits};
use std::ops::{Index, IndexMut};

/// Handle of a shape inside a [`ShapeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(usize);

impl ShapeId {
    /// Position of the shape in its arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single letter (or letter fragment) on the page
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Bounding rectangle in page coordinates
    pub bounds: Rect,
    /// First black pixel found when the shape was built, relative to `bounds`
    pub start: Option<(i32, i32)>,
    /// Baseline offset from the top
    pub base_line: i32,
    /// Meanline offset from the top
    pub mean_line: i32,
    /// Capline offset from the top
    pub cap_line: i32,
    /// Letter assigned by a classifier, empty when unknown
    pub letter: String,
    /// Confidence of the assigned letter
    pub confidence: f64,
    /// Index of the owning row, set by reindexing
    pub row: Option<usize>,
    /// Index of the owning group within its row, set by reindexing
    pub group: Option<usize>,
    /// Position within the owning group (or row before grouping)
    pub index: usize,
}

impl Shape {
    /// Create a shape covering `bounds`
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            start: None,
            base_line: 0,
            mean_line: 0,
            cap_line: 0,
            letter: String::new(),
            confidence: 0.0,
            row: None,
            group: None,
            index: 0,
        }
    }

    /// Create a shape from a flood-filled region
    pub fn from_region(region: &ExtractedRegion) -> Self {
        let mut shape = Self::new(region.bounds);
        shape.start = Some((
            region.start.0 - region.bounds.left,
            region.start.1 - region.bounds.top,
        ));
        shape
    }

    /// Grow the shape to cover `other`, keeping the starting point on its pixel
    pub fn absorb(&mut self, other: Rect) {
        let bounds = self.bounds.union(&other);
        if let Some((x, y)) = self.start {
            self.start = Some((
                x + self.bounds.left - bounds.left,
                y + self.bounds.top - bounds.top,
            ));
        }
        self.bounds = bounds;
    }

    /// Distance between baseline and meanline
    pub fn x_height(&self) -> i32 {
        self.base_line - self.mean_line
    }

    /// Centre of the bounding rectangle
    pub fn centre(&self) -> (f64, f64) {
        (self.bounds.mid_x(), self.bounds.mid_y())
    }

    /// The shape's pixels, addressed relative to its corner
    pub fn view<'a, S: PixelSource + ?Sized>(&self, source: &'a S) -> ShapeLocalView<'a, S> {
        ShapeLocalView::new(source, self.bounds)
    }

    /// Whether a pixel relative to the shape is black; false outside the shape
    pub fn is_pixel_black<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        x: i32,
        y: i32,
        threshold: u8,
    ) -> bool {
        self.view(source).is_black(x, y, threshold)
    }

    /// Black pixels of the shape at a threshold
    pub fn bits<S: PixelSource + ?Sized>(&self, source: &S, threshold: u8) -> WritableMirror {
        shape_bits(&self.view(source), threshold)
    }

    /// Black pixels after `fill_factor` filling passes
    ///
    /// Filling only applies to shapes whose box holds at most two
    /// brightness levels, the usual sign of a bilevel scan.
    pub fn filled_bits<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        threshold: u8,
        fill_factor: u32,
    ) -> WritableMirror {
        let bits = self.bits(source, threshold);
        if fill_factor > 0 && self.is_black_and_white(source) {
            fill_bits(&bits, fill_factor)
        } else {
            bits
        }
    }

    /// True when the shape's box contains at most two brightness levels
    pub fn is_black_and_white<S: PixelSource + ?Sized>(&self, source: &S) -> bool {
        let view = self.view(source);
        let mut seen = [false; 256];
        let mut levels = 0;
        for y in 0..view.height() as i32 {
            for x in 0..view.width() as i32 {
                let p = view.pixel(x, y) as usize;
                if !seen[p] {
                    seen[p] = true;
                    levels += 1;
                    if levels > 2 {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Black pixels missing at least one of their four direct neighbours
    pub fn outline<S: PixelSource + ?Sized>(&self, source: &S, threshold: u8) -> WritableMirror {
        let view = self.view(source);
        let mut outline = WritableMirror::like(&view);
        for y in 0..view.height() as i32 {
            for x in 0..view.width() as i32 {
                if !view.is_black(x, y, threshold) {
                    continue;
                }
                let inner = view.is_black(x - 1, y, threshold)
                    && view.is_black(x + 1, y, threshold)
                    && view.is_black(x, y - 1, threshold)
                    && view.is_black(x, y + 1, threshold);
                outline.set(x, y, !inner);
            }
        }
        outline
    }

    /// Sum of darkness (`255 - pixel`) over the shape's box
    pub fn total_brightness<S: PixelSource + ?Sized>(&self, source: &S) -> u64 {
        let view = self.view(source);
        let mut total = 0u64;
        for y in 0..view.height() as i32 {
            for x in 0..view.width() as i32 {
                total += u64::from(255 - view.pixel(x, y));
            }
        }
        total
    }

    /// Number of black pixels in the shape's box
    pub fn pixel_count<S: PixelSource + ?Sized>(&self, source: &S, threshold: u8) -> u64 {
        source.count_black(&self.bounds, threshold)
    }

    /// The recorded starting point, or the first black pixel in row-major order
    pub fn starting_point<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        threshold: u8,
    ) -> Option<(i32, i32)> {
        if let Some(start) = self.start {
            return Some(start);
        }
        let view = self.view(source);
        for y in 0..view.height() as i32 {
            for x in 0..view.width() as i32 {
                if view.is_black(x, y, threshold) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

impl Bounded for Shape {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Owner of every shape found on a page
///
/// Shapes are never removed from the arena; a shape that no row refers to
/// is simply no longer part of the segmentation.
#[derive(Debug, Clone, Default)]
pub struct ShapeArena {
    shapes: Vec<Shape>,
}

impl ShapeArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape and return its handle
    pub fn push(&mut self, shape: Shape) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    /// Get a shape
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0)
    }

    /// Get a shape for modification
    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.0)
    }

    /// Number of shapes ever added
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True if no shape was ever added
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterate over all shapes with their handles
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter().enumerate().map(|(i, s)| (ShapeId(i), s))
    }

    /// Bounding rectangle of a set of shapes
    pub fn bounds_of<'a, I>(&self, ids: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a ShapeId>,
    {
        ids.into_iter()
            .map(|&id| self[id].bounds)
            .reduce(|a, b| a.union(&b))
    }
}

impl Index<ShapeId> for ShapeArena {
    type Output = Shape;

    fn index(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0]
    }
}

impl IndexMut<ShapeId> for ShapeArena {
    fn index_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.0]
    }
}
