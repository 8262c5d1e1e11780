//! Pixel sources
//!
//! Every stage of the segmenter reads pixels through [`PixelSource`]. The
//! page itself is a [`crate::RasterGrid`]; a shape looks at the page through
//! a [`ShapeLocalView`], and flood fills record their work in a
//! [`WritableMirror`].
//!
//! Brightness follows the greyscale convention: 0 is black, 255 is white.
//! Coordinates outside the grid read as white.

use crate::rect::Rect;
use bitvec::prelude::*;

/// Brightness returned for coordinates outside a source
pub const WHITE: u8 = 255;

/// Read access to a rectangular grid of greyscale pixels
pub trait PixelSource {
    /// Grid width in pixels
    fn width(&self) -> u32;

    /// Grid height in pixels
    fn height(&self) -> u32;

    /// Normalized brightness at `(x, y)`, white when out of bounds
    fn pixel(&self, x: i32, y: i32) -> u8;

    /// Brightness before normalization, white when out of bounds
    fn raw_pixel(&self, x: i32, y: i32) -> u8 {
        self.pixel(x, y)
    }

    /// True if `(x, y)` lies inside the grid
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as i64) < self.width() as i64 && (y as i64) < self.height() as i64
    }

    /// True if the pixel is in bounds and no brighter than `threshold`
    #[inline]
    fn is_black(&self, x: i32, y: i32, threshold: u8) -> bool {
        self.in_bounds(x, y) && self.pixel(x, y) <= threshold
    }

    /// Count the black pixels inside a rectangle
    fn count_black(&self, rect: &Rect, threshold: u8) -> u64 {
        let mut count = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                if self.is_black(x, y, threshold) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Write access for sources that can be edited in place
pub trait WritablePixelSource: PixelSource {
    /// Set the brightness at `(x, y)`; out-of-bounds writes are ignored
    fn set_pixel(&mut self, x: i32, y: i32, value: u8);
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        (**self).pixel(x, y)
    }

    fn raw_pixel(&self, x: i32, y: i32) -> u8 {
        (**self).raw_pixel(x, y)
    }

    fn is_black(&self, x: i32, y: i32, threshold: u8) -> bool {
        (**self).is_black(x, y, threshold)
    }
}

/// A rectangle of a larger source, addressed with coordinates relative to
/// the rectangle's top-left corner
///
/// Pixels outside the rectangle read as white even when the underlying
/// source has content there.
pub struct ShapeLocalView<'a, S: PixelSource + ?Sized> {
    source: &'a S,
    rect: Rect,
}

impl<S: PixelSource + ?Sized> Clone for ShapeLocalView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: PixelSource + ?Sized> Copy for ShapeLocalView<'_, S> {}

impl<'a, S: PixelSource + ?Sized> ShapeLocalView<'a, S> {
    /// Create a view of `rect` inside `source`
    pub fn new(source: &'a S, rect: Rect) -> Self {
        Self { source, rect }
    }

    /// The rectangle in page coordinates
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The underlying page source
    pub fn source(&self) -> &'a S {
        self.source
    }
}

impl<S: PixelSource + ?Sized> PixelSource for ShapeLocalView<'_, S> {
    fn width(&self) -> u32 {
        self.rect.width().max(0) as u32
    }

    fn height(&self) -> u32 {
        self.rect.height().max(0) as u32
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        if !self.in_bounds(x, y) {
            return WHITE;
        }
        self.source.pixel(self.rect.left + x, self.rect.top + y)
    }

    fn raw_pixel(&self, x: i32, y: i32) -> u8 {
        if !self.in_bounds(x, y) {
            return WHITE;
        }
        self.source.raw_pixel(self.rect.left + x, self.rect.top + y)
    }
}

/// A bilevel bit grid used to mark pixels during flood fills
///
/// Set bits read as black (brightness 0), cleared bits as white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritableMirror {
    width: u32,
    height: u32,
    bits: BitVec<u8, Msb0>,
}

impl WritableMirror {
    /// Create an all-white mirror
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            bits: bitvec![u8, Msb0; 0; len],
        }
    }

    /// Create a mirror matching the dimensions of a source
    pub fn like<S: PixelSource + ?Sized>(source: &S) -> Self {
        Self::new(source.width(), source.height())
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// True if the bit at `(x, y)` is set
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.offset(x, y).is_some_and(|i| self.bits[i])
    }

    /// Set or clear the bit at `(x, y)`; out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if let Some(i) = self.offset(x, y) {
            self.bits.set(i, value);
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of set bits inside a rectangle
    pub fn count_ones_in(&self, rect: &Rect) -> usize {
        let mut count = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                if self.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }
}

impl PixelSource for WritableMirror {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        if self.get(x, y) { 0 } else { WHITE }
    }

    fn is_black(&self, x: i32, y: i32, _threshold: u8) -> bool {
        self.get(x, y)
    }
}

impl WritablePixelSource for WritableMirror {
    fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        self.set(x, y, value < 128);
    }
}
