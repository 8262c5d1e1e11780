//! Rect - inclusive axis-aligned rectangles
//!
//! Page geometry uses inclusive pixel coordinates: a rectangle covering a
//! single pixel has `left == right` and `top == bottom`. Widths and heights
//! are therefore `right - left + 1` and `bottom - top + 1`.

use crate::error::{Error, Result};
use std::cmp::Ordering;

/// Reading order of the lines on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritingDirection {
    /// Latin, Cyrillic, ...
    #[default]
    LeftToRight,
    /// Hebrew, Yiddish, Arabic, ...
    RightToLeft,
}

impl WritingDirection {
    /// Returns true for left-to-right scripts
    #[inline]
    pub fn is_left_to_right(self) -> bool {
        self == WritingDirection::LeftToRight
    }

    /// Horizontal gap between a shape and the one preceding it in reading order
    ///
    /// Negative when the two overlap horizontally.
    #[inline]
    pub fn gap(self, previous: &Rect, current: &Rect) -> i32 {
        match self {
            WritingDirection::LeftToRight => current.left - previous.right,
            WritingDirection::RightToLeft => previous.left - current.right,
        }
    }
}

/// An axis-aligned rectangle with inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left x coordinate (inclusive)
    pub left: i32,
    /// Top y coordinate (inclusive)
    pub top: i32,
    /// Right x coordinate (inclusive)
    pub right: i32,
    /// Bottom y coordinate (inclusive)
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle
    ///
    /// # Errors
    ///
    /// Returns an error if `left > right` or `top > bottom`.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self> {
        if left > right || top > bottom {
            return Err(Error::InvalidParameter(format!(
                "rectangle bounds are inverted: left={}, top={}, right={}, bottom={}",
                left, top, right, bottom
            )));
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Create a rectangle without validation
    ///
    /// Used for accumulators that start inverted and shrink onto content.
    pub const fn new_unchecked(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A rectangle covering a single pixel
    pub const fn from_point(x: i32, y: i32) -> Self {
        Self::new_unchecked(x, y, x, y)
    }

    /// Width in pixels
    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    /// Area in pixels (0 for inverted rectangles)
    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// True if the bounds are inverted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    /// Horizontal midpoint
    #[inline]
    pub fn mid_x(&self) -> f64 {
        (self.left as f64 + self.right as f64) / 2.0
    }

    /// Vertical midpoint
    #[inline]
    pub fn mid_y(&self) -> f64 {
        (self.top as f64 + self.bottom as f64) / 2.0
    }

    /// Check if a point is inside the rectangle
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Check if another rectangle is fully inside this one
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Check if the rectangles share at least one pixel
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Check if the rectangles share at least one column
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left <= other.right && other.left <= self.right
    }

    /// Check if the rectangles share at least one row
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.top <= other.bottom && other.top <= self.bottom
    }

    /// Intersection, or `None` if the rectangles are disjoint
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new_unchecked(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new_unchecked(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Grow the rectangle to include a point
    pub fn include_point(&mut self, x: i32, y: i32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }

    /// Move by an offset
    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new_unchecked(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Grow (or shrink, for negative amounts) on every side
    pub fn expand(&self, amount: i32) -> Rect {
        Rect::new_unchecked(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    /// Clip to a `width` x `height` grid anchored at the origin
    pub fn clip(&self, width: i32, height: i32) -> Option<Rect> {
        self.intersect(&Rect::new_unchecked(0, 0, width - 1, height - 1))
    }
}

/// Anything with an inclusive bounding rectangle
pub trait Bounded {
    /// The bounding rectangle
    fn bounds(&self) -> Rect;

    fn left(&self) -> i32 {
        self.bounds().left
    }

    fn top(&self) -> i32 {
        self.bounds().top
    }

    fn right(&self) -> i32 {
        self.bounds().right
    }

    fn bottom(&self) -> i32 {
        self.bounds().bottom
    }

    fn width(&self) -> i32 {
        self.bounds().width()
    }

    fn height(&self) -> i32 {
        self.bounds().height()
    }
}

impl Bounded for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

/// Order rectangles top-to-bottom, then left-to-right
///
/// Ties on the top-left corner are broken by bottom, then right, so the
/// ordering is total over distinct rectangles.
pub fn cmp_top_to_bottom(a: &Rect, b: &Rect) -> Ordering {
    a.top
        .cmp(&b.top)
        .then(a.left.cmp(&b.left))
        .then(a.bottom.cmp(&b.bottom))
        .then(a.right.cmp(&b.right))
}

/// Order rectangles left-to-right
pub fn cmp_left_to_right(a: &Rect, b: &Rect) -> Ordering {
    a.left
        .cmp(&b.left)
        .then(a.right.cmp(&b.right))
        .then(a.top.cmp(&b.top))
        .then(a.bottom.cmp(&b.bottom))
}

/// Order rectangles right-to-left
pub fn cmp_right_to_left(a: &Rect, b: &Rect) -> Ordering {
    b.right
        .cmp(&a.right)
        .then(b.left.cmp(&a.left))
        .then(a.top.cmp(&b.top))
        .then(a.bottom.cmp(&b.bottom))
}

/// Order rectangles in the reading order of a writing direction
pub fn cmp_reading_order(direction: WritingDirection, a: &Rect, b: &Rect) -> Ordering {
    match direction {
        WritingDirection::LeftToRight => cmp_left_to_right(a, b),
        WritingDirection::RightToLeft => cmp_right_to_left(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10, 20, 19, 59).unwrap();
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 40);
        assert_eq!(r.area(), 400);
        assert_eq!(Rect::from_point(3, 4).area(), 1);
    }

    #[test]
    fn test_rect_invalid() {
        assert!(Rect::new(5, 0, 4, 0).is_err());
        assert!(Rect::new(0, 5, 0, 4).is_err());
    }

    #[test]
    fn test_rect_intersect_union() {
        let a = Rect::new_unchecked(0, 0, 9, 9);
        let b = Rect::new_unchecked(5, 5, 14, 14);
        assert_eq!(a.intersect(&b), Some(Rect::new_unchecked(5, 5, 9, 9)));
        assert_eq!(a.union(&b), Rect::new_unchecked(0, 0, 14, 14));

        let c = Rect::new_unchecked(10, 0, 12, 3);
        assert!(a.intersect(&c).is_none());
        assert!(!a.overlaps(&c));
        assert!(a.overlaps_vertically(&c));
    }

    #[test]
    fn test_rect_contains() {
        let a = Rect::new_unchecked(0, 0, 9, 9);
        assert!(a.contains(&Rect::new_unchecked(2, 2, 9, 9)));
        assert!(!a.contains(&Rect::new_unchecked(2, 2, 10, 9)));
        assert!(a.contains_point(9, 0));
        assert!(!a.contains_point(10, 0));
    }

    #[test]
    fn test_include_point() {
        let mut r = Rect::new_unchecked(i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        assert!(r.is_empty());
        r.include_point(4, 7);
        r.include_point(2, 9);
        assert_eq!(r, Rect::new_unchecked(2, 7, 4, 9));
    }

    #[test]
    fn test_writing_direction_gap() {
        let a = Rect::new_unchecked(0, 0, 9, 9);
        let b = Rect::new_unchecked(13, 0, 20, 9);
        assert_eq!(WritingDirection::LeftToRight.gap(&a, &b), 4);
        assert_eq!(WritingDirection::RightToLeft.gap(&b, &a), 4);
    }

    #[test]
    fn test_comparators() {
        let mut rects = vec![
            Rect::new_unchecked(30, 0, 35, 5),
            Rect::new_unchecked(0, 10, 5, 15),
            Rect::new_unchecked(10, 0, 15, 5),
        ];
        rects.sort_by(cmp_top_to_bottom);
        assert_eq!(rects[0].left, 10);
        assert_eq!(rects[2].top, 10);

        rects.sort_by(|a, b| cmp_reading_order(WritingDirection::RightToLeft, a, b));
        assert_eq!(rects[0].left, 30);
        assert_eq!(rects[2].left, 0);
    }
}
