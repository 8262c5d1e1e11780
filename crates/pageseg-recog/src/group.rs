//! Groups of shapes (words)

use crate::shape::{ShapeArena, ShapeId};
use pageseg_core::{Bounded, Rect, WritingDirection};

/// A guide line segment across a group: `(left, y_left)` to `(right, y_right)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuideSegment {
    pub left: i32,
    pub y_left: i32,
    pub right: i32,
    pub y_right: i32,
}

/// An ordered sequence of shapes forming one word
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOfShapes {
    /// Shapes in reading order
    pub shapes: Vec<ShapeId>,
    /// Position in the owning row
    pub index: usize,
    /// The word ends with a hard hyphen
    pub hard_hyphen: bool,
    /// The word continues on the next row
    pub broken_word: bool,
    /// The segmentation of this word is known to be wrong
    pub segmentation_problem: bool,
    /// Ignore this word downstream
    pub skip: bool,
    bounds: Rect,
    mean_line: GuideSegment,
    base_line: GuideSegment,
    x_height: i32,
}

impl GroupOfShapes {
    /// Create a group from shapes and compute its geometry
    pub fn new(shapes: Vec<ShapeId>, arena: &ShapeArena) -> Self {
        let mut group = Self {
            shapes,
            ..Self::default()
        };
        group.recalculate(arena);
        group
    }

    /// Recompute bounds, guide lines and x-height from the shapes
    pub fn recalculate(&mut self, arena: &ShapeArena) {
        self.bounds = arena.bounds_of(&self.shapes).unwrap_or_default();

        let mut left_most: Option<ShapeId> = None;
        let mut right_most: Option<ShapeId> = None;
        for &id in &self.shapes {
            let b = arena[id].bounds;
            if left_most.is_none_or(|l| b.left < arena[l].bounds.left) {
                left_most = Some(id);
            }
            if right_most.is_none_or(|r| b.right > arena[r].bounds.right) {
                right_most = Some(id);
            }
        }
        if let (Some(l), Some(r)) = (left_most, right_most) {
            let (l, r) = (&arena[l], &arena[r]);
            self.mean_line = GuideSegment {
                left: l.bounds.left,
                y_left: l.bounds.top + l.mean_line,
                right: r.bounds.right,
                y_right: r.bounds.top + r.mean_line,
            };
            self.base_line = GuideSegment {
                left: l.bounds.left,
                y_left: l.bounds.top + l.base_line,
                right: r.bounds.right,
                y_right: r.bounds.top + r.base_line,
            };
        } else {
            self.mean_line = GuideSegment::default();
            self.base_line = GuideSegment::default();
        }

        self.x_height = self.shapes.first().map_or(0, |&id| arena[id].x_height());
    }

    /// Meanline from the left-most to the right-most shape
    pub fn mean_line(&self) -> GuideSegment {
        self.mean_line
    }

    /// Baseline from the left-most to the right-most shape
    pub fn base_line(&self) -> GuideSegment {
        self.base_line
    }

    /// X-height of the first shape
    pub fn x_height(&self) -> i32 {
        self.x_height
    }

    /// Concatenated letters of the shapes
    pub fn word(&self, arena: &ShapeArena) -> String {
        self.shapes
            .iter()
            .map(|&id| arena[id].letter.as_str())
            .collect()
    }

    /// Mean confidence of the shapes, 0 for an empty group
    pub fn mean_confidence(&self, arena: &ShapeArena) -> f64 {
        if self.shapes.is_empty() {
            return 0.0;
        }
        let total: f64 = self.shapes.iter().map(|&id| arena[id].confidence).sum();
        total / self.shapes.len() as f64
    }

    /// True when the mean confidence is below `threshold`
    pub fn is_junk(&self, arena: &ShapeArena, threshold: f64) -> bool {
        self.mean_confidence(arena) < threshold
    }

    /// The white rectangle between this group and the preceding one
    pub fn preceding_space(&self, previous: &GroupOfShapes, direction: WritingDirection) -> Rect {
        let top = self.bounds.top.min(previous.bounds.top);
        let bottom = self.bounds.bottom.max(previous.bounds.bottom);
        if direction.is_left_to_right() {
            Rect::new_unchecked(previous.bounds.right + 1, top, self.bounds.left - 1, bottom)
        } else {
            Rect::new_unchecked(self.bounds.right + 1, top, previous.bounds.left - 1, bottom)
        }
    }
}

impl Bounded for GroupOfShapes {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn arena_with(rects: &[Rect]) -> (ShapeArena, Vec<ShapeId>) {
        let mut arena = ShapeArena::new();
        let ids = rects
            .iter()
            .map(|&r| {
                let mut s = Shape::new(r);
                s.mean_line = 2;
                s.base_line = r.height() - 1;
                arena.push(s)
            })
            .collect();
        (arena, ids)
    }

    #[test]
    fn test_guide_lines() {
        let (arena, ids) = arena_with(&[
            Rect::new_unchecked(10, 5, 15, 20),
            Rect::new_unchecked(18, 7, 22, 20),
        ]);
        let group = GroupOfShapes::new(ids, &arena);
        assert_eq!(group.bounds(), Rect::new_unchecked(10, 5, 22, 20));
        assert_eq!(
            group.mean_line(),
            GuideSegment {
                left: 10,
                y_left: 7,
                right: 22,
                y_right: 9
            }
        );
        assert_eq!(group.base_line().y_left, 20);
        assert_eq!(group.x_height(), 13);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let (arena, ids) = arena_with(&[Rect::new_unchecked(0, 0, 4, 9)]);
        let mut group = GroupOfShapes::new(ids, &arena);
        let before = group.clone();
        group.recalculate(&arena);
        assert_eq!(group, before);
    }

    #[test]
    fn test_word_and_junk() {
        let (mut arena, ids) = arena_with(&[
            Rect::new_unchecked(0, 0, 4, 9),
            Rect::new_unchecked(6, 0, 9, 9),
        ]);
        arena[ids[0]].letter = "o".to_string();
        arena[ids[0]].confidence = 0.9;
        arena[ids[1]].letter = "k".to_string();
        arena[ids[1]].confidence = 0.5;
        let group = GroupOfShapes::new(ids, &arena);
        assert_eq!(group.word(&arena), "ok");
        assert!(!group.is_junk(&arena, 0.7));
        assert!(group.is_junk(&arena, 0.75));
        assert!(GroupOfShapes::default().is_junk(&arena, 0.1));
    }

    #[test]
    fn test_preceding_space() {
        let (arena, ids) = arena_with(&[
            Rect::new_unchecked(0, 2, 9, 12),
            Rect::new_unchecked(20, 0, 29, 10),
        ]);
        let first = GroupOfShapes::new(vec![ids[0]], &arena);
        let second = GroupOfShapes::new(vec![ids[1]], &arena);
        assert_eq!(
            second.preceding_space(&first, WritingDirection::LeftToRight),
            Rect::new_unchecked(10, 0, 19, 12)
        );
    }
}
