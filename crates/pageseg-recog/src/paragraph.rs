//! Paragraphs

use crate::row::RowOfShapes;
use crate::shape::ShapeArena;
use pageseg_core::stats::mean;
use pageseg_core::{Bounded, Rect};

/// An ordered sequence of rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Rows in reading order
    pub rows: Vec<RowOfShapes>,
    /// Position on the page
    pub index: usize,
    bounds: Rect,
}

impl Paragraph {
    /// Create a paragraph owning `rows`
    pub fn new(rows: Vec<RowOfShapes>) -> Self {
        let mut paragraph = Self {
            rows,
            ..Self::default()
        };
        paragraph.recalculate();
        paragraph
    }

    /// Recompute the bounds from the rows
    pub fn recalculate(&mut self) {
        self.bounds = self
            .rows
            .iter()
            .map(|r| r.bounds())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
    }

    /// True when there are no rows or the mean shape confidence is below `threshold`
    pub fn is_junk(&self, arena: &ShapeArena, threshold: f64) -> bool {
        let confidences: Vec<f64> = self
            .rows
            .iter()
            .flat_map(|r| r.groups.iter())
            .flat_map(|g| g.shapes.iter())
            .map(|&id| arena[id].confidence)
            .collect();
        confidences.is_empty() || mean(&confidences) < threshold
    }
}

impl Bounded for Paragraph {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use pageseg_core::WritingDirection;

    fn paragraph(confidence: f64) -> (ShapeArena, Paragraph) {
        let mut arena = ShapeArena::new();
        let mut rows = Vec::new();
        for top in [0, 30] {
            let ids = (0..3)
                .map(|i| {
                    let mut s = Shape::new(Rect::new_unchecked(i * 12, top, i * 12 + 9, top + 19));
                    s.confidence = confidence;
                    arena.push(s)
                })
                .collect();
            let mut row = RowOfShapes::new(ids, &arena, 100);
            row.organise_shapes_in_groups(&arena, 5.0, WritingDirection::LeftToRight);
            rows.push(row);
        }
        (arena, Paragraph::new(rows))
    }

    #[test]
    fn test_bounds_and_idempotence() {
        let (_, mut p) = paragraph(1.0);
        assert_eq!(p.bounds(), Rect::new_unchecked(0, 0, 33, 49));
        let before = p.clone();
        p.recalculate();
        assert_eq!(p, before);
    }

    #[test]
    fn test_junk() {
        let (arena, p) = paragraph(0.9);
        assert!(!p.is_junk(&arena, 0.75));
        let (arena, p) = paragraph(0.2);
        assert!(p.is_junk(&arena, 0.75));
        assert!(Paragraph::default().is_junk(&arena, 0.0));
    }
}
