//! Shape vectorization and stroke thickness
//!
//! A shape is approximated by its longest internal straight lines. Lines
//! are traced from sampled outline pixels along a fixed set of digital
//! directions until they leave the shape; the longest ones survive, and
//! lines lying mostly inside a longer line's neighbourhood are dropped.
//!
//! Stroke thickness is then measured by walking perpendicular to a line at
//! regular intervals.

use crate::shape::Shape;
use pageseg_core::{PixelSource, WritableMirror};
use std::collections::HashSet;

/// Direction definitions per 45-degree sector
pub const LINE_DEFS_PER_SECTOR: usize = 4;

/// Longest lines kept before combination
pub const DEFAULT_MAX_LINES: usize = 200;

/// Neighbourhood half width used when combining lines
pub const COMBINE_TOLERANCE: i32 = 3;

const DELTA_X: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
const DELTA_Y: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
const X_INCREMENT: [i32; 8] = [0, 1, 1, 0, 0, -1, -1, 0];
const Y_INCREMENT: [i32; 8] = [1, 0, 0, -1, -1, 0, 0, 1];

/// A digital straight line direction
///
/// The line advances one pixel along the sector's main direction per step
/// and shifts one pixel sideways each time a run from `steps` completes.
/// A single zero step never shifts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDefinition {
    sector: usize,
    index: usize,
    steps: Vec<i32>,
}

impl LineDefinition {
    /// Create a definition; `sector` is taken modulo 8
    pub fn new(sector: usize, index: usize, steps: Vec<i32>) -> Self {
        let steps = if steps.is_empty() { vec![0] } else { steps };
        Self {
            sector: sector % 8,
            index,
            steps,
        }
    }

    pub fn sector(&self) -> usize {
        self.sector
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn steps(&self) -> &[i32] {
        &self.steps
    }

    /// Positions visited after `origin`, turned by `rotation` sectors
    pub fn walk(&self, origin: (i32, i32), rotation: i32) -> LineWalk<'_> {
        let sector = (self.sector as i32 + rotation).rem_euclid(8) as usize;
        LineWalk {
            x: origin.0,
            y: origin.1,
            sector,
            steps: &self.steps,
            step_index: 0,
            position_on_step: 0,
        }
    }

    /// Follow the line from `origin` while pixels stay black
    ///
    /// # Returns
    ///
    /// The last black position and the number of moves made to reach it.
    pub fn follow_in_shape<S: PixelSource + ?Sized>(
        &self,
        view: &S,
        origin: (i32, i32),
        rotation: i32,
        threshold: u8,
    ) -> ((i32, i32), i32) {
        let mut last = origin;
        let mut moves = 0;
        for (x, y) in self.walk(origin, rotation) {
            if !view.is_black(x, y, threshold) {
                break;
            }
            last = (x, y);
            moves += 1;
        }
        (last, moves)
    }

    /// Mark `length + 1` positions starting at `origin`
    pub fn trace(&self, bits: &mut WritableMirror, origin: (i32, i32), length: i32) {
        bits.set(origin.0, origin.1, true);
        for (x, y) in self.walk(origin, 0).take(length.max(0) as usize) {
            bits.set(x, y, true);
        }
    }

    /// Stroke widths measured perpendicular to the line
    ///
    /// Walks at most `length` moves from `origin` inside the shape and, every
    /// `sample_step` moves, measures how far the stroke extends across the
    /// line.
    pub fn thickness<S: PixelSource + ?Sized>(
        &self,
        view: &S,
        origin: (i32, i32),
        length: i32,
        threshold: u8,
        sample_step: i32,
    ) -> Vec<i32> {
        let sample_step = sample_step.max(1) as usize;
        self.walk(origin, 0)
            .take(length.max(0) as usize)
            .take_while(|&(x, y)| view.is_black(x, y, threshold))
            .enumerate()
            .filter(|(i, _)| (i + 1) % sample_step == 0)
            .map(|(_, point)| {
                let (edge, _) = self.follow_in_shape(view, point, 2, threshold);
                let (_, across) = self.follow_in_shape(view, edge, -2, threshold);
                across
            })
            .collect()
    }
}

/// Iterator over the positions of a [`LineDefinition`]
#[derive(Debug, Clone)]
pub struct LineWalk<'a> {
    x: i32,
    y: i32,
    sector: usize,
    steps: &'a [i32],
    step_index: usize,
    position_on_step: i32,
}

impl Iterator for LineWalk<'_> {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.x += DELTA_X[self.sector];
        self.y += DELTA_Y[self.sector];
        self.position_on_step += 1;
        if self.position_on_step == self.steps[self.step_index] {
            self.x += X_INCREMENT[self.sector];
            self.y += Y_INCREMENT[self.sector];
            self.position_on_step = 0;
            self.step_index = (self.step_index + 1) % self.steps.len();
        }
        Some((self.x, self.y))
    }
}

/// Step runs for the directions of one sector, from flattest to steepest
fn sector_steps() -> Vec<Vec<i32>> {
    let spacing = 64 / LINE_DEFS_PER_SECTOR;
    (0..64)
        .step_by(spacing)
        .map(|i| {
            if i == 0 {
                return vec![0];
            }
            let slope = 64.0 / i as f64;
            let mut spot = slope;
            let mut count = 0;
            let mut steps = Vec::new();
            while spot <= 64.0 {
                let next = spot.floor() as i32;
                steps.push(next - count);
                count = next;
                spot += slope;
            }
            steps
        })
        .collect()
}

/// A straight run of black pixels inside a shape, in shape coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSegment {
    pub start: (i32, i32),
    pub end: (i32, i32),
    /// Number of moves from start to end
    pub length: i32,
    /// Index of the direction in [`Vectorizer::definitions`]
    pub definition: usize,
}

impl LineSegment {
    fn key(&self) -> (i32, i32, i32, i32, i32) {
        (-self.length, self.start.1, self.start.0, self.end.1, self.end.0)
    }

    fn identity(&self) -> (i32, (i32, i32), (i32, i32)) {
        let (a, b) = (self.start.min(self.end), self.start.max(self.end));
        (self.length, a, b)
    }

    fn bounds(&self, tolerance: i32) -> (i32, i32, i32, i32) {
        (
            self.start.0.min(self.end.0) - tolerance,
            self.start.1.min(self.end.1) - tolerance,
            self.start.0.max(self.end.0) + tolerance,
            self.start.1.max(self.end.1) + tolerance,
        )
    }

    /// Pixels within `half_width` of the line, across its main direction
    pub fn enclosing_rectangle(
        &self,
        definition: &LineDefinition,
        width: u32,
        height: u32,
        half_width: i32,
    ) -> WritableMirror {
        let mut bits = WritableMirror::new(width, height);
        definition.trace(&mut bits, self.start, self.length);
        let mostly_horizontal = matches!(definition.sector(), 0 | 3 | 4 | 7);
        for i in 1..=half_width {
            let (before, after) = if mostly_horizontal {
                ((self.start.0, self.start.1 - i), (self.start.0, self.start.1 + i))
            } else {
                ((self.start.0 - i, self.start.1), (self.start.0 + i, self.start.1))
            };
            definition.trace(&mut bits, before, self.length);
            definition.trace(&mut bits, after, self.length);
        }
        bits
    }
}

fn count_common(a: &WritableMirror, b: &WritableMirror) -> usize {
    let mut count = 0;
    for y in 0..a.height() as i32 {
        for x in 0..a.width() as i32 {
            if a.get(x, y) && b.get(x, y) {
                count += 1;
            }
        }
    }
    count
}

/// Finds a shape's longest straight lines
#[derive(Debug, Clone)]
pub struct Vectorizer {
    definitions: Vec<LineDefinition>,
    max_lines: usize,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Vectorizer {
    /// Create a vectorizer over four sectors of directions
    pub fn new() -> Self {
        let steps = sector_steps();
        let mut definitions = Vec::with_capacity(4 * steps.len());
        for sector in 0..4 {
            for s in &steps {
                definitions.push(LineDefinition::new(sector, definitions.len(), s.clone()));
            }
        }
        Self {
            definitions,
            max_lines: DEFAULT_MAX_LINES,
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn definitions(&self) -> &[LineDefinition] {
        &self.definitions
    }

    /// The shape's longest lines at `threshold`, longest first
    pub fn vectorize<S: PixelSource + ?Sized>(
        &self,
        shape: &Shape,
        source: &S,
        threshold: u8,
    ) -> Vec<LineSegment> {
        let lines = self.longest_lines(shape, source, threshold);
        let lines = self.combine(shape, lines);
        log::trace!("vectorized shape {:?} into {} lines", shape.bounds, lines.len());
        lines
    }

    fn longest_lines<S: PixelSource + ?Sized>(
        &self,
        shape: &Shape,
        source: &S,
        threshold: u8,
    ) -> Vec<LineSegment> {
        let view = shape.view(source);
        let outline = shape.outline(source, threshold);
        let interval = (outline.count_ones() / 100).max(1);

        let mut seen = HashSet::new();
        let mut lines = Vec::new();
        let mut sample_index = 0;
        for y in 0..outline.height() as i32 {
            for x in 0..outline.width() as i32 {
                if !outline.get(x, y) {
                    continue;
                }
                if sample_index == 0 {
                    for (d, definition) in self.definitions.iter().enumerate() {
                        let (end, length) = definition.follow_in_shape(&view, (x, y), 0, threshold);
                        if length == 0 {
                            continue;
                        }
                        let line = LineSegment {
                            start: (x, y),
                            end,
                            length,
                            definition: d,
                        };
                        if seen.insert(line.identity()) {
                            lines.push(line);
                        }
                    }
                }
                sample_index = (sample_index + 1) % interval;
            }
        }
        lines.sort_by_key(LineSegment::key);
        lines.truncate(self.max_lines);
        lines
    }

    /// Drop lines that lie mostly inside an earlier line's neighbourhood
    fn combine(&self, shape: &Shape, lines: Vec<LineSegment>) -> Vec<LineSegment> {
        let (width, height) = (shape.bounds.width() as u32, shape.bounds.height() as u32);
        let rectangles: Vec<WritableMirror> = lines
            .iter()
            .map(|l| {
                l.enclosing_rectangle(&self.definitions[l.definition], width, height, COMBINE_TOLERANCE)
            })
            .collect();

        let mut deleted = vec![false; lines.len()];
        for i in 0..lines.len() {
            let (l1, t1, r1, b1) = lines[i].bounds(COMBINE_TOLERANCE);
            for j in i + 1..lines.len() {
                let (l2, t2, r2, b2) = lines[j].bounds(COMBINE_TOLERANCE);
                if l1 <= r2 && r1 >= l2 && t1 <= b2 && b1 >= t2 {
                    let area = rectangles[j].count_ones();
                    if count_common(&rectangles[i], &rectangles[j]) * 2 > area {
                        deleted[j] = true;
                    }
                }
            }
        }
        lines
            .into_iter()
            .zip(deleted)
            .filter_map(|(line, d)| (!d).then_some(line))
            .collect()
    }

    /// Stroke widths sampled along `line` at `threshold`
    pub fn thickness<S: PixelSource + ?Sized>(
        &self,
        shape: &Shape,
        source: &S,
        line: &LineSegment,
        threshold: u8,
        sample_step: i32,
    ) -> Vec<i32> {
        self.definitions[line.definition].thickness(
            &shape.view(source),
            line.start,
            line.length,
            threshold,
            sample_step,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageseg_core::{RasterGrid, Rect};

    fn page_with(rect: Rect, width: u32, height: u32) -> RasterGrid {
        let mut data = vec![255u8; (width * height) as usize];
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                data[(y as u32 * width + x as u32) as usize] = 0;
            }
        }
        RasterGrid::bilevel(width, height, data).unwrap()
    }

    #[test]
    fn test_sector_steps() {
        let steps = sector_steps();
        assert_eq!(steps.len(), LINE_DEFS_PER_SECTOR);
        assert_eq!(steps[0], vec![0]);
        assert_eq!(steps[1], vec![4; 16]);
        assert_eq!(steps[2], vec![2; 32]);
        assert!(steps[3].iter().all(|&s| s == 1 || s == 2));
        assert!(steps[3].iter().sum::<i32>() <= 64);
        assert_eq!(Vectorizer::new().definitions().len(), 16);
    }

    #[test]
    fn test_straight_walk() {
        let def = LineDefinition::new(0, 0, vec![0]);
        let points: Vec<(i32, i32)> = def.walk((5, 5), 0).take(3).collect();
        assert_eq!(points, vec![(4, 5), (3, 5), (2, 5)]);
        let down: Vec<(i32, i32)> = def.walk((5, 5), 2).take(2).collect();
        assert_eq!(down, vec![(5, 6), (5, 7)]);
    }

    #[test]
    fn test_follow_in_shape() {
        let page = page_with(Rect::new_unchecked(2, 2, 11, 4), 20, 10);
        let shape = Shape::new(Rect::new_unchecked(2, 2, 11, 4));
        let def = LineDefinition::new(4, 0, vec![0]);
        let (end, length) = def.follow_in_shape(&shape.view(&page), (0, 1), 0, 128);
        assert_eq!(end, (9, 1));
        assert_eq!(length, 9);
    }

    #[test]
    fn test_vectorize_bar() {
        let bar = Rect::new_unchecked(1, 1, 30, 3);
        let page = page_with(bar, 40, 10);
        let shape = Shape::new(bar);
        let vectorizer = Vectorizer::new();
        let lines = vectorizer.vectorize(&shape, &page, 128);
        assert!(!lines.is_empty());
        assert_eq!(lines[0].length, 29);
        let thickness = vectorizer.thickness(&shape, &page, &lines[0], 128, 4);
        assert!(!thickness.is_empty());
        assert!(thickness.iter().all(|&t| t == 2));
    }
}
