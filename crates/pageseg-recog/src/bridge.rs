//! Bridge detection and shape splitting
//!
//! Two letters printed too close together often end up joined by a thin
//! stroke of ink and are extracted as one shape. This module finds such
//! bridges and cuts the shape in two.
//!
//! The shape is decomposed into maximal vertical runs of black pixels, one
//! or more per column, each linked to the runs it touches (diagonals
//! included) in the columns to its left and right. A run with exactly one
//! neighbour on each side that is no taller than the maximum bridge width
//! is a bridge candidate. Candidates are then pruned:
//!
//! - of two candidates side by side, only the thinner one is kept
//! - a candidate directly above or below an enclosed white hole is part of
//!   a letter's bowl rather than a bridge
//! - a candidate must open out on both sides, above and below its touch
//!   points, within a limited number of columns
//!
//! The remaining candidates cut the run graph into groups; each candidate
//! learns the pixel weight and horizontal extent of everything on either
//! side of it, which drives both the score and the final split.

use crate::shape::Shape;
use pageseg_core::{PixelSource, Rect, ShapeLocalView};
use std::collections::{HashMap, VecDeque};

/// A maximal run of black pixels in one column, relative to the shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerticalLineSegment {
    pub x: i32,
    pub y_top: i32,
    pub y_bottom: i32,
    /// Indices of touching runs in column `x - 1`
    pub left: Vec<usize>,
    /// Indices of touching runs in column `x + 1`
    pub right: Vec<usize>,
}

impl VerticalLineSegment {
    fn new(x: i32, y_top: i32, y_bottom: i32) -> Self {
        Self {
            x,
            y_top,
            y_bottom,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Number of pixels in the run
    pub fn length(&self) -> i32 {
        self.y_bottom - self.y_top + 1
    }
}

/// A connected part of the run graph lying between bridge candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerticalLineGroup {
    pub pixel_count: i32,
    pub left_boundary: i32,
    pub right_boundary: i32,
    pub top_boundary: i32,
    pub bottom_boundary: i32,
    /// Candidates on the group's left edge
    pub left_candidates: Vec<usize>,
    /// Candidates on the group's right edge
    pub right_candidates: Vec<usize>,
}

impl VerticalLineGroup {
    fn new(width: i32, height: i32) -> Self {
        Self {
            pixel_count: 0,
            left_boundary: width - 1,
            right_boundary: 0,
            top_boundary: height - 1,
            bottom_boundary: 0,
            left_candidates: Vec::new(),
            right_candidates: Vec::new(),
        }
    }

    fn include(&mut self, line: &VerticalLineSegment) {
        self.pixel_count += line.length();
        self.left_boundary = self.left_boundary.min(line.x);
        self.right_boundary = self.right_boundary.max(line.x);
        self.top_boundary = self.top_boundary.min(line.y_top);
        self.bottom_boundary = self.bottom_boundary.max(line.y_bottom);
    }
}

/// A vertical run that may be a bridge between two letters
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeCandidate {
    /// Index of the underlying run
    pub segment: usize,
    pub x: i32,
    pub y_top: i32,
    pub y_bottom: i32,
    /// Top of the narrowest contact with a neighbouring run
    pub top_touch: i32,
    /// Bottom of the narrowest contact with a neighbouring run
    pub bottom_touch: i32,
    pub left_pixels: i32,
    pub right_pixels: i32,
    pub left_shape_left: i32,
    pub left_shape_right: i32,
    pub right_shape_left: i32,
    pub right_shape_right: i32,
    pub left_group: Option<usize>,
    pub right_group: Option<usize>,
    shape_width: i32,
}

impl BridgeCandidate {
    fn new(segment: usize, line: &VerticalLineSegment, shape_width: i32) -> Self {
        Self {
            segment,
            x: line.x,
            y_top: line.y_top,
            y_bottom: line.y_bottom,
            top_touch: line.y_top,
            bottom_touch: line.y_bottom,
            left_pixels: 0,
            right_pixels: 0,
            left_shape_left: shape_width - 1,
            left_shape_right: 0,
            right_shape_left: shape_width - 1,
            right_shape_right: 0,
            left_group: None,
            right_group: None,
            shape_width,
        }
    }

    /// Length of the run
    pub fn length(&self) -> i32 {
        self.y_bottom - self.y_top + 1
    }

    /// Height of the narrowest contact
    pub fn bridge_width(&self) -> i32 {
        self.bottom_touch - self.top_touch + 1
    }

    /// How far the left part reaches past the start of the right part
    pub fn overlap(&self) -> i32 {
        self.left_shape_right - self.right_shape_left
    }

    /// Balance of the two sides divided by the bridge width, reduced by overlap
    ///
    /// Higher is a more convincing bridge.
    pub fn score(&self) -> f64 {
        let (left, right) = (self.left_pixels as f64, self.right_pixels as f64);
        let ratio = if left <= 0.0 || right <= 0.0 {
            0.0
        } else if left > right {
            right / left
        } else {
            left / right
        };
        let overlap = (self.overlap() + 2) as f64 / self.shape_width as f64;
        ratio / self.bridge_width() as f64 * (1.0 - overlap)
    }
}

/// Parameters of a shape split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitParams {
    /// Maximum run length for a bridge candidate
    pub max_bridge_width: i32,
    /// Minimum pixel weight on each side of a bridge
    pub min_letter_weight: i32,
    /// Maximum overlap between the two sides of a bridge
    pub max_overlap: i32,
    /// Shape width divisor giving the expansion limit
    pub expansion_divisor: f64,
}

/// The run graph of a shape with its surviving bridge candidates
#[derive(Debug, Clone, Default)]
pub struct BridgeAnalysis {
    /// Runs ordered by column, then top
    pub segments: Vec<VerticalLineSegment>,
    /// Runs of white pixels bounded by black runs or the shape's edges
    pub inverse_segments: Vec<VerticalLineSegment>,
    /// Which inverse runs cannot reach the shape's edge
    pub enclosed: Vec<bool>,
    /// Groups between candidates, empty if there are no candidates
    pub groups: Vec<VerticalLineGroup>,
    /// Candidates that survived pruning
    pub candidates: Vec<BridgeCandidate>,
}

impl BridgeAnalysis {
    /// Analyse a shape's black pixels at `threshold`
    pub fn new<S: PixelSource + ?Sized>(
        shape: &Shape,
        source: &S,
        threshold: u8,
        max_bridge_width: i32,
        expansion_divisor: f64,
    ) -> Self {
        let view = shape.view(source);
        let Some(start) = shape.starting_point(source, threshold) else {
            return Self::default();
        };
        let (width, height) = (shape.bounds.width(), shape.bounds.height());
        let segments = vertical_line_segments(&view, threshold, start);
        let inverse_segments = inverse_line_segments(&segments, height);
        let enclosed = enclosed_inverse_lines(&inverse_segments, width, height);

        let mut analysis = Self {
            segments,
            inverse_segments,
            enclosed,
            groups: Vec::new(),
            candidates: Vec::new(),
        };
        analysis.find_candidates(max_bridge_width, width);
        analysis.prune_adjacent();
        analysis.prune_holes();
        analysis.prune_unexpanded((width as f64 / expansion_divisor).ceil() as i32);
        if !analysis.candidates.is_empty() {
            analysis.build_groups(width, height);
            analysis.total_pixels(width);
        }
        analysis
    }

    fn find_candidates(&mut self, max_bridge_width: i32, shape_width: i32) {
        for (index, line) in self.segments.iter().enumerate() {
            if line.left.len() != 1 || line.right.len() != 1 || line.length() > max_bridge_width {
                continue;
            }
            let left = &self.segments[line.left[0]];
            let right = &self.segments[line.right[0]];
            let (left_top, left_bottom) = (left.y_top.max(line.y_top), left.y_bottom.min(line.y_bottom));
            let (right_top, right_bottom) =
                (right.y_top.max(line.y_top), right.y_bottom.min(line.y_bottom));
            let left_length = left_top - left_bottom;
            let right_length = right_top - right_bottom;

            let mut candidate = BridgeCandidate::new(index, line, shape_width);
            if right_length < left_length && right_length < line.length() {
                candidate.top_touch = right_top;
                candidate.bottom_touch = right_bottom;
            } else if left_length < line.length() {
                candidate.top_touch = left_top;
                candidate.bottom_touch = left_bottom;
            }
            self.candidates.push(candidate);
        }
    }

    /// Of two neighbouring candidates keep the one with the thinner contact
    fn prune_adjacent(&mut self) {
        let mut eliminated = vec![false; self.candidates.len()];
        for i in 0..self.candidates.len() {
            for j in i + 1..self.candidates.len() {
                let (a, b) = (&self.candidates[i], &self.candidates[j]);
                if b.x == a.x + 1 && self.segments[a.segment].right.contains(&b.segment) {
                    if a.bridge_width() <= b.bridge_width() {
                        eliminated[j] = true;
                    } else {
                        eliminated[i] = true;
                    }
                }
            }
        }
        retain_by_flags(&mut self.candidates, &eliminated);
    }

    /// Drop candidates directly above or below an enclosed white run
    fn prune_holes(&mut self) {
        let inverse = &self.inverse_segments;
        let enclosed = &self.enclosed;
        self.candidates.retain(|c| {
            !inverse.iter().zip(enclosed).any(|(hole, &is_enclosed)| {
                is_enclosed
                    && hole.x == c.x
                    && (hole.y_bottom == c.y_top - 1 || hole.y_top == c.y_bottom + 1)
            })
        });
    }

    /// Drop candidates whose sides do not grow past the touch points
    fn prune_unexpanded(&mut self, limit: i32) {
        let segments = &self.segments;
        self.candidates.retain(|c| {
            let expands = |toward_left: bool| {
                let (top, bottom) = expansion(segments, c.segment, toward_left, limit);
                top.min(c.top_touch) != c.top_touch && bottom.max(c.bottom_touch) != c.bottom_touch
            };
            expands(true) && expands(false)
        });
    }

    /// Walk the run graph into groups separated by candidates
    fn build_groups(&mut self, width: i32, height: i32) {
        let mut candidate_at: HashMap<usize, usize> = HashMap::new();
        for (i, c) in self.candidates.iter().enumerate() {
            candidate_at.insert(c.segment, i);
        }

        let mut touched = vec![false; self.segments.len()];
        let mut candidate_touched = vec![false; self.candidates.len()];
        let mut line_stack: Vec<(usize, bool)> = vec![(0, true)];
        let mut candidate_stack: Vec<(usize, bool)> = Vec::new();
        let mut groups: Vec<VerticalLineGroup> = Vec::new();
        let mut group = VerticalLineGroup::new(width, height);

        loop {
            let group_index = groups.len();
            while let Some((line_index, from_left)) = line_stack.pop() {
                if touched[line_index] {
                    continue;
                }
                touched[line_index] = true;
                let line = &self.segments[line_index];
                if let Some(&c) = candidate_at.get(&line_index) {
                    if !candidate_touched[c] {
                        candidate_touched[c] = true;
                        candidate_stack.push((c, from_left));
                        if from_left {
                            group.right_candidates.push(c);
                            self.candidates[c].left_group = Some(group_index);
                        } else {
                            group.left_candidates.push(c);
                            self.candidates[c].right_group = Some(group_index);
                        }
                    }
                } else {
                    group.include(line);
                    line_stack.extend(line.left.iter().map(|&l| (l, false)));
                    line_stack.extend(line.right.iter().map(|&r| (r, true)));
                }
            }
            groups.push(group);

            let Some((c, from_left)) = candidate_stack.pop() else {
                break;
            };
            let new_index = groups.len();
            group = VerticalLineGroup::new(width, height);
            if from_left {
                group.left_candidates.push(c);
                self.candidates[c].right_group = Some(new_index);
            } else {
                group.right_candidates.push(c);
                self.candidates[c].left_group = Some(new_index);
            }
            let segment = &self.segments[self.candidates[c].segment];
            line_stack.extend(segment.left.iter().map(|&l| (l, false)));
            line_stack.extend(segment.right.iter().map(|&r| (r, true)));
        }
        self.groups = groups;
    }

    /// Accumulate each candidate's pixel weight and extent on both sides
    fn total_pixels(&mut self, _width: i32) {
        for c in 0..self.candidates.len() {
            let mut touched = vec![false; self.groups.len()];
            let (left_group, right_group) = (self.candidates[c].left_group, self.candidates[c].right_group);
            let left = self.walk_side(c, left_group, &mut touched, &[]);
            let right = self.walk_side(c, right_group, &mut touched, &[]);
            let candidate = &mut self.candidates[c];
            candidate.left_pixels = left.pixels;
            candidate.left_shape_left = candidate.left_shape_left.min(left.left);
            candidate.left_shape_right = candidate.left_shape_right.max(left.right);
            candidate.right_pixels = right.pixels;
            candidate.right_shape_left = candidate.right_shape_left.min(right.left);
            candidate.right_shape_right = candidate.right_shape_right.max(right.right);
        }
    }

    /// Everything reachable from `start` without crossing `through` or any of `barriers`
    fn walk_side(
        &self,
        through: usize,
        start: Option<usize>,
        touched: &mut [bool],
        barriers: &[usize],
    ) -> SideTotals {
        let mut totals = SideTotals::default();
        let mut stack: Vec<usize> = start.into_iter().collect();
        while let Some(g) = stack.pop() {
            if touched[g] {
                continue;
            }
            touched[g] = true;
            let group = &self.groups[g];
            totals.add_group(group);
            for &c in &group.left_candidates {
                if c != through && !barriers.contains(&c) {
                    totals.pixels += self.candidates[c].length();
                    stack.extend(self.candidates[c].left_group);
                }
            }
            for &c in &group.right_candidates {
                if c != through && !barriers.contains(&c) {
                    totals.pixels += self.candidates[c].length();
                    stack.extend(self.candidates[c].right_group);
                }
            }
        }
        totals
    }

    /// Shrink a part's edge facing the bridge past columns that only hold
    /// the bridge's own thin runs
    fn trim_stubs(&self, totals: &mut SideTotals, candidate: &BridgeCandidate, max_width: i32) {
        let (top, bottom) = (totals.top, totals.bottom);
        let (stub_top, stub_bottom) = (candidate.y_top - max_width, candidate.y_bottom + max_width);
        let stub_column = |x: i32| {
            let mut runs = self
                .segments
                .iter()
                .filter(|s| s.x == x && s.y_bottom >= top && s.y_top <= bottom)
                .peekable();
            runs.peek().is_some()
                && runs.all(|s| {
                    s.length() <= max_width && s.y_top >= stub_top && s.y_bottom <= stub_bottom
                })
        };
        if totals.left > candidate.x {
            while totals.left < totals.right && stub_column(totals.left) {
                totals.left += 1;
            }
        } else if totals.right < candidate.x {
            while totals.right > totals.left && stub_column(totals.right) {
                totals.right -= 1;
            }
        }
    }

    /// The candidate with the highest score
    pub fn best_candidate(&self) -> Option<&BridgeCandidate> {
        if self.candidates.len() == 1 {
            return self.candidates.first();
        }
        let mut best: Option<&BridgeCandidate> = None;
        let mut best_score = 0.0;
        for candidate in &self.candidates {
            let score = candidate.score();
            if score > best_score {
                best = Some(candidate);
                best_score = score;
            }
        }
        best
    }
}

/// Pixel weight and extent collected on one side of a bridge
#[derive(Debug, Clone, Copy)]
struct SideTotals {
    pixels: i32,
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
    visited: bool,
}

impl Default for SideTotals {
    fn default() -> Self {
        Self {
            pixels: 0,
            left: i32::MAX,
            right: i32::MIN,
            top: i32::MAX,
            bottom: i32::MIN,
            visited: false,
        }
    }
}

impl SideTotals {
    fn add_group(&mut self, group: &VerticalLineGroup) {
        self.pixels += group.pixel_count;
        self.left = self.left.min(group.left_boundary);
        self.right = self.right.max(group.right_boundary);
        self.top = self.top.min(group.top_boundary);
        self.bottom = self.bottom.max(group.bottom_boundary);
        self.visited = true;
    }

    fn to_rect(self, origin: Rect) -> Option<Rect> {
        if !self.visited || self.right < self.left || self.bottom < self.top {
            return None;
        }
        Some(Rect::new_unchecked(
            origin.left + self.left,
            origin.top + self.top,
            origin.left + self.right,
            origin.top + self.bottom,
        ))
    }
}

fn retain_by_flags<T>(items: &mut Vec<T>, eliminated: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !eliminated[index];
        index += 1;
        keep
    });
}

/// Top-most and bottom-most rows reachable within `limit` columns of a candidate
fn expansion(
    segments: &[VerticalLineSegment],
    from: usize,
    toward_left: bool,
    limit: i32,
) -> (i32, i32) {
    let mut depth = vec![i32::MAX; segments.len()];
    let mut queue = VecDeque::from([from]);
    depth[from] = 0;
    let (mut top, mut bottom) = (segments[from].y_top, segments[from].y_bottom);
    while let Some(index) = queue.pop_front() {
        let line = &segments[index];
        top = top.min(line.y_top);
        bottom = bottom.max(line.y_bottom);
        if depth[index] > limit {
            continue;
        }
        let next = if toward_left { &line.left } else { &line.right };
        for &n in next {
            if depth[n] == i32::MAX {
                depth[n] = depth[index] + 1;
                queue.push_back(n);
            }
        }
    }
    (top, bottom)
}

/// Maximal black run through `(x, y)` at `threshold`
fn maximal_run<S: PixelSource + ?Sized>(
    view: &ShapeLocalView<'_, S>,
    threshold: u8,
    x: i32,
    y_top: i32,
    y_bottom: i32,
) -> (i32, i32) {
    let mut top = y_top;
    while view.is_black(x, top - 1, threshold) {
        top -= 1;
    }
    let mut bottom = y_bottom;
    while view.is_black(x, bottom + 1, threshold) {
        bottom += 1;
    }
    (top, bottom)
}

/// Decompose the component through `start` into linked vertical runs
///
/// Runs are returned ordered by column, then by top row, with neighbour
/// indices into the returned list.
pub fn vertical_line_segments<S: PixelSource + ?Sized>(
    view: &ShapeLocalView<'_, S>,
    threshold: u8,
    start: (i32, i32),
) -> Vec<VerticalLineSegment> {
    let mut segments: Vec<VerticalLineSegment> = Vec::new();
    let mut known: HashMap<(i32, i32), usize> = HashMap::new();
    let mut stack: Vec<usize> = Vec::new();

    let (top, bottom) = maximal_run(view, threshold, start.0, start.1, start.1);
    segments.push(VerticalLineSegment::new(start.0, top, bottom));
    known.insert((start.0, top), 0);
    stack.push(0);

    while let Some(index) = stack.pop() {
        let (x, y_top, y_bottom) = {
            let line = &segments[index];
            (line.x, line.y_top, line.y_bottom)
        };
        for neighbour_x in [x - 1, x + 1] {
            let mut runs: Vec<(i32, i32)> = Vec::new();
            let mut open: Option<i32> = None;
            for y in y_top - 1..=y_bottom + 1 {
                let black = view.is_black(neighbour_x, y, threshold);
                match (black, open) {
                    (true, None) => open = Some(y),
                    (false, Some(from)) => {
                        runs.push((from, y - 1));
                        open = None;
                    }
                    _ => {}
                }
            }
            if let Some(from) = open {
                runs.push((from, y_bottom + 1));
            }

            for (from, to) in runs {
                let (top, bottom) = maximal_run(view, threshold, neighbour_x, from, to);
                let neighbour = match known.get(&(neighbour_x, top)) {
                    Some(&n) => n,
                    None => {
                        let n = segments.len();
                        segments.push(VerticalLineSegment::new(neighbour_x, top, bottom));
                        known.insert((neighbour_x, top), n);
                        stack.push(n);
                        n
                    }
                };
                let links = if neighbour_x < x {
                    &mut segments[index].left
                } else {
                    &mut segments[index].right
                };
                if !links.contains(&neighbour) {
                    links.push(neighbour);
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by_key(|&i| (segments[i].x, segments[i].y_top));
    let mut new_index = vec![0; segments.len()];
    for (position, &old) in order.iter().enumerate() {
        new_index[old] = position;
    }
    order
        .iter()
        .map(|&old| {
            let line = &segments[old];
            VerticalLineSegment {
                x: line.x,
                y_top: line.y_top,
                y_bottom: line.y_bottom,
                left: line.left.iter().map(|&i| new_index[i]).collect(),
                right: line.right.iter().map(|&i| new_index[i]).collect(),
            }
        })
        .collect()
}

/// White runs above, between and below the black runs of each column
fn inverse_line_segments(segments: &[VerticalLineSegment], height: i32) -> Vec<VerticalLineSegment> {
    let mut inverse = Vec::new();
    let mut previous: Option<&VerticalLineSegment> = None;
    for line in segments {
        match previous {
            Some(prev) if prev.x == line.x => {
                inverse.push(VerticalLineSegment::new(line.x, prev.y_bottom + 1, line.y_top - 1));
            }
            _ => {
                if let Some(prev) = previous {
                    if prev.y_bottom < height - 1 {
                        inverse.push(VerticalLineSegment::new(prev.x, prev.y_bottom + 1, height - 1));
                    }
                }
                if line.y_top > 0 {
                    inverse.push(VerticalLineSegment::new(line.x, 0, line.y_top - 1));
                }
            }
        }
        previous = Some(line);
    }
    if let Some(prev) = previous {
        if prev.y_bottom < height - 1 {
            inverse.push(VerticalLineSegment::new(prev.x, prev.y_bottom + 1, height - 1));
        }
    }

    for i in 0..inverse.len() {
        for j in 0..inverse.len() {
            let (a, b) = (&inverse[i], &inverse[j]);
            if b.x == a.x + 1 && a.y_top - 1 <= b.y_bottom && b.y_top <= a.y_bottom + 1 {
                inverse[i].right.push(j);
                inverse[j].left.push(i);
            }
        }
    }
    inverse
}

/// Flags the white runs that cannot reach the shape's edge
fn enclosed_inverse_lines(inverse: &[VerticalLineSegment], width: i32, height: i32) -> Vec<bool> {
    let mut outer = vec![false; inverse.len()];
    let mut stack: Vec<usize> = inverse
        .iter()
        .enumerate()
        .filter(|(_, l)| l.y_top == 0 || l.x == 0 || l.y_bottom == height - 1 || l.x == width - 1)
        .map(|(i, _)| i)
        .collect();
    while let Some(i) = stack.pop() {
        if outer[i] {
            continue;
        }
        outer[i] = true;
        stack.extend(inverse[i].left.iter().copied());
        stack.extend(inverse[i].right.iter().copied());
    }
    outer.into_iter().map(|o| !o).collect()
}

/// Split a shape at its confirmed bridges
///
/// A candidate is confirmed when both sides weigh at least
/// `min_letter_weight` pixels and overlap by no more than `max_overlap`
/// columns. Each confirmed bridge yields the boxes of the parts on its
/// left and right, each the union of the groups reachable without
/// crossing a confirmed bridge.
///
/// # Returns
///
/// The boxes of the parts in page coordinates, empty when nothing was
/// split. Identical parts produced by neighbouring bridges appear once.
pub fn split_shape<S: PixelSource + ?Sized>(
    shape: &Shape,
    source: &S,
    threshold: u8,
    params: &SplitParams,
) -> Vec<Rect> {
    let analysis = BridgeAnalysis::new(
        shape,
        source,
        threshold,
        params.max_bridge_width,
        params.expansion_divisor,
    );
    let bridges: Vec<usize> = analysis
        .candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.left_pixels >= params.min_letter_weight
                && c.right_pixels >= params.min_letter_weight
                && c.overlap() <= params.max_overlap
        })
        .map(|(i, _)| i)
        .collect();

    let mut parts: Vec<Rect> = Vec::new();
    for &bridge in &bridges {
        let candidate = &analysis.candidates[bridge];
        let mut touched = vec![false; analysis.groups.len()];
        let mut left = analysis.walk_side(bridge, candidate.left_group, &mut touched, &bridges);
        let mut right = analysis.walk_side(bridge, candidate.right_group, &mut touched, &bridges);
        analysis.trim_stubs(&mut left, candidate, params.max_bridge_width);
        analysis.trim_stubs(&mut right, candidate, params.max_bridge_width);
        for part in [left.to_rect(shape.bounds), right.to_rect(shape.bounds)]
            .into_iter()
            .flatten()
        {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }
    }
    if !parts.is_empty() {
        log::trace!(
            "split shape {:?} at {} bridges into {} parts",
            shape.bounds,
            bridges.len(),
            parts.len()
        );
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageseg_core::RasterGrid;

    fn page_from(rows: &[&str]) -> RasterGrid {
        let width = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == 'x' { 0u8 } else { 255u8 }))
            .collect();
        RasterGrid::bilevel(width, rows.len() as u32, data).unwrap()
    }

    fn whole(page: &RasterGrid) -> Shape {
        Shape::new(Rect::new_unchecked(0, 0, page.width() as i32 - 1, page.height() as i32 - 1))
    }

    #[test]
    fn test_segments_are_linked_and_ordered() {
        let page = page_from(&["x.x", "xxx", "x.x"]);
        let shape = whole(&page);
        let segments = vertical_line_segments(&shape.view(&page), 254, (0, 0));
        assert_eq!(segments.len(), 3);
        assert_eq!((segments[1].x, segments[1].y_top, segments[1].y_bottom), (1, 1, 1));
        assert_eq!(segments[1].left, vec![0]);
        assert_eq!(segments[1].right, vec![2]);
        assert_eq!(segments[0].right, vec![1]);
    }

    #[test]
    fn test_enclosed_hole() {
        let page = page_from(&["xxx", "x.x", "xxx"]);
        let shape = whole(&page);
        let segments = vertical_line_segments(&shape.view(&page), 254, (0, 0));
        let inverse = inverse_line_segments(&segments, 3);
        let enclosed = enclosed_inverse_lines(&inverse, 3, 3);
        assert_eq!(inverse.len(), 1);
        assert_eq!(enclosed, vec![true]);
    }

    fn two_blocks() -> RasterGrid {
        let mut rows: Vec<String> = Vec::new();
        for y in 0..20 {
            let bridge = if y == 9 || y == 10 { "xxx" } else { "..." };
            rows.push(format!("{}{}{}", "x".repeat(10), bridge, "x".repeat(10)));
        }
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        page_from(&refs)
    }

    #[test]
    fn test_single_bridge_candidate() {
        let page = two_blocks();
        let shape = whole(&page);
        let analysis = BridgeAnalysis::new(&shape, &page, 254, 3, 6.0);
        assert_eq!(analysis.candidates.len(), 1);
        let candidate = &analysis.candidates[0];
        assert_eq!(candidate.x, 10);
        assert_eq!(candidate.bridge_width(), 2);
        assert_eq!(candidate.left_pixels, 200);
        assert_eq!(candidate.right_pixels, 204);
        assert_eq!(candidate.overlap(), -2);
        assert!(candidate.score() > 0.0);
        assert_eq!(analysis.best_candidate(), Some(candidate));
    }

    #[test]
    fn test_split_two_blocks() {
        let page = two_blocks();
        let shape = whole(&page);
        let params = SplitParams {
            max_bridge_width: 3,
            min_letter_weight: 50,
            max_overlap: 2,
            expansion_divisor: 6.0,
        };
        let parts = split_shape(&shape, &page, 254, &params);
        assert_eq!(
            parts,
            vec![Rect::new_unchecked(0, 0, 9, 19), Rect::new_unchecked(13, 0, 22, 19)]
        );
    }

    #[test]
    fn test_split_parts_leave_out_long_bridge() {
        let mut rows: Vec<String> = Vec::new();
        for y in 0..20 {
            let bridge = if y == 9 || y == 10 { "xxxxx" } else { "....." };
            rows.push(format!("{}{}{}", "x".repeat(10), bridge, "x".repeat(10)));
        }
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let page = page_from(&refs);
        let shape = whole(&page);
        let params = SplitParams {
            max_bridge_width: 3,
            min_letter_weight: 50,
            max_overlap: 2,
            expansion_divisor: 6.0,
        };
        let parts = split_shape(&shape, &page, 254, &params);
        assert_eq!(
            parts,
            vec![Rect::new_unchecked(0, 0, 9, 19), Rect::new_unchecked(15, 0, 24, 19)]
        );
    }

    #[test]
    fn test_thick_join_is_not_split() {
        let page = two_blocks();
        let shape = whole(&page);
        let params = SplitParams {
            max_bridge_width: 1,
            min_letter_weight: 50,
            max_overlap: 2,
            expansion_divisor: 6.0,
        };
        assert!(split_shape(&shape, &page, 254, &params).is_empty());
    }

    #[test]
    fn test_light_side_is_not_split() {
        let page = two_blocks();
        let shape = whole(&page);
        let params = SplitParams {
            max_bridge_width: 3,
            min_letter_weight: 250,
            max_overlap: 2,
            expansion_divisor: 6.0,
        };
        assert!(split_shape(&shape, &page, 254, &params).is_empty());
    }
}
