//! Oversized shape removal
//!
//! Shapes far larger than the average letter are frames, table grids,
//! illustrations or horizontal rules. All are removed; illustrations also
//! take the shapes they enclose with them and are remembered on the page
//! so later stages can keep text away from them.

use crate::error::SegmentResult;
use crate::page::SegmentedPage;
use crate::shape::ShapeId;
use pageseg_core::stats::mean;
use pageseg_core::{Bounded, PixelSource, Rect, WritableMirror};
use pageseg_region::{ExtractOptions, fill_region, find_white_areas_in};
use std::collections::HashSet;

/// Tolerance around an illustration for enclosed shapes
const ILLUSTRATION_MARGIN: i32 = 5;
/// Tolerance around a horizontal rule for shapes sitting on it
const RULE_MARGIN: i32 = 3;
/// Shapes touching a rule are followed this many times
const RULE_PASSES: usize = 3;
/// A frame has at most this share of its pixels inside its inner box
const MAX_FRAME_INNER_RATIO: f64 = 0.5;
/// A grid's white cells cover at least this share of it
const MIN_GRID_WHITE_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LargeShapeKind {
    Frame,
    Grid,
    Illustration,
}

/// Mean width and height of a set of shapes
fn mean_size<'a>(sizes: impl Iterator<Item = &'a Rect>) -> (f64, f64) {
    let (widths, heights): (Vec<f64>, Vec<f64>) =
        sizes.map(|b| (b.width() as f64, b.height() as f64)).unzip();
    (mean(&widths), mean(&heights))
}

/// Classify a large shape from the pixels connected to its starting point
fn classify<S: PixelSource + ?Sized>(
    page: &SegmentedPage,
    source: &S,
    id: ShapeId,
    mean_size: (f64, f64),
    max_stack_size: usize,
) -> SegmentResult<LargeShapeKind> {
    let shape = &page.arena[id];
    let threshold = page.separation_threshold();
    let view = shape.view(source);
    let Some((x, y)) = shape.starting_point(source, threshold) else {
        return Ok(LargeShapeKind::Illustration);
    };
    let mut mirror = WritableMirror::like(&view);
    let options = ExtractOptions::new(threshold).with_max_stack_size(max_stack_size);
    fill_region(&view, &mut mirror, x, y, &options)?;

    let (w, h) = (shape.width(), shape.height());
    let total = mirror.count_ones();
    let inner = Rect::new_unchecked(
        (0.05 * w as f64).round() as i32,
        (0.05 * h as f64).round() as i32,
        (0.95 * w as f64).round() as i32,
        (0.95 * h as f64).round() as i32,
    );
    let inner_count = mirror.count_ones_in(&inner);
    let inner_ratio = if total == 0 { 0.0 } else { inner_count as f64 / total as f64 };
    if inner_ratio <= MAX_FRAME_INNER_RATIO {
        return Ok(LargeShapeKind::Frame);
    }

    let (mean_width, mean_height) = mean_size;
    let local = Rect::new_unchecked(0, 0, w - 1, h - 1);
    let white: i64 = find_white_areas_in(&mirror, 0, local, 10.0 * mean_width, 4.0 * mean_height)
        .iter()
        .map(|r| r.area())
        .sum();
    if white as f64 / (w as f64 * h as f64) >= MIN_GRID_WHITE_RATIO {
        Ok(LargeShapeKind::Grid)
    } else {
        Ok(LargeShapeKind::Illustration)
    }
}

/// Remove frames, grids, illustrations and horizontal rules
///
/// Illustrations are added to [`SegmentedPage::large_shapes`].
///
/// # Errors
///
/// Returns [`crate::SegmentError::Region`] if a flood fill exceeds
/// `max_stack_size`.
pub fn remove_oversized_shapes<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    shapes: &mut Vec<ShapeId>,
    max_stack_size: usize,
) -> SegmentResult<()> {
    if shapes.is_empty() {
        return Ok(());
    }
    let (first_width, first_height) = mean_size(shapes.iter().map(|&id| &page.arena[id].bounds));
    let typical: Vec<&Rect> = shapes
        .iter()
        .map(|&id| &page.arena[id].bounds)
        .filter(|b| {
            let (w, h) = (b.width() as f64, b.height() as f64);
            first_height < h && h < 2.0 * first_height && first_width < w && w < 2.0 * first_width
        })
        .collect();
    if typical.is_empty() {
        log::debug!("no typical shapes, keeping every shape");
        return Ok(());
    }
    let (mean_width, mean_height) = mean_size(typical.into_iter());

    let mut large: Vec<ShapeId> = Vec::new();
    let mut rules: Vec<ShapeId> = Vec::new();
    for &id in shapes.iter() {
        let b = page.arena[id].bounds;
        let (w, h) = (b.width() as f64, b.height() as f64);
        if h > 6.0 * mean_height || (w > 6.0 * mean_width && h > 1.5 * mean_height) {
            large.push(id);
        } else if w > 6.0 * mean_width {
            large.push(id);
            rules.push(id);
        } else if w <= mean_width / 2.0 && h > 2.5 * mean_height {
            large.push(id);
        }
    }

    let mut to_remove: HashSet<ShapeId> = large.iter().copied().collect();
    for &id in &large {
        if rules.contains(&id) {
            continue;
        }
        let kind = classify(page, source, id, (mean_width, mean_height), max_stack_size)?;
        log::debug!("large shape {:?}: {:?}", page.arena[id].bounds, kind);
        if kind != LargeShapeKind::Illustration {
            continue;
        }
        let outer = page.arena[id].bounds.expand(ILLUSTRATION_MARGIN);
        page.large_shapes.push(page.arena[id].bounds);
        for &other in shapes.iter() {
            if other != id && outer.contains(&page.arena[other].bounds) {
                to_remove.insert(other);
            }
        }
    }

    for _ in 0..RULE_PASSES {
        if rules.is_empty() {
            break;
        }
        let mut touching = Vec::new();
        for &rule in &rules {
            let r = page.arena[rule].bounds;
            for &other in shapes.iter() {
                if to_remove.contains(&other) {
                    continue;
                }
                let b = page.arena[other].bounds;
                if b.top >= r.top - RULE_MARGIN
                    && b.bottom <= r.bottom + RULE_MARGIN
                    && b.right >= r.left - RULE_MARGIN
                    && b.left <= r.right + RULE_MARGIN
                {
                    to_remove.insert(other);
                    touching.push(other);
                }
            }
        }
        rules = touching;
    }

    let before = shapes.len();
    shapes.retain(|id| !to_remove.contains(id));
    log::debug!(
        "removed {} oversized shapes and their contents, {} illustrations",
        before - shapes.len(),
        page.large_shapes.len()
    );
    Ok(())
}
