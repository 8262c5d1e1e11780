//! Speck removal
//!
//! A speck is a small shape far from any letter. Shapes below the speck
//! floor are always dropped; shapes between floor and ceiling are
//! clustered, and a cluster survives only when a real shape sits close
//! enough to it.

use crate::config::SegmenterTuning;
use crate::shape::{Shape, ShapeArena, ShapeId};
use pageseg_core::cluster::dbscan;
use pageseg_core::{Bounded, Percentiles, Rect};
use std::collections::HashSet;

/// Size and distance limits derived from the page's shape sizes
#[derive(Debug, Clone, Copy)]
struct SpeckLimits {
    height_floor: i32,
    width_floor: i32,
    height_ceiling: i32,
    width_ceiling: i32,
    x_distance_floor: i32,
    y_distance_floor: i32,
}

impl SpeckLimits {
    fn new(shape_width: f64, shape_height: f64, tuning: &SegmenterTuning) -> Self {
        let floor = |size: f64| {
            ((size / tuning.speck_floor_divisor).ceil() as i32).max(tuning.min_speck_floor)
        };
        let height_floor = floor(shape_height);
        let width_floor = floor(shape_width);
        Self {
            height_floor,
            width_floor,
            height_ceiling: height_floor * 2,
            width_ceiling: width_floor * 2,
            x_distance_floor: shape_width.floor() as i32,
            y_distance_floor: (shape_height / 4.0).floor() as i32,
        }
    }

    /// Distance thresholds for a cluster whose largest speck is `width` x `height`
    fn distance_thresholds(&self, width: i32, height: i32) -> (i32, i32) {
        let scale = |size: i32, floor: i32, ceiling: i32| {
            if size < floor {
                0.0
            } else if size > ceiling {
                1.0
            } else {
                f64::from(size - floor) / f64::from(ceiling - floor)
            }
        };
        let scale = if width > height {
            scale(width, self.width_floor, self.width_ceiling)
        } else {
            scale(height, self.height_floor, self.height_ceiling)
        };
        let x_floor = f64::from(self.x_distance_floor);
        let y_floor = f64::from(self.y_distance_floor);
        (
            (x_floor + scale * x_floor).ceil() as i32,
            (y_floor + scale * y_floor).ceil() as i32,
        )
    }
}

/// Horizontal and vertical gaps between a neighbour and a target box
///
/// The neighbour's vertical extent is stretched to its guide lines, so an
/// accent above a short letter measures from the letter's meanline.
fn axis_gaps(neighbour: &Shape, target: &Rect) -> (i32, i32) {
    let b = neighbour.bounds;
    let x_gap = if b.left <= target.right && b.right >= target.left {
        0
    } else {
        (target.left - b.right).abs().min((target.right - b.left).abs())
    };
    let y_gap = if b.top <= target.bottom && b.bottom >= target.top {
        0
    } else {
        let nearest_top = b.top.min(b.top + neighbour.mean_line);
        let nearest_bottom = b.bottom.max(b.top + neighbour.base_line);
        (target.top - nearest_bottom)
            .abs()
            .min((target.bottom - nearest_top).abs())
    };
    (x_gap, y_gap)
}

fn distance((x, y): (i32, i32)) -> f64 {
    f64::from(x).hypot(f64::from(y))
}

/// Remove specks from a list of shapes ordered top to bottom
///
/// # Returns
///
/// The number of shapes removed.
pub fn remove_specks(arena: &ShapeArena, shapes: &mut Vec<ShapeId>, tuning: &SegmenterTuning) -> usize {
    if shapes.is_empty() {
        return 0;
    }
    let widths = Percentiles::new(shapes.iter().map(|&id| arena[id].width() as f64));
    let heights = Percentiles::new(shapes.iter().map(|&id| arena[id].height() as f64));
    let limits = SpeckLimits::new(widths.get(65.0), heights.get(65.0), tuning);
    log::trace!("speck limits {:?}", limits);

    let mut to_remove: HashSet<ShapeId> = HashSet::new();
    let mut specks: Vec<ShapeId> = Vec::new();
    for &id in shapes.iter() {
        let shape = &arena[id];
        let (w, h) = (shape.width(), shape.height());
        if h < limits.height_floor && w < limits.width_floor {
            to_remove.insert(id);
        } else if h < limits.height_ceiling && w < limits.width_ceiling {
            specks.push(id);
        }
    }
    let speck_set: HashSet<ShapeId> = specks.iter().copied().collect();
    let centres: Vec<[f64; 2]> = specks
        .iter()
        .map(|&id| {
            let (x, y) = arena[id].centre();
            [x, y]
        })
        .collect();

    for cluster in dbscan(&centres, f64::from(limits.x_distance_floor), 2, true) {
        let members: Vec<ShapeId> = cluster.iter().map(|&i| specks[i]).collect();
        if members.len() > tuning.max_speck_cluster {
            to_remove.extend(members);
            continue;
        }
        let Some(cluster_box) = arena.bounds_of(&members) else {
            continue;
        };
        let speck_width = members.iter().map(|&id| arena[id].width()).max().unwrap_or(0);
        let speck_height = members.iter().map(|&id| arena[id].height()).max().unwrap_or(0);
        let (x_threshold, y_threshold) = limits.distance_thresholds(speck_width, speck_height);

        let mut nearest: Option<(ShapeId, f64, (i32, i32))> = None;
        for &other in shapes.iter() {
            let b = arena[other].bounds;
            if b.top > cluster_box.bottom + y_threshold + 1 {
                break;
            }
            if b.bottom < cluster_box.top - y_threshold - 1
                || b.right < cluster_box.left - x_threshold - 1
                || b.left > cluster_box.right + x_threshold + 1
                || speck_set.contains(&other)
                || to_remove.contains(&other)
            {
                continue;
            }
            let gaps = axis_gaps(&arena[other], &cluster_box);
            let d = distance(gaps);
            if nearest.is_none_or(|(_, best, _)| d < best) {
                nearest = Some((other, d, gaps));
            }
        }

        let remove = match nearest {
            None => true,
            Some((neighbour, mut best, mut gaps)) => {
                for &speck in &members {
                    let speck_gaps = axis_gaps(&arena[neighbour], &arena[speck].bounds);
                    let d = distance(speck_gaps);
                    if d < best {
                        best = d;
                        gaps = speck_gaps;
                    }
                }
                gaps.0 > x_threshold || gaps.1 > y_threshold
            }
        };
        log::trace!(
            "speck cluster {:?} of {}: thresholds ({}, {}), remove {}",
            cluster_box,
            members.len(),
            x_threshold,
            y_threshold,
            remove
        );
        if remove {
            to_remove.extend(members);
        }
    }

    let before = shapes.len();
    shapes.retain(|id| !to_remove.contains(id));
    let removed = before - shapes.len();
    log::debug!("removed {} specks", removed);
    removed
}
