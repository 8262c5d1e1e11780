//! Splitting shapes made of several touching letters

use crate::bridge::{SplitParams, split_shape};
use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use crate::shape::{Shape, ShapeId};
use crate::vectorizer::Vectorizer;
use pageseg_core::stats::{mean, round_half_up};
use pageseg_core::{Bounded, PixelSource, Rect};
use pageseg_region::{MAX_FILL_PASSES, fill_factor};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Rejections in a row before any shape size is accepted
const MAX_REJECTIONS: usize = 10;
/// Big shapes are smaller than this many mean sizes
const BIG_SHAPE_FACTOR: f64 = 2.5;

/// Random shapes from a set of rows, with replacement
///
/// `rows` are indices into [`SegmentedPage::rows`]. With `big_only`, a
/// shape must be larger than the mean shape and smaller than two and a
/// half times it; after ten rejections in a row any shape is accepted.
pub fn sample_shapes(
    page: &SegmentedPage,
    rows: &[usize],
    size: usize,
    big_only: bool,
    rng: &mut StdRng,
) -> Vec<ShapeId> {
    let rows: Vec<&[ShapeId]> = rows
        .iter()
        .filter_map(|&r| page.rows.get(r))
        .map(|r| r.shapes.as_slice())
        .filter(|shapes| !shapes.is_empty())
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let (mut min_width, mut min_height) = (0.0, 0.0);
    let (mut max_width, mut max_height) = (f64::MAX, f64::MAX);
    if big_only {
        let (widths, heights): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .flat_map(|shapes| shapes.iter())
            .map(|&id| (page.arena[id].width() as f64, page.arena[id].height() as f64))
            .unzip();
        min_width = mean(&widths);
        min_height = mean(&heights);
        max_width = min_width * BIG_SHAPE_FACTOR;
        max_height = min_height * BIG_SHAPE_FACTOR;
    }

    let mut sample = Vec::with_capacity(size);
    let mut rejections = 0;
    while sample.len() < size {
        if rejections >= MAX_REJECTIONS {
            (min_width, min_height) = (0.0, 0.0);
            (max_width, max_height) = (f64::MAX, f64::MAX);
        }
        let shapes = rows[rng.random_range(0..rows.len())];
        let id = shapes[rng.random_range(0..shapes.len())];
        let (w, h) = (page.arena[id].width() as f64, page.arena[id].height() as f64);
        if w > min_width && h > min_height && w < max_width && h < max_height {
            sample.push(id);
            rejections = 0;
        } else {
            rejections += 1;
        }
    }
    sample
}

/// Typical number of fill passes needed to close a letter's holes
///
/// Bold or blotchy print needs more passes; the value is the rounded mean
/// over a sample of big shapes at the black threshold.
pub fn page_fill_factor<S: PixelSource + ?Sized>(
    page: &SegmentedPage,
    source: &S,
    rng: &mut StdRng,
    tuning: &SegmenterTuning,
) -> u32 {
    let rows: Vec<usize> = (0..page.rows.len()).collect();
    let sample = sample_shapes(page, &rows, tuning.fill_factor_sample_size, true, rng);
    let factors: Vec<f64> = sample
        .iter()
        .map(|&id| {
            let view = page.arena[id].view(source);
            fill_factor(&view, page.black_threshold(), MAX_FILL_PASSES) as f64
        })
        .collect();
    round_half_up(mean(&factors)).max(0) as u32
}

/// Bridge parameters derived from a sample of a row cluster's shapes
#[derive(Debug, Clone, Copy)]
struct ClusterProfile {
    /// Mean pixel count of a sampled shape
    pixel_count: f64,
    /// Mean of the stroke thicknesses below the overall mean
    thickness: f64,
}

fn cluster_profile<S: PixelSource + ?Sized>(
    page: &SegmentedPage,
    source: &S,
    sample: &[ShapeId],
    vectorizer: &Vectorizer,
) -> ClusterProfile {
    let separation = page.separation_threshold();
    let mut pixel_counts = Vec::with_capacity(sample.len());
    let mut thicknesses: Vec<f64> = Vec::new();
    for &id in sample {
        let shape = &page.arena[id];
        pixel_counts.push(shape.bits(source, separation).count_ones() as f64);
        let sample_step = (shape.height() / 8).max(1);
        for line in vectorizer.vectorize(shape, source, page.black_threshold()) {
            thicknesses.extend(
                vectorizer
                    .thickness(shape, source, &line, separation, sample_step)
                    .into_iter()
                    .map(f64::from),
            );
        }
    }
    let overall = mean(&thicknesses);
    let thin: Vec<f64> = thicknesses.into_iter().filter(|&t| t < overall).collect();
    ClusterProfile {
        pixel_count: mean(&pixel_counts),
        thickness: mean(&thin),
    }
}

/// Split wide shapes at thin bridges, row cluster by row cluster
///
/// Shapes are candidates when they are wider than the cluster's mean width
/// by a factor that grows with `fill_factor`, but narrower than six
/// average shapes. Bridge width, letter weight and overlap limits come
/// from a random sample of the cluster's shapes.
pub fn split_shapes<S: PixelSource + ?Sized>(
    page: &mut SegmentedPage,
    source: &S,
    fill_factor: u32,
    rng: &mut StdRng,
    tuning: &SegmenterTuning,
) {
    let max_width = page.statistics().width * 6.0;
    let vectorizer = Vectorizer::new();
    let mut replacements: Vec<(usize, ShapeId, Vec<Rect>)> = Vec::new();

    for cluster in page.row_clusters() {
        let widths: Vec<f64> = cluster
            .iter()
            .flat_map(|&r| page.rows[r].shapes.iter())
            .map(|&id| page.arena[id].width() as f64)
            .collect();
        let mean_width = mean(&widths);
        let fill_scale = 0.15 * fill_factor as f64;
        let lower = mean_width * (1.6 + fill_scale);
        let upper = mean_width * (2.2 + fill_scale);

        let candidates: Vec<(usize, ShapeId)> = cluster
            .iter()
            .flat_map(|&r| page.rows[r].shapes.iter().map(move |&id| (r, id)))
            .filter(|&(_, id)| {
                let w = page.arena[id].width() as f64;
                w > lower && w < max_width
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let sample = sample_shapes(page, &cluster, tuning.split_sample_size, true, rng);
        let profile = cluster_profile(page, source, &sample, &vectorizer);
        let bridge_lower = profile.thickness * 0.5;
        let bridge_upper = profile.thickness * 0.8;
        let min_letter_weight = (profile.pixel_count / 4.0).floor() as i32;
        let max_overlap = (mean_width / 8.0).ceil() as i32;
        log::debug!(
            "cluster of {} rows: split widths {:.1}..{:.1}, bridges {:.1}..{:.1}, letter weight {}",
            cluster.len(),
            lower,
            upper,
            bridge_lower,
            bridge_upper,
            min_letter_weight
        );

        for (row, id) in candidates {
            let shape = &page.arena[id];
            let (w, h) = (shape.width() as f64, shape.height() as f64);
            if h < 3.0 * bridge_upper {
                continue;
            }
            let max_bridge_width = if w > upper {
                bridge_upper.ceil() as i32
            } else {
                (bridge_lower + (w - lower) / (upper - lower) * (bridge_upper - bridge_lower)).ceil() as i32
            };
            let params = SplitParams {
                max_bridge_width,
                min_letter_weight,
                max_overlap,
                expansion_divisor: tuning.bridge_expansion_divisor,
            };
            let parts = split_shape(shape, source, page.separation_threshold(), &params);
            if parts.len() > 1 {
                log::debug!("splitting {:?} into {} parts", shape.bounds, parts.len());
                replacements.push((row, id, parts));
            }
        }
    }

    if replacements.is_empty() {
        return;
    }
    let (width, direction) = (page.width(), page.direction);
    let mut touched: Vec<usize> = Vec::new();
    for (row, id, parts) in replacements {
        let new_ids: Vec<ShapeId> = parts
            .into_iter()
            .map(|r| page.arena.push(Shape::new(r)))
            .collect();
        let shapes = &mut page.rows[row].shapes;
        shapes.retain(|&s| s != id);
        shapes.extend(new_ids);
        touched.push(row);
    }
    touched.sort_unstable();
    touched.dedup();
    for row in touched {
        page.rows[row].reorder_shapes(&page.arena, direction);
        page.rows[row].recalculate(&page.arena, width);
    }
    page.reindex();
    page.recalculate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::add_rows;
    use pageseg_core::{RasterGrid, WritingDirection};
    use pageseg_test::PageBuilder;

    fn page_of(builder: &PageBuilder) -> (RasterGrid, SegmentedPage) {
        let source = builder.build().unwrap();
        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let shapes: Vec<ShapeId> = builder
            .glyphs()
            .iter()
            .map(|&r| page.arena.push(Shape::new(r)))
            .collect();
        add_rows(&mut page, vec![shapes]);
        (source, page)
    }

    #[test]
    fn test_sample_big_shapes() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 5, 4, 4, &[3]);
        builder.text_line(30, 5, 12, 14, &[3, 3, 3, 3, 3]);
        let (_, page) = page_of(&builder);
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sample_shapes(&page, &[0], 20, true, &mut rng);
        assert_eq!(sample.len(), 20);
        assert!(sample.iter().all(|&id| page.arena[id].width() == 12));
    }

    #[test]
    fn test_sample_without_shapes_is_empty() {
        let source = PageBuilder::new(10, 10).build().unwrap();
        let page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sample_shapes(&page, &[0, 1], 5, true, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_is_reproducible() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 5, 8, 12, &[3, 4, 5, 6, 7, 8]);
        let (_, page) = page_of(&builder);
        let first = sample_shapes(&page, &[0], 10, false, &mut StdRng::seed_from_u64(3));
        let second = sample_shapes(&page, &[0], 10, false, &mut StdRng::seed_from_u64(3));
        assert_eq!(first, second);
    }

    #[test]
    fn test_solid_shapes_fill_factor_zero() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 5, 8, 12, &[3, 3, 3, 3]);
        let (source, page) = page_of(&builder);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(page_fill_factor(&page, &source, &mut rng, &SegmenterTuning::default()), 0);
    }

    #[test]
    fn test_fused_pair_is_split() {
        let mut builder = PageBuilder::new(300, 30);
        for i in 0..18 {
            builder.hollow(5 + i * 14, 8, 10, 14, 3);
        }
        // two more letters joined by a one pixel stroke
        builder.hollow(257, 8, 10, 14, 3);
        builder.hollow(269, 8, 10, 14, 3);
        builder.fill(Rect::new_unchecked(267, 15, 268, 15), 0);
        let source = builder.build().unwrap();

        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let mut shapes: Vec<ShapeId> = builder.glyphs()[..18]
            .iter()
            .map(|&r| page.arena.push(Shape::new(r)))
            .collect();
        shapes.push(page.arena.push(Shape::new(Rect::new_unchecked(257, 8, 278, 21))));
        add_rows(&mut page, vec![shapes]);
        assert_eq!(page.rows[0].shapes.len(), 19);

        let mut rng = StdRng::seed_from_u64(5);
        split_shapes(&mut page, &source, 0, &mut rng, &SegmenterTuning::default());
        let bounds: Vec<Rect> = page.rows[0].shapes.iter().map(|&id| page.arena[id].bounds).collect();
        assert_eq!(bounds.len(), 20);
        assert_eq!(bounds[18], Rect::new_unchecked(257, 8, 266, 21));
        assert_eq!(bounds[19], Rect::new_unchecked(269, 8, 278, 21));
    }

    #[test]
    fn test_narrow_shapes_untouched() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 5, 8, 12, &[3, 3, 3, 3, 3]);
        let (source, mut page) = page_of(&builder);
        let before = page.rows[0].shapes.clone();
        let mut rng = StdRng::seed_from_u64(1);
        split_shapes(&mut page, &source, 0, &mut rng, &SegmenterTuning::default());
        assert_eq!(page.rows[0].shapes, before);
    }
}
