//! Grouping shapes into words

use crate::config::SegmenterTuning;
use crate::page::SegmentedPage;
use pageseg_core::stats::{mean, std_dev};

/// Gap above which two shapes of a row cluster belong to different words
///
/// Gaps are measured in the writing direction; overlapping shapes are
/// ignored. When the gaps barely vary, each row is taken as a single word.
/// Otherwise the threshold sits `std_devs` standard deviations above the
/// mean of the gaps smaller than the overall mean, which are the gaps
/// between letters.
fn letter_space_threshold(gaps: &[f64], std_devs: f64) -> f64 {
    let overall_mean = mean(gaps);
    if gaps.is_empty() || std_dev(gaps) * 2.0 < overall_mean {
        return f64::MAX;
    }
    let letter_gaps: Vec<f64> = gaps.iter().copied().filter(|&g| g < overall_mean).collect();
    (mean(&letter_gaps) + std_devs * std_dev(&letter_gaps)).round()
}

/// Split every row into words, one row cluster at a time
///
/// Rows of similar x-height share their gap statistics, so a short row
/// in a long paragraph is split with the paragraph's letter spacing.
pub fn group_shapes_into_words(page: &mut SegmentedPage, tuning: &SegmenterTuning) {
    let direction = page.direction;
    for cluster in page.row_clusters() {
        let mut gaps: Vec<f64> = Vec::new();
        for &r in &cluster {
            for pair in page.rows[r].shapes.windows(2) {
                let gap = direction.gap(&page.arena[pair[0]].bounds, &page.arena[pair[1]].bounds);
                if gap >= 0 {
                    gaps.push(f64::from(gap));
                }
            }
        }
        let threshold = letter_space_threshold(&gaps, tuning.word_space_std_devs);
        log::debug!(
            "row cluster of {}: {} gaps, mean {:.2}, word threshold {}",
            cluster.len(),
            gaps.len(),
            mean(&gaps),
            threshold
        );

        let SegmentedPage { rows, arena, .. } = &mut *page;
        for &r in &cluster {
            let row = &mut rows[r];
            row.organise_shapes_in_groups(arena, threshold, direction);
            row.sync_shapes_with_groups();
        }
    }
    page.reindex();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::add_rows;
    use crate::shape::{Shape, ShapeId};
    use pageseg_core::WritingDirection;
    use pageseg_test::PageBuilder;

    #[test]
    fn test_threshold_from_letter_gaps() {
        let gaps = [3.0, 3.0, 3.0, 20.0, 3.0, 3.0];
        // letter gaps are all 3, so the threshold is 3
        assert_eq!(letter_space_threshold(&gaps, 4.0), 3.0);
    }

    #[test]
    fn test_uniform_gaps_single_word() {
        assert_eq!(letter_space_threshold(&[4.0, 5.0, 4.0, 5.0], 4.0), f64::MAX);
        assert_eq!(letter_space_threshold(&[], 4.0), f64::MAX);
    }

    #[test]
    fn test_row_split_into_words() {
        let mut builder = PageBuilder::new(200, 40);
        builder.text_line(5, 10, 8, 12, &[3, 3, 3, 20, 3, 3]);
        let source = builder.build().unwrap();
        let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
        let shapes: Vec<ShapeId> = builder
            .glyphs()
            .iter()
            .map(|&r| page.arena.push(Shape::new(r)))
            .collect();
        add_rows(&mut page, vec![shapes]);
        group_shapes_into_words(&mut page, &SegmenterTuning::default());

        let groups = &page.rows[0].groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].shapes.len(), 4);
        assert_eq!(groups[1].shapes.len(), 3);
        assert_eq!(page.rows[0].shapes.len(), 7);
    }
}
