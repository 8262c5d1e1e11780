//! Segmentation stage regression test
//!
//! Runs the early stages one at a time: shape extraction, speck removal,
//! row grouping and word grouping.
//!
//! Run with:
//! ```
//! cargo test -p pageseg-recog --test stages_reg
//! ```

use pageseg_core::{Bounded, WritingDirection};
use pageseg_recog::SegmentedPage;
use pageseg_recog::segmenter::{
    SegmenterTuning, add_rows, find_guide_lines, find_shapes, group_shapes_into_rows,
    group_shapes_into_words, remove_specks,
};
use pageseg_test::{PageBuilder, RegParams};

/// Three rows of three words each
fn three_rows() -> PageBuilder {
    let mut builder = PageBuilder::new(240, 120);
    for (row, top) in [10, 34, 58].into_iter().enumerate() {
        let mut gaps = vec![3; 11];
        gaps[3 + row] = 18;
        gaps[8] = 18;
        builder.text_line(10, top, 8, 12, &gaps);
    }
    builder
}

#[test]
fn stages_specks_reg() {
    let mut rp = RegParams::new("stages_specks");
    let mut builder = three_rows();
    builder.block(200, 100, 2, 2);
    builder.block(120, 90, 3, 3);
    builder.block(225, 100, 5, 5);
    let source = builder.build().unwrap();
    let tuning = SegmenterTuning::default();

    let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
    let mut shapes = find_shapes(&mut page, &source, 10_000).unwrap();
    rp.compare_values(39.0, shapes.len() as f64, 0.0);

    let removed = remove_specks(&page.arena, &mut shapes, &tuning);
    rp.compare_values(3.0, removed as f64, 0.0);
    rp.compare_values(36.0, shapes.len() as f64, 0.0);
    let all_glyphs = shapes
        .iter()
        .all(|&id| page.arena[id].width() == 8 && page.arena[id].height() == 12);
    rp.compare_values(1.0, if all_glyphs { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "speck stage regression test failed");
}

#[test]
fn stages_rows_and_words_reg() {
    let mut rp = RegParams::new("stages_rows_and_words");
    let source = three_rows().build().unwrap();
    let tuning = SegmenterTuning::default();

    let mut page = SegmentedPage::new(&source, WritingDirection::LeftToRight);
    let mut shapes = find_shapes(&mut page, &source, 10_000).unwrap();
    let white_areas = page.white_areas(&shapes);
    let rows = group_shapes_into_rows(&page, &mut shapes, &white_areas, false, &tuning);
    rp.compare_values(3.0, rows.iter().filter(|r| !r.is_empty()).count() as f64, 0.0);
    add_rows(&mut page, rows);
    find_guide_lines(&mut page, &source, &tuning);

    rp.compare_values(3.0, page.rows.len() as f64, 0.0);
    for (row, top) in page.rows.iter().zip([10, 34, 58]) {
        rp.compare_values(12.0, row.shapes.len() as f64, 0.0);
        rp.compare_values(top as f64, row.top() as f64, 0.0);
    }

    group_shapes_into_words(&mut page, &tuning);
    for (i, row) in page.rows.iter().enumerate() {
        rp.compare_values(3.0, row.groups.len() as f64, 0.0);
        // the first word ends at the row's first wide gap
        rp.compare_values((4 + i) as f64, row.groups[0].shapes.len() as f64, 0.0);
        rp.compare_values(12.0, row.shapes.len() as f64, 0.0);
    }

    assert!(rp.cleanup(), "row and word stage regression test failed");
}
