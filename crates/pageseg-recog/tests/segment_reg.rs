//! Page segmentation regression test
//!
//! Segments a synthetic page of two paragraphs, each ending with a short
//! row, and checks the resulting hierarchy of paragraphs, rows, words and
//! shapes.
//!
//! Run with:
//! ```
//! cargo test -p pageseg-recog --test segment_reg
//! ```

use image::DynamicImage;
use pageseg_core::{Bounded, RasterGrid, WritingDirection};
use pageseg_recog::{ProgressFn, SegmentError, Segmenter, SegmenterOptions, segment_image, segment_page};
use pageseg_test::{PageBuilder, RegParams};

const GLYPH_WIDTH: i32 = 8;
const GLYPH_HEIGHT: i32 = 12;
const ROW_PITCH: i32 = 22;
const LEFT: i32 = 10;
const LETTER_GAP: i32 = 4;
const WORD_GAP: i32 = 20;

/// Gaps of a full row of four words
///
/// Word breaks move from row to row so that no white channel runs down
/// the page between words.
fn full_row_gaps(row: i32) -> Vec<i32> {
    let mut gaps = vec![LETTER_GAP; 15];
    gaps[(3 + row % 3) as usize] = WORD_GAP;
    gaps[(8 + row % 2) as usize] = WORD_GAP;
    gaps[(12 - row % 3) as usize] = WORD_GAP;
    gaps
}

/// Twelve rows; rows 5 and 11 are short and close a paragraph
fn two_paragraph_page() -> PageBuilder {
    let mut builder = PageBuilder::new(280, 290);
    for row in 0..12 {
        let top = LEFT + row * ROW_PITCH;
        let gaps = if row % 6 == 5 {
            vec![LETTER_GAP, LETTER_GAP, WORD_GAP, LETTER_GAP, LETTER_GAP]
        } else {
            full_row_gaps(row)
        };
        builder.text_line(LEFT, top, GLYPH_WIDTH, GLYPH_HEIGHT, &gaps);
    }
    builder
}

#[test]
fn segment_reg() {
    let mut rp = RegParams::new("segment");
    let builder = two_paragraph_page();
    let source = builder.build().unwrap();
    let options = SegmenterOptions::default().with_clean_segment(true);
    let page = segment_page(&source, options).unwrap();

    // 10 rows of 16 glyphs and 2 of 6
    rp.compare_values(172.0, builder.glyphs().len() as f64, 0.0);
    rp.compare_values(172.0, page.shape_count() as f64, 0.0);
    rp.compare_values(2.0, page.paragraphs.len() as f64, 0.0);
    for paragraph in &page.paragraphs {
        rp.compare_values(6.0, paragraph.rows.len() as f64, 0.0);
    }

    let rows: Vec<_> = page.all_rows().collect();
    rp.compare_values(12.0, rows.len() as f64, 0.0);
    for (i, row) in rows.iter().enumerate() {
        let short = i % 6 == 5;
        let (shapes, words) = if short { (6.0, 2.0) } else { (16.0, 4.0) };
        rp.compare_values(shapes, row.shapes.len() as f64, 0.0);
        rp.compare_values(words, row.groups.len() as f64, 0.0);
        rp.compare_values((LEFT + i as i32 * ROW_PITCH) as f64, row.top() as f64, 0.0);
        rp.compare_values(LEFT as f64, row.left() as f64, 0.0);
        // solid glyphs still give the row a typical letter height
        rp.compare_values(1.0, if row.x_height > 0 { 1.0 } else { 0.0 }, 0.0);
    }

    // reading order inside a row
    for row in &rows {
        let lefts: Vec<i32> = row.shapes.iter().map(|&id| page.arena[id].left()).collect();
        let sorted = lefts.windows(2).all(|w| w[0] < w[1]);
        rp.compare_values(1.0, if sorted { 1.0 } else { 0.0 }, 0.0);
    }

    assert!(rp.cleanup(), "segment regression test failed");
}

#[test]
fn segment_right_to_left_reg() {
    let mut rp = RegParams::new("segment_rtl");
    let original = two_paragraph_page();
    let mut builder = PageBuilder::new(280, 290);
    for glyph in original.glyphs() {
        builder.block(280 - glyph.right - 1, glyph.top, glyph.width(), glyph.height());
    }
    let source = builder.build().unwrap();
    let options = SegmenterOptions::default()
        .with_clean_segment(true)
        .with_writing_direction(WritingDirection::RightToLeft);
    let page = segment_page(&source, options).unwrap();

    rp.compare_values(172.0, page.shape_count() as f64, 0.0);
    rp.compare_values(2.0, page.paragraphs.len() as f64, 0.0);
    for paragraph in &page.paragraphs {
        rp.compare_values(6.0, paragraph.rows.len() as f64, 0.0);
    }

    // rows top to bottom, each flush with the right margin
    let rows: Vec<_> = page.all_rows().collect();
    rp.compare_values(12.0, rows.len() as f64, 0.0);
    for (i, row) in rows.iter().enumerate() {
        let (shapes, words) = if i % 6 == 5 { (6.0, 2.0) } else { (16.0, 4.0) };
        rp.compare_values(shapes, row.shapes.len() as f64, 0.0);
        rp.compare_values(words, row.groups.len() as f64, 0.0);
        rp.compare_values((LEFT + i as i32 * ROW_PITCH) as f64, row.top() as f64, 0.0);
        rp.compare_values((280 - LEFT - 1) as f64, row.right() as f64, 0.0);
    }

    // shapes are read from right to left
    for row in &rows {
        let lefts: Vec<i32> = row.shapes.iter().map(|&id| page.arena[id].left()).collect();
        let sorted = lefts.windows(2).all(|w| w[0] > w[1]);
        rp.compare_values(1.0, if sorted { 1.0 } else { 0.0 }, 0.0);
    }

    assert!(rp.cleanup(), "right to left regression test failed");
}

#[test]
fn segment_default_options_reg() {
    let mut rp = RegParams::new("segment_default");
    let builder = two_paragraph_page();
    let source = builder.build().unwrap();
    let page = segment_page(&source, SegmenterOptions::default()).unwrap();

    let count = page.shape_count();
    rp.compare_values(1.0, if count > 0 && count <= 172 { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(1.0, if page.paragraphs.is_empty() { 0.0 } else { 1.0 }, 0.0);
    let inside = page
        .all_rows()
        .flat_map(|row| row.shapes.iter())
        .all(|&id| page.page_rect().contains(&page.arena[id].bounds()));
    rp.compare_values(1.0, if inside { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "segment default options regression test failed");
}

#[test]
fn segment_blank_page_reg() {
    let mut rp = RegParams::new("segment_blank");
    let source = RasterGrid::bilevel(120, 80, vec![255u8; 120 * 80]).unwrap();
    let page = segment_page(&source, SegmenterOptions::default()).unwrap();
    rp.compare_values(0.0, page.paragraphs.len() as f64, 0.0);
    rp.compare_values(0.0, page.shape_count() as f64, 0.0);

    let image = PageBuilder::new(120, 80).to_image();
    let page = segment_image(&image, SegmenterOptions::default()).unwrap();
    rp.compare_values(0.0, page.shape_count() as f64, 0.0);

    assert!(rp.cleanup(), "blank page regression test failed");
}

#[test]
fn segment_overlay_reg() {
    let mut rp = RegParams::new("segment_overlay");
    let source = two_paragraph_page().build().unwrap();
    let options = SegmenterOptions::default()
        .with_clean_segment(true)
        .with_draw_segmented_image(true);
    let page = segment_page(&source, options).unwrap();
    let overlay = page.overlay.as_ref().unwrap();
    rp.compare_values(280.0, overlay.width() as f64, 0.0);
    rp.compare_values(290.0, overlay.height() as f64, 0.0);
    if rp.display() {
        rp.write_image_and_check(&DynamicImage::ImageRgb8(overlay.clone()))
            .unwrap();
    }

    let plain = segment_page(&source, SegmenterOptions::default().with_clean_segment(true)).unwrap();
    rp.compare_values(1.0, if plain.overlay.is_none() { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "overlay regression test failed");
}

#[test]
fn segment_progress_reg() {
    let mut rp = RegParams::new("segment_progress");
    let source = two_paragraph_page().build().unwrap();
    let mut reports: Vec<(String, f64)> = Vec::new();
    {
        let mut monitor = ProgressFn::new(|action: &str, percent: f64| {
            reports.push((action.to_string(), percent));
        });
        let mut segmenter = Segmenter::new(&source, SegmenterOptions::default()).unwrap();
        segmenter.segment_with_progress(&mut monitor).unwrap();
    }

    let actions: Vec<&str> = reports.iter().map(|(a, _)| a.as_str()).collect();
    for expected in [
        "findingShapes",
        "groupingShapesIntoRows",
        "groupingShapesIntoWords",
        "analysingFontSize",
        "groupingRowsIntoParagraphs",
    ] {
        rp.compare_values(1.0, if actions.contains(&expected) { 1.0 } else { 0.0 }, 0.0);
    }
    let increasing = reports.windows(2).all(|w| w[0].1 <= w[1].1);
    rp.compare_values(1.0, if increasing { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(1.0, reports.last().map_or(0.0, |r| r.1), 0.0);

    assert!(rp.cleanup(), "progress regression test failed");
}

#[test]
fn segment_invalid_options_reg() {
    let source = RasterGrid::bilevel(16, 16, vec![255u8; 256]).unwrap();
    let options = SegmenterOptions::default().with_max_shape_stack_size(0);
    assert!(matches!(
        segment_page(&source, options),
        Err(SegmentError::InvalidParameter(_))
    ));
}

#[test]
fn segment_junk_reg() {
    let mut rp = RegParams::new("segment_junk");
    let source = two_paragraph_page().build().unwrap();
    let mut segmenter = Segmenter::new(&source, SegmenterOptions::default().with_clean_segment(true)).unwrap();
    let mut page = segmenter.segment().unwrap();

    // nothing is recognised yet
    rp.compare_values(2.0, segmenter.junk_paragraphs(&page).len() as f64, 0.0);

    let ids: Vec<_> = page.arena.iter().map(|(id, _)| id).collect();
    for id in ids {
        page.arena[id].confidence = 0.9;
    }
    rp.compare_values(0.0, segmenter.junk_paragraphs(&page).len() as f64, 0.0);

    assert!(rp.cleanup(), "junk regression test failed");
}
