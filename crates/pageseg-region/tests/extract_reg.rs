//! Shape extraction regression test
//!
//! Extracts regions from a noisy greyscale page at every threshold and
//! checks that each black pixel is claimed by exactly one region.
//!
//! Run with:
//! ```
//! cargo test -p pageseg-region --test extract_reg
//! ```

use pageseg_core::{PixelSource, RasterGrid, Rect, WritableMirror};
use pageseg_region::{ExtractOptions, extract_shapes, fill_region};
use pageseg_test::{PageBuilder, RegParams};

fn noisy_page(width: u32, height: u32) -> RasterGrid {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 37 + y * 91 + x * y * 13) % 256) as u8))
        .collect();
    RasterGrid::bilevel(width, height, data).unwrap()
}

#[test]
fn extract_reg() {
    let mut rp = RegParams::new("extract");
    let page = noisy_page(48, 32);
    let full = Rect::new(0, 0, 47, 31).unwrap();

    for threshold in 0..=255u8 {
        let options = ExtractOptions::new(threshold);
        let regions = extract_shapes(&page, &options).unwrap();

        let black = page.count_black(&full, threshold);
        let claimed: u64 = regions.iter().map(|r| r.pixel_count).sum();
        rp.compare_values(black as f64, claimed as f64, 0.0);

        // every region refills to the same pixels from its seed
        let mut check = WritableMirror::like(&page);
        for region in &regions {
            let (x, y) = region.start;
            assert!(region.bounds.contains_point(x, y));
            let again = fill_region(&page, &mut check, x, y, &options).unwrap();
            assert_eq!(again.bounds, region.bounds);
            assert_eq!(again.pixel_count, region.pixel_count);
        }
        assert_eq!(check.count_ones() as u64, black);
    }

    assert!(rp.cleanup(), "extract regression test failed");
}

#[test]
fn extract_glyphs_reg() {
    let mut rp = RegParams::new("extract_glyphs");

    let mut builder = PageBuilder::new(120, 40);
    builder.text_line(10, 10, 8, 14, &[4, 4, 12, 4]);
    builder.hollow(90, 5, 20, 25, 3);
    let page = builder.build().unwrap();

    let regions = extract_shapes(&page, &ExtractOptions::new(page.separation_threshold())).unwrap();
    rp.compare_values(6.0, regions.len() as f64, 0.0);

    let mut expected: Vec<Rect> = builder.glyphs().to_vec();
    expected.sort_by(pageseg_core::cmp_top_to_bottom);
    let found: Vec<Rect> = regions.iter().map(|r| r.bounds).collect();
    assert_eq!(found, expected);

    // the hollow box keeps its stroke pixels only
    let hollow = regions.iter().find(|r| r.bounds.left == 90).unwrap();
    rp.compare_values((20 * 25 - 14 * 19) as f64, hollow.pixel_count as f64, 0.0);

    assert!(rp.cleanup(), "extract_glyphs regression test failed");
}
