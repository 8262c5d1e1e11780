//! Diagnostic overlay of a segmentation
//!
//! Draws the segmentation over the greyscale page:
//! - shapes in blue, words in green, guide lines in red
//! - paragraphs in dark grey
//! - column separators in orange
//! - column margins in blue and tabs in red

use crate::page::SegmentedPage;
use crate::group::GuideSegment;
use image::{Rgb, RgbImage};
use pageseg_core::{Bounded, RasterGrid, Rect};

pub const SHAPE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const GROUP_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const GUIDE_LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const PARAGRAPH_COLOR: Rgb<u8> = Rgb([64, 64, 64]);
pub const SEPARATOR_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
pub const MARGIN_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const TAB_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Padding around word and paragraph boxes
const BOX_PADDING: i32 = 2;
/// Inset and stroke of column separators
const SEPARATOR_STROKE: u32 = 3;

/// An RGB image that clips everything drawn outside it
struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn put(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Bresenham line with 8-connectivity
    fn line(&mut self, (x1, y1): (i32, i32), (x2, y2): (i32, i32), color: Rgb<u8>) {
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let sx = if x2 > x1 { 1 } else { -1 };
        let sy = if y2 > y1 { 1 } else { -1 };
        let (mut x, mut y) = (x1, y1);
        if dx >= dy {
            let mut err = dx / 2;
            for _ in 0..=dx {
                self.put(x, y, color);
                err -= dy;
                if err < 0 {
                    y += sy;
                    err += dx;
                }
                x += sx;
            }
        } else {
            let mut err = dy / 2;
            for _ in 0..=dy {
                self.put(x, y, color);
                err -= dx;
                if err < 0 {
                    x += sx;
                    err += dy;
                }
                y += sy;
            }
        }
    }

    /// A line with parallel copies on alternating sides
    fn wide_line(&mut self, from: (i32, i32), to: (i32, i32), width: u32, color: Rgb<u8>) {
        self.line(from, to, color);
        let horizontal = (to.0 - from.0).abs() > (to.1 - from.1).abs();
        for i in 1..width.max(1) {
            let offset = (i + 1).div_ceil(2) as i32 * if i % 2 == 1 { -1 } else { 1 };
            let (a, b) = if horizontal {
                ((from.0, from.1 + offset), (to.0, to.1 + offset))
            } else {
                ((from.0 + offset, from.1), (to.0 + offset, to.1))
            };
            self.line(a, b, color);
        }
    }

    fn rect(&mut self, r: Rect, width: u32, color: Rgb<u8>) {
        let (l, t, rt, b) = (r.left, r.top, r.right, r.bottom);
        self.wide_line((l, t), (rt, t), width, color);
        self.wide_line((l, b), (rt, b), width, color);
        self.wide_line((l, t), (l, b), width, color);
        self.wide_line((rt, t), (rt, b), width, color);
    }

    fn guide(&mut self, segment: &GuideSegment, color: Rgb<u8>) {
        self.line((segment.left, segment.y_left), (segment.right, segment.y_right), color);
    }
}

/// Render a page's segmentation over its raster
pub fn draw_segmentation(page: &SegmentedPage, source: &RasterGrid) -> RgbImage {
    let gray = source.to_image();
    let image = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let level = gray.get_pixel(x, y).0[0];
        Rgb([level, level, level])
    });
    let mut canvas = Canvas { image };
    let left_to_right = page.direction.is_left_to_right();

    for separator in &page.column_separators {
        let shift = |y: i32| page.x_adjustment(y as f64).round() as i32;
        let inset = SEPARATOR_STROKE as i32;
        let (top, bottom) = (separator.top + inset, separator.bottom - inset);
        let top_left = (separator.left + shift(separator.top) + inset, top);
        let bottom_left = (separator.left + shift(separator.bottom) + inset, bottom);
        let top_right = (separator.right + shift(separator.top) - inset, top);
        let bottom_right = (separator.right + shift(separator.bottom) - inset, bottom);
        canvas.wide_line(top_left, bottom_left, SEPARATOR_STROKE, SEPARATOR_COLOR);
        canvas.wide_line(top_right, bottom_right, SEPARATOR_STROKE, SEPARATOR_COLOR);
        canvas.wide_line(top_left, top_right, SEPARATOR_STROKE, SEPARATOR_COLOR);
        canvas.wide_line(bottom_left, bottom_right, SEPARATOR_STROKE, SEPARATOR_COLOR);
    }

    for paragraph in &page.paragraphs {
        for row in &paragraph.rows {
            let mut previous: Option<(GuideSegment, GuideSegment)> = None;
            for group in &row.groups {
                for &id in &group.shapes {
                    canvas.rect(page.arena[id].bounds, 1, SHAPE_COLOR);
                }
                canvas.rect(group.bounds().expand(BOX_PADDING), 2, GROUP_COLOR);

                let (mean_line, base_line) = (group.mean_line(), group.base_line());
                if let Some((last_mean, last_base)) = previous {
                    let last_x_height = last_base.y_left - last_mean.y_left;
                    if base_line.y_left - mean_line.y_left == last_x_height {
                        if left_to_right {
                            canvas.line((mean_line.right, mean_line.y_right), (last_mean.left, last_mean.y_left), GUIDE_LINE_COLOR);
                            canvas.line((base_line.right, base_line.y_right), (last_base.left, last_base.y_left), GUIDE_LINE_COLOR);
                        } else {
                            canvas.line((mean_line.left, mean_line.y_left), (last_mean.right, last_mean.y_right), GUIDE_LINE_COLOR);
                            canvas.line((base_line.left, base_line.y_left), (last_base.right, last_base.y_right), GUIDE_LINE_COLOR);
                        }
                    }
                }
                canvas.guide(&mean_line, GUIDE_LINE_COLOR);
                canvas.guide(&base_line, GUIDE_LINE_COLOR);
                previous = Some((mean_line, base_line));
            }
        }
        canvas.rect(paragraph.bounds().expand(BOX_PADDING), 2, PARAGRAPH_COLOR);
    }

    for outline in &page.column_outlines {
        let (top, bottom) = (outline.top, outline.bottom);
        let at = |x: f64, y: f64| ((x + page.x_adjustment(y)).round() as i32, y.round() as i32);
        for (x, color) in [
            (outline.start_margin, MARGIN_COLOR),
            (outline.end_margin, MARGIN_COLOR),
            (outline.start_tab, TAB_COLOR),
        ] {
            canvas.line(at(x, top), at(x, bottom), color);
        }
    }
    canvas.image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Canvas {
        Canvas {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        }
    }

    #[test]
    fn test_line_endpoints_and_clipping() {
        let mut canvas = blank(10, 10);
        canvas.line((0, 0), (9, 4), GUIDE_LINE_COLOR);
        assert_eq!(*canvas.image.get_pixel(0, 0), GUIDE_LINE_COLOR);
        assert_eq!(*canvas.image.get_pixel(9, 4), GUIDE_LINE_COLOR);
        canvas.line((-5, 5), (20, 5), SHAPE_COLOR);
        assert_eq!(*canvas.image.get_pixel(0, 5), SHAPE_COLOR);
        assert_eq!(*canvas.image.get_pixel(9, 5), SHAPE_COLOR);
    }

    #[test]
    fn test_rect_outline() {
        let mut canvas = blank(10, 10);
        canvas.rect(Rect::new_unchecked(2, 2, 7, 7), 1, GROUP_COLOR);
        assert_eq!(*canvas.image.get_pixel(2, 2), GROUP_COLOR);
        assert_eq!(*canvas.image.get_pixel(7, 5), GROUP_COLOR);
        assert_eq!(*canvas.image.get_pixel(4, 4), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_draw_empty_page() {
        let source = RasterGrid::bilevel(8, 6, vec![255; 48]).unwrap();
        let page = SegmentedPage::new(&source, pageseg_core::WritingDirection::LeftToRight);
        let image = draw_segmentation(&page, &source);
        assert_eq!(image.dimensions(), (8, 6));
        assert_eq!(*image.get_pixel(3, 3), Rgb([255, 255, 255]));
    }
}
