//! Synthetic page builders
//!
//! Regression tests run on small generated pages rather than scans, so the
//! expected geometry is known exactly.

use crate::error::TestResult;
use image::GrayImage;
use pageseg_core::{RasterGrid, Rect};

/// Draws black glyphs on a white page
#[derive(Debug, Clone)]
pub struct PageBuilder {
    width: u32,
    height: u32,
    data: Vec<u8>,
    glyphs: Vec<Rect>,
}

impl PageBuilder {
    /// Create a white page
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![255; width as usize * height as usize],
            glyphs: Vec::new(),
        }
    }

    /// Set one pixel; coordinates outside the page are ignored
    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.data[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Fill a rectangle with a brightness
    pub fn fill(&mut self, rect: Rect, value: u8) -> &mut Self {
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                self.set(x, y, value);
            }
        }
        self
    }

    /// Draw a solid black block and record it as a glyph
    pub fn block(&mut self, left: i32, top: i32, width: i32, height: i32) -> &mut Self {
        let rect = Rect::new_unchecked(left, top, left + width - 1, top + height - 1);
        self.fill(rect, 0);
        self.glyphs.push(rect);
        self
    }

    /// Draw a hollow black box with the given stroke and record it as a glyph
    pub fn hollow(
        &mut self,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        stroke: i32,
    ) -> &mut Self {
        let outer = Rect::new_unchecked(left, top, left + width - 1, top + height - 1);
        self.fill(outer, 0);
        let inner = outer.expand(-stroke);
        if !inner.is_empty() {
            self.fill(inner, 255);
        }
        self.glyphs.push(outer);
        self
    }

    /// Draw a line of solid glyphs separated by the given gaps
    ///
    /// The first glyph starts at `left`; glyph `i + 1` starts `gaps[i]`
    /// white columns after glyph `i` ends.
    pub fn text_line(
        &mut self,
        left: i32,
        top: i32,
        glyph_width: i32,
        glyph_height: i32,
        gaps: &[i32],
    ) -> &mut Self {
        let mut x = left;
        self.block(x, top, glyph_width, glyph_height);
        for gap in gaps {
            x += glyph_width + gap;
            self.block(x, top, glyph_width, glyph_height);
        }
        self
    }

    /// Rectangles of every glyph drawn so far, in drawing order
    pub fn glyphs(&self) -> &[Rect] {
        &self.glyphs
    }

    /// Build a bilevel raster grid
    pub fn build(&self) -> TestResult<RasterGrid> {
        Ok(RasterGrid::bilevel(
            self.width,
            self.height,
            self.data.clone(),
        )?)
    }

    /// Copy the page into an `image` buffer
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[(y * self.width + x) as usize]])
        })
    }
}
