//! RasterGrid - the page image and its brightness thresholds
//!
//! A scanned page rarely uses the full 0..=255 range: paper is grey and ink
//! is not perfectly black. [`PageThresholds::from_histogram`] finds where
//! "black" and "white" actually sit on the page and derives the two
//! thresholds the segmenter works with:
//!
//! - the *black threshold*, generous, used when counting a letter's pixels
//! - the *separation threshold*, stricter, used when deciding whether two
//!   letters touch
//!
//! [`RasterGrid`] stores the raw bytes and normalizes them on read so that
//! the black limit maps to 0 and the white limit to 255.

use crate::error::{Error, Result};
use crate::pixel::{PixelSource, WHITE, WritablePixelSource};
use crate::stats;
use image::GrayImage;

/// Default percentile (as a fraction) of the dark spectrum used for the black threshold
pub const DEFAULT_BLACK_THRESHOLD_PERCENTILE: f64 = 0.6;

/// Default percentile (as a fraction) of the dark spectrum used for the separation threshold
pub const DEFAULT_SEPARATION_THRESHOLD_PERCENTILE: f64 = 0.35;

/// Share of the page ignored on each side when building the histogram
const HISTOGRAM_MARGIN: f64 = 0.10;

/// Brightness limits and thresholds of one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageThresholds {
    /// Raw brightness at which black starts
    pub black_limit: u8,
    /// Raw brightness at which white starts
    pub white_limit: u8,
    /// Normalized threshold for counting a pixel as part of a letter
    pub black_threshold: u8,
    /// Normalized threshold for deciding whether letters touch
    pub separation_threshold: u8,
    /// Number of filling passes applied to shapes of a bilevel page (default: 0)
    pub white_gap_fill_factor: u32,
    /// True when the page is bilevel
    pub black_and_white: bool,
}

impl Default for PageThresholds {
    fn default() -> Self {
        Self::bilevel()
    }
}

impl PageThresholds {
    /// Thresholds for a bilevel page: everything but pure white is black
    pub fn bilevel() -> Self {
        Self {
            black_limit: 0,
            white_limit: 255,
            black_threshold: 254,
            separation_threshold: 254,
            white_gap_fill_factor: 0,
            black_and_white: true,
        }
    }

    /// Brightness histogram of the central part of a page
    ///
    /// A tenth of the width and height is skipped on every side, so that
    /// dark scanner borders do not pollute the estimate.
    pub fn histogram(width: u32, height: u32, data: &[u8]) -> Result<[u64; 256]> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let margin_y = (height as f64 * HISTOGRAM_MARGIN).floor() as u32;
        let margin_x = (width as f64 * HISTOGRAM_MARGIN).floor() as u32;
        let mut histogram = [0u64; 256];
        for y in margin_y..height.saturating_sub(margin_y) {
            let row = &data[y as usize * width as usize..(y as usize + 1) * width as usize];
            for &value in &row[margin_x as usize..(width - margin_x) as usize] {
                histogram[value as usize] += 1;
            }
        }
        Ok(histogram)
    }

    /// Derive thresholds from a brightness histogram
    ///
    /// # Arguments
    ///
    /// * `histogram` - pixel counts per raw brightness
    /// * `black_percentile` - fraction of the dark spectrum below the black threshold
    /// * `separation_percentile` - fraction of the dark spectrum below the separation threshold
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if a percentile is outside `[0, 1]`.
    pub fn from_histogram(
        histogram: &[u64; 256],
        black_percentile: f64,
        separation_percentile: f64,
    ) -> Result<Self> {
        for (name, value) in [
            ("black percentile", black_percentile),
            ("separation percentile", separation_percentile),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidParameter(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let counts: Vec<f64> = histogram.iter().map(|&c| c as f64).collect();
        let mean_count = stats::mean(&counts);

        let mut start_white: Option<usize> = None;
        let mut end_white: Option<usize> = None;
        for i in (0..256).rev() {
            if start_white.is_none() && counts[i] > mean_count {
                start_white = Some(i);
            }
            if start_white.is_some() && counts[i] < mean_count {
                end_white = Some(i);
                break;
            }
        }
        let (Some(start_white), Some(end_white)) = (start_white, end_white) else {
            log::debug!("flat brightness histogram, using bilevel thresholds");
            return Ok(Self {
                black_and_white: false,
                ..Self::bilevel()
            });
        };

        let black_mean = stats::mean(&counts[..=end_white]);
        let start_black = counts.iter().position(|&c| c > black_mean).unwrap_or(0);

        if start_white <= start_black {
            log::debug!(
                "degenerate brightness limits (black {}, white {}), using bilevel thresholds",
                start_black,
                start_white
            );
            return Ok(Self {
                black_and_white: false,
                ..Self::bilevel()
            });
        }

        let multiplier = 255.0 / (start_white - start_black) as f64;
        let normalize = |value: usize| -> u8 {
            ((value as f64 - start_black as f64) * multiplier)
                .round()
                .clamp(0.0, 255.0) as u8
        };

        let black_value = cumulative_percentile(&histogram[..=end_white], black_percentile);
        let separation_value =
            cumulative_percentile(&histogram[..=end_white], separation_percentile);

        let thresholds = Self {
            black_limit: start_black as u8,
            white_limit: start_white as u8,
            black_threshold: normalize(black_value),
            separation_threshold: normalize(separation_value),
            white_gap_fill_factor: 0,
            black_and_white: false,
        };
        log::debug!(
            "page thresholds: black limit {}, white limit {}, end white {}, black threshold {}, separation threshold {}",
            thresholds.black_limit,
            thresholds.white_limit,
            end_white,
            thresholds.black_threshold,
            thresholds.separation_threshold
        );
        Ok(thresholds)
    }

    /// Normalize a raw brightness so that the black limit maps to 0 and the
    /// white limit to 255
    #[inline]
    pub fn normalize(&self, raw: u8) -> u8 {
        if self.white_limit <= self.black_limit {
            return raw;
        }
        let multiplier = 255.0 / (self.white_limit - self.black_limit) as f64;
        ((raw as f64 - self.black_limit as f64) * multiplier)
            .round()
            .clamp(0.0, 255.0) as u8
    }
}

/// Smallest bin at which the running share of pixels reaches `fraction`
fn cumulative_percentile(histogram: &[u64], fraction: f64) -> usize {
    let last = histogram.len().saturating_sub(1);
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return last;
    }
    let mut running = 0u64;
    for (i, &count) in histogram.iter().enumerate() {
        running += count;
        if running as f64 / total as f64 >= fraction {
            return i;
        }
    }
    last
}

/// A greyscale page with normalized brightness
#[derive(Debug, Clone)]
pub struct RasterGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
    thresholds: PageThresholds,
    lut: [u8; 256],
}

impl RasterGrid {
    /// Create a grid from raw bytes and known thresholds
    ///
    /// # Errors
    ///
    /// Returns an error for zero dimensions or a buffer of the wrong size.
    pub fn new(width: u32, height: u32, data: Vec<u8>, thresholds: PageThresholds) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut lut = [0u8; 256];
        for (raw, slot) in lut.iter_mut().enumerate() {
            *slot = thresholds.normalize(raw as u8);
        }
        Ok(Self {
            width,
            height,
            data,
            thresholds,
            lut,
        })
    }

    /// Create a bilevel grid (any non-white pixel is black)
    pub fn bilevel(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, data, PageThresholds::bilevel())
    }

    /// Create a greyscale grid, deriving thresholds from its histogram
    ///
    /// # Example
    ///
    /// ```
    /// use pageseg_core::RasterGrid;
    ///
    /// let mut data = vec![230u8; 40 * 40];
    /// for y in 10..20 {
    ///     for x in 10..20 {
    ///         data[y * 40 + x] = 20;
    ///     }
    /// }
    /// let grid = RasterGrid::from_gray(40, 40, data, 0.6, 0.35).unwrap();
    /// assert!(!grid.thresholds().black_and_white);
    /// ```
    pub fn from_gray(
        width: u32,
        height: u32,
        data: Vec<u8>,
        black_percentile: f64,
        separation_percentile: f64,
    ) -> Result<Self> {
        let histogram = PageThresholds::histogram(width, height, &data)?;
        let thresholds =
            PageThresholds::from_histogram(&histogram, black_percentile, separation_percentile)?;
        Self::new(width, height, data, thresholds)
    }

    /// Create a grid from an `image` greyscale buffer
    ///
    /// Images holding only the values 0 and 255 are treated as bilevel.
    pub fn from_image(
        image: &GrayImage,
        black_percentile: f64,
        separation_percentile: f64,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = image.as_raw().clone();
        if data.iter().all(|&v| v == 0 || v == 255) {
            return Self::bilevel(width, height, data);
        }
        Self::from_gray(width, height, data, black_percentile, separation_percentile)
    }

    /// The page thresholds
    pub fn thresholds(&self) -> &PageThresholds {
        &self.thresholds
    }

    /// Normalized black threshold
    pub fn black_threshold(&self) -> u8 {
        self.thresholds.black_threshold
    }

    /// Normalized separation threshold
    pub fn separation_threshold(&self) -> u8 {
        self.thresholds.separation_threshold
    }

    /// True when the page is bilevel
    pub fn is_black_and_white(&self) -> bool {
        self.thresholds.black_and_white
    }

    /// Number of filling passes applied to shapes of a bilevel page
    pub fn white_gap_fill_factor(&self) -> u32 {
        self.thresholds.white_gap_fill_factor
    }

    /// Set the white gap fill factor
    pub fn set_white_gap_fill_factor(&mut self, factor: u32) {
        self.thresholds.white_gap_fill_factor = factor;
    }

    /// Raw bytes, row-major
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy the raw bytes into an `image` buffer
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[(y * self.width + x) as usize]])
        })
    }
}

impl PixelSource for RasterGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn pixel(&self, x: i32, y: i32) -> u8 {
        if !self.in_bounds(x, y) {
            return WHITE;
        }
        self.lut[self.data[y as usize * self.width as usize + x as usize] as usize]
    }

    #[inline]
    fn raw_pixel(&self, x: i32, y: i32) -> u8 {
        if !self.in_bounds(x, y) {
            return WHITE;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }
}

impl WritablePixelSource for RasterGrid {
    fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if self.in_bounds(x, y) {
            self.data[y as usize * self.width as usize + x as usize] = value;
        }
    }
}
