//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::{golden_dir, regout_dir};
use image::DynamicImage;
use std::fs;
use std::path::Path;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Generate golden files
    Generate,
    /// Compare with golden files (default)
    #[default]
    Compare,
    /// Display mode - run without comparison, keep overlays for inspection
    Display,
}

impl RegTestMode {
    /// Read the mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "generate" => Self::Generate,
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the name, running index, mode and accumulated failures of one
/// regression test. Every check increments the index, so failure messages
/// point at the exact comparison that went wrong.
pub struct RegParams {
    /// Name of the test (e.g., "segmenter")
    pub test_name: String,
    index: usize,
    /// Test mode (generate, compare, or display)
    pub mode: RegTestMode,
    success: bool,
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// The mode comes from `REGTEST_MODE`. The golden and output
    /// directories are created if missing.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());

        eprintln!();
        eprintln!("================================================");
        eprintln!("====   {}_reg   ====", test_name);
        eprintln!("================================================");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, error: TestError) {
        let msg = format!("Failure in {}_reg: {}", self.test_name, error);
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();
        if diff > delta || diff.is_nan() {
            self.fail(TestError::ValueMismatch {
                index: self.index,
                expected,
                actual,
                delta,
            });
            false
        } else {
            true
        }
    }

    /// Compare two byte strings for equality
    pub fn compare_strings(&mut self, expected: &[u8], actual: &[u8]) -> bool {
        self.index += 1;
        if expected != actual {
            let msg = format!(
                "Failure in {}_reg: string comparison for index {}\n  expected: {:?}\n  actual:   {:?}",
                self.test_name,
                self.index,
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(actual)
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            self.success = false;
            false
        } else {
            true
        }
    }

    /// Write an image as PNG and check it against its golden counterpart
    pub fn write_image_and_check(&mut self, image: &DynamicImage) -> TestResult<()> {
        self.index += 1;
        let local_path = format!("{}/{}.{:02}.png", regout_dir(), self.test_name, self.index);
        image
            .save_with_format(&local_path, image::ImageFormat::Png)
            .map_err(|e| TestError::ImageWrite {
                path: local_path.clone(),
                message: e.to_string(),
            })?;
        self.check_file(&local_path)
    }

    /// Check a file against its golden counterpart
    ///
    /// In generate mode, copies the file to golden.
    /// In compare mode, compares with the golden file.
    /// In display mode, leaves the file in the output directory.
    fn check_file(&mut self, local_path: &str) -> TestResult<()> {
        let ext = Path::new(local_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let golden_path = format!(
            "{}/{}_golden.{:02}.{}",
            golden_dir(),
            self.test_name,
            self.index,
            ext
        );

        match self.mode {
            RegTestMode::Generate => {
                fs::copy(local_path, &golden_path)?;
                eprintln!("Generated: {}", golden_path);
            }
            RegTestMode::Compare => {
                if !Path::new(&golden_path).exists() {
                    self.fail(TestError::GoldenNotFound { path: golden_path });
                    return Ok(());
                }
                let same = fs::read(local_path)? == fs::read(&golden_path)?
                    || (ext == "png" && same_pixels(local_path, &golden_path));
                if !same {
                    self.fail(TestError::FileMismatch {
                        index: self.index,
                        path: local_path.to_string(),
                    });
                }
            }
            RegTestMode::Display => {
                eprintln!("Wrote: {}", local_path);
            }
        }
        Ok(())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();
        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Compare two image files pixel by pixel after decoding
fn same_pixels(path1: &str, path2: &str) -> bool {
    match (image::open(path1), image::open(path2)) {
        (Ok(a), Ok(b)) => a.to_rgba8() == b.to_rgba8(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env() {
        let mode = RegTestMode::from_env();
        assert!(matches!(
            mode,
            RegTestMode::Compare | RegTestMode::Generate | RegTestMode::Display
        ));
    }

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::new("params");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(1.0, f64::NAN, 1.0));
        assert!(!rp.is_success());
        assert_eq!(rp.index(), 2);
        assert_eq!(rp.failures().len(), 1);
    }

    #[test]
    fn test_compare_strings() {
        let mut rp = RegParams::new("params_strings");
        assert!(rp.compare_strings(b"abc", b"abc"));
        assert!(!rp.compare_strings(b"abc", b"abd"));
        assert!(!rp.cleanup());
    }
}
