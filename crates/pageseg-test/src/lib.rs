//! pageseg-test - Regression test framework for pageseg
//!
//! Supports three modes, selected with the `REGTEST_MODE` environment
//! variable:
//!
//! - **Generate**: Create golden files for comparison
//! - **Compare**: Compare results with golden files (default)
//! - **Display**: Run without comparison and keep overlays for inspection
//!
//! # Usage
//!
//! ```ignore
//! use pageseg_test::{PageBuilder, RegParams};
//!
//! let mut rp = RegParams::new("words");
//! let mut page = PageBuilder::new(200, 40);
//! page.text_line(10, 10, 8, 12, &[3, 3, 20, 3]);
//! rp.compare_values(5.0, page.glyphs().len() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod builder;
mod error;
mod params;

pub use builder::PageBuilder;
pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // pageseg-test is at crates/pageseg-test
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
