//! Descriptive statistics
//!
//! Small helpers shared by every stage: percentiles, means, standard
//! deviations and a least-squares line fit. Empty inputs yield 0 rather
//! than NaN so that degenerate pages fall through the heuristics quietly.

/// Percentile of a sample, with `p` in `0..=100`
///
/// Uses the `(n + 1)` estimation: the position is `p / 100 * (n + 1)`,
/// positions below 1 return the minimum, positions at or above `n` return
/// the maximum, and anything in between interpolates linearly between the
/// two neighbouring order statistics.
///
/// Returns 0 for an empty sample.
///
/// # Example
///
/// ```
/// use pageseg_core::stats::percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&values, 50.0), 2.5);
/// assert_eq!(percentile(&values, 0.0), 1.0);
/// assert_eq!(percentile(&values, 100.0), 4.0);
/// ```
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Percentile of an already sorted sample
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let pos = p / 100.0 * (n as f64 + 1.0);
    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= n as f64 {
        return sorted[n - 1];
    }
    let lower_index = pos.floor() as usize;
    let fraction = pos - pos.floor();
    let lower = sorted[lower_index - 1];
    let upper = sorted[lower_index];
    lower + fraction * (upper - lower)
}

/// Arithmetic mean, 0 for an empty sample
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor `n - 1`), 0 for fewer than two values
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (n as f64 - 1.0)).sqrt()
}

/// Round half up: `floor(x + 0.5)`
#[inline]
pub fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

/// Collection of percentiles over one sample, sorted once
#[derive(Debug, Clone, Default)]
pub struct Percentiles {
    sorted: Vec<f64>,
}

impl Percentiles {
    /// Sort a sample for repeated percentile queries
    pub fn new<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    /// Percentile with `p` in `0..=100`
    pub fn get(&self, p: f64) -> f64 {
        percentile_sorted(&self.sorted, p)
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

/// Ordinary least-squares fit of `y = intercept + slope * x`
///
/// Values are accumulated online. Until two distinct x values have been
/// added the slope is 0 and the intercept is the mean of the y values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimpleRegression {
    n: u64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
}

impl SimpleRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation
    pub fn add(&mut self, x: f64, y: f64) {
        self.n += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_xx += x * x;
        self.sum_xy += x * y;
    }

    /// Number of observations
    pub fn n(&self) -> u64 {
        self.n
    }

    fn sxx(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.sum_xx - self.sum_x * self.sum_x / self.n as f64
    }

    /// Fitted slope
    pub fn slope(&self) -> f64 {
        let sxx = self.sxx();
        if self.n < 2 || sxx.abs() < f64::EPSILON {
            return 0.0;
        }
        let sxy = self.sum_xy - self.sum_x * self.sum_y / self.n as f64;
        sxy / sxx
    }

    /// Fitted intercept
    pub fn intercept(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.sum_y - self.slope() * self.sum_x) / self.n as f64
    }

    /// Predicted y for `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept() + self.slope() * x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolation() {
        let values = [15.0, 20.0, 35.0, 40.0, 50.0];
        // pos = 0.4 * 6 = 2.4 -> 20 + 0.4 * 15
        assert!((percentile(&values, 40.0) - 26.0).abs() < 1e-9);
        assert_eq!(percentile(&values, 5.0), 15.0);
        assert_eq!(percentile(&values, 95.0), 50.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[7.0], 10.0), 7.0);
    }

    #[test]
    fn test_percentiles_reuse() {
        let p = Percentiles::new([5.0, 1.0, 3.0]);
        assert_eq!(p.len(), 3);
        assert_eq!(p.get(50.0), 3.0);
        assert!(Percentiles::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_mean_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((std_dev(&values) - 2.138089935).abs() < 1e-6);
        assert_eq!(std_dev(&[3.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(2.49), 2);
    }

    #[test]
    fn test_regression() {
        let mut r = SimpleRegression::new();
        r.add(0.0, 1.0);
        r.add(1.0, 3.0);
        r.add(2.0, 5.0);
        assert_eq!(r.n(), 3);
        assert!((r.slope() - 2.0).abs() < 1e-9);
        assert!((r.intercept() - 1.0).abs() < 1e-9);
        assert!((r.predict(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_degenerate() {
        let mut r = SimpleRegression::new();
        assert_eq!(r.slope(), 0.0);
        r.add(4.0, 2.0);
        r.add(4.0, 6.0);
        assert_eq!(r.slope(), 0.0);
        assert_eq!(r.intercept(), 4.0);
    }
}
