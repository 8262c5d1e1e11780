//! Progress reporting
//!
//! The segmenter announces each stage with a short action key and a
//! fraction of the work done so far.

/// Receiver of segmentation progress
pub trait ProgressMonitor {
    /// A new stage has started
    fn set_current_action(&mut self, action: &str);

    /// Fraction of the work done, between 0 and 1
    fn set_percent_complete(&mut self, percent: f64);

    /// The page is fully segmented
    fn set_finished(&mut self) {
        self.set_percent_complete(1.0);
    }
}

/// A monitor that ignores every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressMonitor for NoProgress {
    fn set_current_action(&mut self, _action: &str) {}

    fn set_percent_complete(&mut self, _percent: f64) {}
}

/// Closures receive the current action with every progress update
///
/// # Example
///
/// ```
/// use pageseg_recog::progress::{ProgressFn, ProgressMonitor};
///
/// let mut seen = Vec::new();
/// {
///     let mut monitor = ProgressFn::new(|action: &str, percent: f64| {
///         seen.push((action.to_string(), percent));
///     });
///     monitor.set_current_action("findingShapes");
///     monitor.set_percent_complete(0.2);
///     monitor.set_finished();
/// }
/// assert_eq!(seen.last().unwrap().1, 1.0);
/// ```
pub struct ProgressFn<F: FnMut(&str, f64)> {
    action: String,
    percent: f64,
    callback: F,
}

impl<F: FnMut(&str, f64)> ProgressFn<F> {
    /// Wrap a closure
    pub fn new(callback: F) -> Self {
        Self {
            action: String::new(),
            percent: 0.0,
            callback,
        }
    }
}

impl<F: FnMut(&str, f64)> ProgressMonitor for ProgressFn<F> {
    fn set_current_action(&mut self, action: &str) {
        self.action = action.to_string();
        (self.callback)(&self.action, self.percent);
    }

    fn set_percent_complete(&mut self, percent: f64) {
        self.percent = percent;
        (self.callback)(&self.action, percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_receives_action() {
        let mut log = Vec::new();
        let mut monitor = ProgressFn::new(|a: &str, p: f64| log.push(format!("{}:{}", a, p)));
        monitor.set_current_action("rows");
        monitor.set_percent_complete(0.5);
        monitor.set_finished();
        drop(monitor);
        assert_eq!(log, vec!["rows:0", "rows:0.5", "rows:1"]);
    }
}
