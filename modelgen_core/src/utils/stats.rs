//! Utility functions for summarizing collections of values

/// Median of `values`, or `None` if there are no finite values
///
/// Values are sorted before the middle is selected, so the result doesn't depend on the
/// order of `values`. For an even number of values the mean of the middle pair is returned.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.)
    } else {
        Some(sorted[middle])
    }
}
