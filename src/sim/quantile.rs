//! Sample quantiles.
//!
//! Uses linear interpolation between order statistics (Hyndman & Fan type 7,
//! the default of NumPy and pandas): for `n` sorted values and `q` in
//! `[0, 1]`, `h = (n - 1) * q` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.

/// Returns the `q`-quantile of `values`, or `None` if `values` is empty.
///
/// `q` is a fraction in `[0, 1]`; callers validate it.
///
/// # Examples
///
/// ```
/// use bess_sizer::sim::quantile::quantile;
///
/// let q90 = quantile(&[40.0, 10.0, 30.0, 20.0], 0.9).unwrap_or_default();
/// assert!((q90 - 37.0).abs() < 1e-9);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] for an already ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=1.0).contains(&q), "quantile out of range: {q}");

    let last = sorted.len() - 1;
    let h = last as f64 * q;
    let lower = (h.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let frac = h - lower as f64;

    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::quantile;

    #[test]
    fn empty_has_no_quantile() {
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn single_value_is_every_quantile() {
        assert_eq!(quantile(&[7.5], 0.0), Some(7.5));
        assert_eq!(quantile(&[7.5], 0.9), Some(7.5));
        assert_eq!(quantile(&[7.5], 1.0), Some(7.5));
    }

    #[test]
    fn interpolates_between_order_statistics() {
        // h = 3 * 0.9 = 2.7 → 30 + 0.7 * (40 - 30)
        let q = quantile(&[10.0, 20.0, 30.0, 40.0], 0.9).unwrap_or_default();
        assert_abs_diff_eq!(q, 37.0, epsilon = 1e-9);
    }

    #[test]
    fn median_of_even_count_is_midpoint() {
        let q = quantile(&[4.0, 1.0, 3.0, 2.0], 0.5).unwrap_or_default();
        assert_abs_diff_eq!(q, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn bounds_are_min_and_max() {
        let values = [3.0, -1.0, 8.0, 2.0];
        assert_eq!(quantile(&values, 0.0), Some(-1.0));
        assert_eq!(quantile(&values, 1.0), Some(8.0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = quantile(&[5.0, 1.0, 9.0, 3.0, 7.0], 0.35);
        let b = quantile(&[1.0, 3.0, 5.0, 7.0, 9.0], 0.35);
        assert_eq!(a, b);
    }
}
