//! Easing curves.
//!
//! Cosine-based remappings of a completion fraction in `[0, 1]`. All three
//! curves fix `0 ↦ 0` and `1 ↦ 1`; [`compose`] applies a curve to its own
//! output to steepen it.

use std::f64::consts::PI;

/// Slow start and slow end: `cos(f·π − π)/2 + 0.5`.
#[inline]
#[must_use]
pub fn ease_in_out(fraction: f64) -> f64 {
    (fraction * PI - PI).cos() / 2.0 + 0.5
}

/// Slow start: `cos(f·π/2 − π) + 1`.
#[inline]
#[must_use]
pub fn ease_in(fraction: f64) -> f64 {
    (fraction * PI / 2.0 - PI).cos() + 1.0
}

/// Slow end: `cos(f·π/2 − π/2)`.
#[inline]
#[must_use]
pub fn ease_out(fraction: f64) -> f64 {
    (fraction * PI / 2.0 - PI / 2.0).cos()
}

/// Applies `curve` to `fraction`, `iterations` times.
///
/// Zero iterations return the fraction unchanged.
#[must_use]
pub fn compose(curve: impl Fn(f64) -> f64, fraction: f64, iterations: u32) -> f64 {
    let mut fraction = fraction;
    for _ in 0..iterations {
        fraction = curve(fraction);
    }
    fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    // ── fixed points ──────────────────────────────────────────────────────

    #[test]
    fn all_curves_fix_zero_and_one() {
        for curve in [ease_in_out, ease_in, ease_out] {
            assert!(curve(0.0).abs() < EPS);
            assert!((curve(1.0) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn ease_in_out_midpoint_is_half() {
        assert!((ease_in_out(0.5) - 0.5).abs() < EPS);
    }

    // ── curve shape ───────────────────────────────────────────────────────

    #[test]
    fn ease_in_starts_below_linear() {
        assert!(ease_in(0.25) < 0.25);
        assert!(ease_in(0.5) < 0.5);
    }

    #[test]
    fn ease_out_starts_above_linear() {
        assert!(ease_out(0.25) > 0.25);
        assert!(ease_out(0.5) > 0.5);
    }

    #[test]
    fn curves_are_monotonic_on_the_unit_interval() {
        for curve in [ease_in_out, ease_in, ease_out] {
            let mut prev = curve(0.0);
            for i in 1..=100 {
                let next = curve(f64::from(i) / 100.0);
                assert!(next >= prev - EPS);
                prev = next;
            }
        }
    }

    // ── composition ───────────────────────────────────────────────────────

    #[test]
    fn zero_iterations_is_identity() {
        for f in [0.0, 0.3, 0.7, 1.0] {
            assert_eq!(compose(ease_in_out, f, 0), f);
            assert_eq!(compose(ease_in, f, 0), f);
            assert_eq!(compose(ease_out, f, 0), f);
        }
    }

    #[test]
    fn one_iteration_matches_the_bare_curve() {
        assert_eq!(compose(ease_in_out, 0.3, 1), ease_in_out(0.3));
    }

    #[test]
    fn extra_iterations_steepen_the_curve() {
        // Below the midpoint ease-in-out pushes values further down.
        let once = compose(ease_in_out, 0.25, 1);
        let twice = compose(ease_in_out, 0.25, 2);
        assert!(twice < once);

        // And preserves the fixed points.
        assert!((compose(ease_in_out, 1.0, 5) - 1.0).abs() < EPS);
        assert!(compose(ease_in_out, 0.0, 5).abs() < EPS);
    }
}
