//! Chebyshev record interpolation for SPK Type 2 segments.
//!
//! A Type 2 record stores position-only Chebyshev coefficients per
//! axis; velocity is the series derivative scaled by the record's time
//! radius. Both are produced in one forward pass of the recurrences
//! `T_{k+1} = 2s·T_k − T_{k-1}` and `T'_{k+1} = 2T_k + 2s·T'_k − T'_{k-1}`,
//! so a record read costs a single sweep over its coefficients.

/// Evaluate a Chebyshev series and its derivative with respect to the
/// normalized time `s ∈ [−1, 1]`. Returns `(value, d/ds)`; the caller
/// divides the derivative by the record radius to get physical units.
pub fn chebyshev_with_derivative(coeffs: &[f64], s: f64) -> (f64, f64) {
    let mut iter = coeffs.iter();
    let Some(&c0) = iter.next() else {
        return (0.0, 0.0);
    };
    let mut value = c0;
    let mut slope = 0.0;

    let Some(&c1) = iter.next() else {
        return (value, slope);
    };
    value += c1 * s;
    slope += c1;

    // T_{k-1}, T_k and their derivatives, starting from T_0, T_1.
    let (mut t_prev, mut t_here) = (1.0, s);
    let (mut d_prev, mut d_here) = (0.0, 1.0);
    for &c in iter {
        let t_next = 2.0 * s * t_here - t_prev;
        let d_next = 2.0 * t_here + 2.0 * s * d_here - d_prev;
        value += c * t_next;
        slope += c * d_next;
        (t_prev, t_here) = (t_here, t_next);
        (d_prev, d_here) = (d_here, d_next);
    }
    (value, slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference polynomial 3·T_0 − 2·T_1 + 0.5·T_2 + 0.25·T_3, written
    /// out in the monomial basis:
    /// T_2 = 2s²−1, T_3 = 4s³−3s.
    fn by_hand(s: f64) -> (f64, f64) {
        let value = 3.0 - 2.0 * s + 0.5 * (2.0 * s * s - 1.0) + 0.25 * (4.0 * s * s * s - 3.0 * s);
        let slope = -2.0 + 0.5 * (4.0 * s) + 0.25 * (12.0 * s * s - 3.0);
        (value, slope)
    }

    #[test]
    fn matches_the_monomial_expansion() {
        let coeffs = [3.0, -2.0, 0.5, 0.25];
        for s in [-1.0, -0.62, 0.0, 0.31, 0.99, 1.0] {
            let (v, d) = chebyshev_with_derivative(&coeffs, s);
            let (ev, ed) = by_hand(s);
            assert!((v - ev).abs() < 1e-12, "value at s={s}: {v} vs {ev}");
            assert!((d - ed).abs() < 1e-12, "slope at s={s}: {d} vs {ed}");
        }
    }

    #[test]
    fn derivative_agrees_with_a_finite_difference() {
        let coeffs = [1.7, 0.3, -0.9, 0.04, 0.011, -0.002];
        let h = 1e-6;
        for s in [-0.8, -0.1, 0.45, 0.97] {
            let (_, d) = chebyshev_with_derivative(&coeffs, s);
            let (above, _) = chebyshev_with_derivative(&coeffs, s + h);
            let (below, _) = chebyshev_with_derivative(&coeffs, s - h);
            let numeric = (above - below) / (2.0 * h);
            assert!((d - numeric).abs() < 1e-6, "s={s}: analytic {d}, numeric {numeric}");
        }
    }

    #[test]
    fn degenerate_series() {
        assert_eq!(chebyshev_with_derivative(&[], 0.5), (0.0, 0.0));
        assert_eq!(chebyshev_with_derivative(&[4.2], 0.5), (4.2, 0.0));
        let (v, d) = chebyshev_with_derivative(&[4.2, -1.0], 0.5);
        assert!((v - 3.7).abs() < 1e-15);
        assert!((d + 1.0).abs() < 1e-15);
    }

    #[test]
    fn endpoint_identities() {
        // T_k(1) = 1 and T_k(-1) = (−1)^k, so the value at the
        // endpoints is a signed coefficient sum.
        let coeffs = [0.5, 1.5, -2.5, 3.5];
        let (at_one, _) = chebyshev_with_derivative(&coeffs, 1.0);
        assert!((at_one - (0.5 + 1.5 - 2.5 + 3.5)).abs() < 1e-12);
        let (at_minus_one, _) = chebyshev_with_derivative(&coeffs, -1.0);
        assert!((at_minus_one - (0.5 - 1.5 - 2.5 - 3.5)).abs() < 1e-12);
    }
}
