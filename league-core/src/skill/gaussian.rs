//! Standard normal helpers used by the Gaussian skill updates
//!
//! The truncation ratios are evaluated through the scaled complementary
//! error function so they stay finite deep in the tails, where the plain
//! `pdf / cdf` quotient would be `0 / 0`.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Smallest denominator allowed in the truncation ratios
const MIN_PROBABILITY: f64 = 1e-12;

/// Standard normal density
pub fn pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal cumulative distribution, P(X <= x)
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal survival function, P(X > x)
pub fn sf(x: f64) -> f64 {
    0.5 * erfc(x * FRAC_1_SQRT_2)
}

/// Complementary error function (fractional error below 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let r = erfcx_positive(z) * (-z * z).exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Scaled complementary error function `erfc(z) * exp(z^2)` for `z >= 0`
fn erfcx_positive(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    t * poly.exp()
}

/// Mean correction for the winner: `pdf(t) / cdf(t)`
pub fn v_win(t: f64) -> f64 {
    if t < 0.0 {
        // pdf(t) / cdf(t) == sqrt(2/pi) / erfcx(-t / sqrt 2)
        (2.0 / PI).sqrt() / erfcx_positive(-t * FRAC_1_SQRT_2)
    } else {
        pdf(t) / cdf(t).max(MIN_PROBABILITY)
    }
}

/// Variance correction for the winner: `v(t) * (v(t) + t)`
pub fn w_win(t: f64) -> f64 {
    let v = v_win(t);
    v * (v + t)
}

/// Mean correction for the loser: `pdf(t) / (1 - cdf(t))`
pub fn v_lose(t: f64) -> f64 {
    if t > 0.0 {
        (2.0 / PI).sqrt() / erfcx_positive(t * FRAC_1_SQRT_2)
    } else {
        pdf(t) / sf(t).max(MIN_PROBABILITY)
    }
}

/// Variance correction for the loser: `v(t) * (v(t) - t)`
pub fn w_lose(t: f64) -> f64 {
    let v = v_lose(t);
    v * (v - t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_known_values() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((cdf(1.0) - 0.841_344_746).abs() < 1e-6);
        assert!((cdf(-1.96) - 0.024_997_895).abs() < 1e-6);
    }

    #[test]
    fn test_cdf_and_sf_are_complementary() {
        for i in -40..=40 {
            let x = i as f64 / 10.0;
            assert!((cdf(x) + sf(x) - 1.0).abs() < 1e-6, "x = {}", x);
        }
    }

    #[test]
    fn test_v_at_zero() {
        // pdf(0) / 0.5
        let expected = 2.0 / (2.0 * PI).sqrt();
        assert!((v_win(0.0) - expected).abs() < 1e-6);
        assert!((v_lose(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_v_win_matches_direct_ratio_near_zero() {
        let t = -0.7;
        let direct = pdf(t) / cdf(t);
        assert!((v_win(t) - direct).abs() < 1e-6);
    }

    #[test]
    fn test_tail_ratios_stay_finite() {
        // Winner far weaker than loser: v ~ -t
        let v = v_win(-40.0);
        assert!(v.is_finite());
        assert!((v - 40.0).abs() < 0.1);
        let w = w_win(-40.0);
        assert!(w > 0.0 && w < 1.0);

        let v = v_lose(40.0);
        assert!(v.is_finite());
        assert!((v - 40.0).abs() < 0.1);
    }

    #[test]
    fn test_w_is_between_zero_and_one() {
        for i in -30..=30 {
            let t = i as f64 / 5.0;
            let w = w_win(t);
            assert!(w >= 0.0 && w <= 1.0, "w_win({}) = {}", t, w);
            let w = w_lose(t);
            assert!(w >= 0.0 && w <= 1.0, "w_lose({}) = {}", t, w);
        }
    }
}
