//! Survival function of a truncated normal distribution
//!
//! The statistics tested after selection are normal variables restricted to an interval which
//! can lie many standard deviations away from the mean. Differences of normal tail
//! probabilities then underflow, so far in the tails the ratio of tail probabilities is computed
//! from Bryc's rational approximation of the Mills ratio instead.
use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

/// Upper tail probability `P(Z > x)` of a standard normal variable
pub fn norm_sf(x: f64) -> f64 {
    0.5 * erfc(x / SQRT_2)
}

/// Cumulative distribution function of a standard normal variable
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Survival function `P(X > z | a <= X <= b)` of `X ~ N(mean, sd^2)`
///
/// `z` is clamped into the truncation window first. An infinite mean gives the limiting value,
/// an empty window carries no information and gives `0.5`. The result is always in `[0, 1]`.
pub fn tnorm_surv(z: f64, mean: f64, sd: f64, a: f64, b: f64) -> f64 {
    if mean == f64::INFINITY {
        return 1.0;
    } else if mean == f64::NEG_INFINITY {
        return 0.0;
    }
    if !(b > a) {
        return 0.5;
    }

    let z = z.max(a).min(b);
    let (z, a, b) = ((z - mean) / sd, (a - mean) / sd, (b - mean) / sd);

    let p = if a >= 0.0 {
        right_tail(z, a, b)
    } else if b <= 0.0 {
        // mirror the window into the right tail
        1.0 - right_tail(-z, -b, -a)
    } else {
        central(z, a, b)
    };

    if p.is_nan() {
        0.5
    } else {
        p.max(0.0).min(1.0)
    }
}

/// Window on the positive half line, `0 <= a <= z <= b`
fn right_tail(z: f64, a: f64, b: f64) -> f64 {
    let den = norm_sf(a) - norm_sf(b);
    // subnormal tail probabilities carry too few significant bits for the ratio
    if den >= f64::MIN_POSITIVE && den.is_finite() {
        let p = (norm_sf(z) - norm_sf(b)) / den;
        if p.is_finite() {
            return p;
        }
    }

    bryc_right_tail(z, a, b)
}

/// Window containing the origin, `a < 0 < b`
fn central(z: f64, a: f64, b: f64) -> f64 {
    let den = norm_sf(a) - norm_sf(b);
    if den <= 0.0 {
        // the density is flat on a window this narrow
        return (b - z) / (b - a);
    }

    if z >= 0.0 {
        (norm_sf(z) - norm_sf(b)) / den
    } else {
        1.0 - (norm_cdf(z) - norm_cdf(a)) / den
    }
}

/// Bryc's approximation of the ratio of tail probabilities, `0 <= a <= z <= b`
///
/// With `Q(x) ~ mills(x) exp(-x^2 / 2)` every term is scaled by `exp(a^2 / 2)`, which keeps the
/// exponents non-positive.
fn bryc_right_tail(z: f64, a: f64, b: f64) -> f64 {
    let scaled = |x: f64| {
        if x.is_infinite() {
            0.0
        } else {
            mills(x) * (-(x - a) * (x + a) / 2.0).exp()
        }
    };

    let den = mills(a) - scaled(b);
    (scaled(z) - scaled(b)) / den
}

/// Rational approximation of `Q(x) exp(x^2 / 2)` for `x >= 0`
///
/// W. Bryc, "A uniform approximation to the right normal tail integral", 2002
fn mills(x: f64) -> f64 {
    (x * x + 5.575192695 * x + 12.7743632)
        / (x * x * x * (2.0 * PI).sqrt() + 14.38718147 * x * x + 31.53531977 * x + 2.0 * 12.77436324)
}
