//! Exact tests of a linear contrast conditional on a polyhedral selection event
//!
//! If the response `y ~ N(mu, sigma^2 I)` is known to lie in `{y : Gamma y <= u}`, the statistic
//! `T = v^T y` is, conditionally on the part of `y` orthogonal to `v`, a normal variable with
//! mean `v^T mu` truncated to a window `[vlo, vup]` which only depends on that orthogonal part.
//! Evaluating the truncated distribution at the observed `T` gives a pivot, and inverting it in
//! the mean gives a confidence interval.
use ndarray::{ArrayBase, Data, Ix1, Ix2};
use selinf::Float;

use crate::error::{InferenceError, Result};
use crate::truncnorm::tnorm_surv;

/// Outcome of a polyhedral test of `v^T mu = 0`
#[derive(Clone, Debug, PartialEq)]
pub struct PolyhedralTest<F> {
    /// Observed statistic `v^T y`
    pub statistic: F,
    /// Standard deviation `sigma |v|` of the statistic
    pub sd: F,
    pub vlo: F,
    pub vup: F,
    /// Two-sided p-value
    pub pvalue: F,
    /// Confidence interval for `v^T mu`
    pub interval: (F, F),
    /// Tail areas achieved at the interval ends, `alpha / 2` each up to the grid resolution
    pub tailarea: (F, F),
}

/// Truncation window of `v^T y` implied by `Gamma y <= u`
///
/// Rows of `Gamma` orthogonal to `v` do not restrict the window. Returns `(vlo, vup)`, possibly
/// infinite.
pub fn truncation_limits<F: Float>(
    gamma: &ArrayBase<impl Data<Elem = F>, Ix2>,
    u: &ArrayBase<impl Data<Elem = F>, Ix1>,
    v: &ArrayBase<impl Data<Elem = F>, Ix1>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<(F, F)> {
    if gamma.ncols() != y.len() || v.len() != y.len() || u.len() != gamma.nrows() {
        return Err(InferenceError::InvalidInput(format!(
            "constraints of shape {:?} with {} bounds do not match a response of length {} and a direction of length {}",
            gamma.dim(),
            u.len(),
            y.len(),
            v.len()
        )));
    }
    let vv = v.dot(v);
    if vv <= F::zero() {
        return Err(InferenceError::InvalidInput(
            "the test direction is zero".into(),
        ));
    }

    let t = v.dot(y);
    let z = gamma.dot(y);
    let rho = gamma.dot(v) / vv;

    let mut vlo = F::neg_infinity();
    let mut vup = F::infinity();
    for ((&ui, &zi), &ri) in u.iter().zip(z.iter()).zip(rho.iter()) {
        let bound = (ui - zi) / ri + t;
        if ri > F::zero() {
            vup = vup.min(bound);
        } else if ri < F::zero() {
            vlo = vlo.max(bound);
        }
    }

    Ok((vlo, vup))
}

/// Polyhedral tester with a fixed noise level and interval settings
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use selinf_inference::PolyhedralTester;
///
/// // y_0 >= 0, y_0 >= y_1
/// let gamma = array![[-1.0, 0.0], [-1.0, 1.0]];
/// let y = array![2.0, 1.0];
/// let tester = PolyhedralTester::new(1.0, 0.1)?;
/// let test = tester.test(&y, &gamma, &array![0.0, 0.0], &array![1.0, 0.0])?;
///
/// assert_eq!(test.vlo, 1.0);
/// assert!(test.pvalue > 0.0 && test.pvalue < 1.0);
/// assert!(test.interval.0 <= test.interval.1);
/// # Ok::<(), selinf_inference::InferenceError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PolyhedralTester<F> {
    sigma: F,
    alpha: F,
    grid_width_factor: F,
    grid_points: usize,
}

impl<F: Float> PolyhedralTester<F> {
    /// Tester with noise level `sigma` and intervals of miscoverage `alpha`, searched on a grid of
    /// 1000 points spanning 25 standard errors on either side of the statistic
    pub fn new(sigma: F, alpha: F) -> Result<Self> {
        Self::with_grid(sigma, alpha, F::cast(25.0), 1000)
    }

    pub fn with_grid(
        sigma: F,
        alpha: F,
        grid_width_factor: F,
        grid_points: usize,
    ) -> Result<Self> {
        if !sigma.is_finite() || sigma <= F::zero() {
            return Err(InferenceError::InvalidSigma(
                sigma.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if !(alpha > F::zero() && alpha < F::one()) {
            return Err(InferenceError::InvalidAlpha(
                alpha.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if !grid_width_factor.is_finite() || grid_width_factor <= F::zero() || grid_points < 2 {
            return Err(InferenceError::InvalidGrid);
        }

        Ok(PolyhedralTester {
            sigma,
            alpha,
            grid_width_factor,
            grid_points,
        })
    }

    pub fn sigma(&self) -> F {
        self.sigma
    }

    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Test `v^T mu = 0` given `Gamma y <= u`
    pub fn test(
        &self,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        gamma: &ArrayBase<impl Data<Elem = F>, Ix2>,
        u: &ArrayBase<impl Data<Elem = F>, Ix1>,
        v: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<PolyhedralTest<F>> {
        let (vlo, vup) = truncation_limits(gamma, u, v, y)?;
        let statistic = v.dot(y);
        let sd = self.sigma * v.dot(v).sqrt();

        let (t, sd64, lo, up) = (to_f64(statistic), to_f64(sd), to_f64(vlo), to_f64(vup));
        let pvalue = two_sided_pvalue(t, sd64, lo, up);
        let ((left, right), (lower_tail, upper_tail)) = self.interval(t, sd64, lo, up);

        Ok(PolyhedralTest {
            statistic,
            sd,
            vlo,
            vup,
            pvalue: F::cast(pvalue),
            interval: (F::cast(left), F::cast(right)),
            tailarea: (F::cast(lower_tail), F::cast(upper_tail)),
        })
    }

    /// Invert the survival function `theta -> P(T' > t)` of `T' ~ N(theta, sd^2)` truncated to
    /// `[vlo, vup]`, which increases with `theta`
    ///
    /// The lower end solves `S(theta) = alpha / 2`, the upper end `S(theta) = 1 - alpha / 2`. An
    /// end which is not bracketed by the grid is infinite.
    fn interval(&self, t: f64, sd: f64, vlo: f64, vup: f64) -> ((f64, f64), (f64, f64)) {
        let alpha = to_f64(self.alpha);
        let width = to_f64(self.grid_width_factor) * sd;
        let step = 2.0 * width / (self.grid_points - 1) as f64;
        let grid: Vec<f64> = (0..self.grid_points)
            .map(|i| t - width + i as f64 * step)
            .collect();
        let surv = |theta: f64| tnorm_surv(t, theta, sd, vlo, vup);
        let values: Vec<f64> = grid.iter().map(|&theta| surv(theta)).collect();

        let (left, start) = crossing(&grid, &values, &surv, alpha / 2.0, 0);
        let (right, _) = crossing(&grid, &values, &surv, 1.0 - alpha / 2.0, start);

        ((left, right), (surv(left), 1.0 - surv(right)))
    }
}

/// First grid point from `start` on where the increasing function reaches `level`, refined by
/// bisection against the previous grid point
fn crossing(
    grid: &[f64],
    values: &[f64],
    surv: impl Fn(f64) -> f64,
    level: f64,
    start: usize,
) -> (f64, usize) {
    let found = (start..grid.len()).find(|&i| values[i] >= level);
    let i = match found {
        Some(0) => return (f64::NEG_INFINITY, 0),
        Some(i) => i,
        None => return (f64::INFINITY, grid.len()),
    };

    let (mut lo, mut hi) = (grid[i - 1], grid[i]);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if surv(mid) >= level {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    (0.5 * (lo + hi), i)
}

/// `2 min(F(t), 1 - F(t))` under a zero mean
fn two_sided_pvalue(t: f64, sd: f64, vlo: f64, vup: f64) -> f64 {
    let surv = tnorm_surv(t, 0.0, sd, vlo, vup);
    (2.0 * surv.min(1.0 - surv)).min(1.0)
}

pub(crate) fn to_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
