//! # Least angle regression path with its selection event
//!
//! This crate computes the least angle regression (LAR) path of a response on a design matrix.
//! Starting from the empty model, the variable most correlated with the residual enters the
//! active set; the coefficients of the active variables then move along the equiangular
//! direction until an inactive variable becomes as correlated with the residual as the active
//! ones. The values of the penalty at which this happens are the knots of the path.
//!
//! Besides the knots, the entering variables, their signs and the coefficients, every step
//! records the rows of a [`ConstraintSystem`] `Gamma` such that the set of responses `y` with
//! `Gamma y <= 0` is exactly the set of responses that produce the same sequence of entering
//! variables and signs. This polyhedral description is what makes exact post-selection
//! inference possible, see the `selinf-inference` crate.
//!
//! The active columns are kept in an incrementally updated QR factorization ([`QrFactor`]) so a
//! step costs `O(n p)` instead of a fresh factorization of the active set.
//!
//! ## References
//!
//! * ["Least Angle Regression", Efron et al.](https://web.stanford.edu/~hastie/Papers/LARS/LeastAngle_2002.pdf)
//! * ["Exact Post-Selection Inference for Sequential Regression Procedures", Tibshirani et al.](https://arxiv.org/abs/1401.3889)
//! * [Wikipedia entry on the Least-angle regression](https://en.wikipedia.org/wiki/Least-angle_regression)

use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use selinf::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

pub use algorithm::build_path;
pub use constraints::ConstraintSystem;
pub use error::{LarError, Result};
pub use hyperparams::{LarParams, LarValidParams};
pub use qr::QrFactor;

mod algorithm;
mod constraints;
mod error;
mod hyperparams;
mod qr;

/// A computed least angle regression path
///
/// The path is immutable once built. Knots are strictly decreasing, one variable enters per
/// knot and never leaves.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LarPath<F> {
    lambdas: Array1<F>,
    actions: Vec<usize>,
    signs: Array1<F>,
    df: Vec<usize>,
    coefs: Array2<F>,
    constraints: ConstraintSystem<F>,
    contrasts: Array2<F>,
    bls: Option<Array1<F>>,
    completepath: bool,
    x: Array2<F>,
    y: Array1<F>,
    bx: Array1<F>,
    by: F,
    sx: Array1<F>,
    with_intercept: bool,
    normalize: bool,
}

impl<F: Float> LarPath<F> {
    /// Create default LAR hyper parameters
    pub fn params() -> LarParams<F> {
        LarParams::new()
    }

    /// Knots of the path, strictly decreasing
    pub fn lambdas(&self) -> &Array1<F> {
        &self.lambdas
    }

    /// Entering variable of every step
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    /// Sign of every entering variable
    pub fn signs(&self) -> &Array1<F> {
        &self.signs
    }

    /// Degrees of freedom at every knot: active-set size before the knot, plus one with an
    /// intercept
    pub fn df(&self) -> &[usize] {
        &self.df
    }

    /// Coefficients at every knot, `n_features x n_steps`, on the scale of the original records
    pub fn coefs(&self) -> &Array2<F> {
        &self.coefs
    }

    pub fn constraints(&self) -> &ConstraintSystem<F> {
        &self.constraints
    }

    /// Regression contrast of every step, `n_steps x n_samples`
    ///
    /// Row `k` maps the standardized response on the least squares coefficient of the variable
    /// entering at step `k + 1`, in the model made of the first `k + 1` entering variables, times
    /// its entry sign.
    pub fn contrasts(&self) -> &Array2<F> {
        &self.contrasts
    }

    /// Least squares refit on the final active set, only for a complete path
    pub fn bls(&self) -> Option<&Array1<F>> {
        self.bls.as_ref()
    }

    /// Whether the path ran until no further variable could enter
    pub fn completepath(&self) -> bool {
        self.completepath
    }

    pub fn nsteps(&self) -> usize {
        self.actions.len()
    }

    /// Records after centering and scaling
    pub fn x(&self) -> &Array2<F> {
        &self.x
    }

    /// Targets after centering
    pub fn y(&self) -> &Array1<F> {
        &self.y
    }

    /// Column means removed from the records
    pub fn bx(&self) -> &Array1<F> {
        &self.bx
    }

    /// Mean removed from the targets
    pub fn by(&self) -> F {
        self.by
    }

    /// Column scales applied to the records
    pub fn sx(&self) -> &Array1<F> {
        &self.sx
    }

    pub fn with_intercept(&self) -> bool {
        self.with_intercept
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Coefficients at penalty `lambda`
    ///
    /// The path is linear between consecutive knots and zero above the first one. Below the last
    /// knot a complete path continues linearly into the least squares refit at zero, while an
    /// incomplete path fails with [`InsufficientPath`](LarError::InsufficientPath).
    pub fn coef_at_lambda(&self, lambda: F) -> Result<Array1<F>> {
        let nsteps = self.nsteps();
        if lambda.is_nan() {
            return Err(LarError::InvalidInput("lambda is not a number".into()));
        }
        if lambda >= self.lambdas[0] {
            return Ok(self.coefs.column(0).to_owned());
        }

        for k in 1..nsteps {
            let (hi, lo) = (self.lambdas[k - 1], self.lambdas[k]);
            if lambda >= lo {
                let t = (hi - lambda) / (hi - lo);
                return Ok(interpolate(
                    &self.coefs.column(k - 1),
                    &self.coefs.column(k),
                    t,
                ));
            }
        }

        match &self.bls {
            Some(bls) => {
                let last = self.lambdas[nsteps - 1];
                if lambda <= F::zero() {
                    return Ok(bls.clone());
                }
                let t = (last - lambda) / last;
                Ok(interpolate(&self.coefs.column(nsteps - 1), bls, t))
            }
            None => Err(LarError::InsufficientPath {
                requested: nsteps + 1,
                available: nsteps,
            }),
        }
    }

    /// Coefficients at a fractional step, `1` is the first knot and `nsteps` the last one
    pub fn coef_at_step(&self, step: F) -> Result<Array1<F>> {
        let nsteps = self.nsteps();
        if step.is_nan() || step < F::one() {
            return Err(LarError::InvalidInput(format!(
                "step {} is before the first knot",
                step
            )));
        }
        if step > F::cast(nsteps) {
            return Err(LarError::InsufficientPath {
                requested: step.ceil().as_(),
                available: nsteps,
            });
        }
        let lower = step.floor();
        let k: usize = lower.as_();
        if k == nsteps {
            return Ok(self.coefs.column(k - 1).to_owned());
        }

        Ok(interpolate(
            &self.coefs.column(k - 1),
            &self.coefs.column(k),
            step - lower,
        ))
    }

    /// Intercept accompanying the coefficients `beta`
    pub fn intercept(&self, beta: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
        self.by - self.bx.dot(beta)
    }

    /// Predict the response of `x` with the coefficients at penalty `lambda`
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, lambda: F) -> Result<Array1<F>> {
        if x.ncols() != self.coefs.nrows() {
            return Err(LarError::InvalidInput(format!(
                "expected {} features, got {}",
                self.coefs.nrows(),
                x.ncols()
            )));
        }
        let beta = self.coef_at_lambda(lambda)?;
        let intercept = self.intercept(&beta);
        Ok(x.dot(&beta) + intercept)
    }
}

fn interpolate<F: Float>(
    from: &ArrayBase<impl Data<Elem = F>, Ix1>,
    to: &ArrayBase<impl Data<Elem = F>, Ix1>,
    t: F,
) -> Array1<F> {
    from * (F::one() - t) + to * t
}
