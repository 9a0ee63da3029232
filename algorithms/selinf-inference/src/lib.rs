//! # Selective inference for least angle regression
//!
//! The variables chosen by a LAR path are, by construction, the ones most correlated with the
//! response. Classical tests and intervals ignore this selection and are far too optimistic. The
//! selection event of a LAR path however is a polyhedron `{y : Gamma y <= 0}` (see
//! [`selinf_lar::ConstraintSystem`]), and conditionally on it every linear contrast `v^T y` of a
//! Gaussian response follows a truncated normal distribution. This crate turns that into exact
//! p-values and confidence intervals.
//!
//! * [`PolyhedralTester`] tests a single contrast given any polyhedron `{y : Gamma y <= u}`
//! * [`forward_stop`] and [`aic_stop`] choose a model size along the path
//! * [`spacing_pvalue`], [`asymptotic_pvalue`] and [`covariance_test`] are cheaper
//!   approximations looking only at the knots
//! * [`InferenceParams::infer`] ties everything together for a fitted [`LarPath`](selinf_lar::LarPath)
//!
//! ## Example
//!
//! ```rust
//! use ndarray::array;
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//! use selinf_datasets::generate::sparse_regression;
//! use selinf_inference::InferenceParams;
//! use selinf_lar::build_path;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let ds = sparse_regression(50, &array![4.0, 0.0, 0.0, 0.0, -3.0], 1.0, &mut rng);
//! let path = build_path(ds.records(), ds.targets(), 2000, 0.0, true, true)?;
//!
//! let inference = InferenceParams::new().sigma(Some(1.0)).infer(&path)?;
//! assert_eq!(inference.pv().len(), path.nsteps());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## References
//!
//! * ["Exact Post-Selection Inference for Sequential Regression Procedures", Tibshirani et al.](https://arxiv.org/abs/1401.3889)
//! * ["A significance test for the lasso", Lockhart et al.](https://arxiv.org/abs/1301.7161)
//! * ["Sequential selection procedures and false discovery rate control", G'Sell et al.](https://arxiv.org/abs/1309.5352)

use ndarray::{Array1, Array2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

pub use auxiliary::{asymptotic_pvalue, covariance_test, spacing_pvalue};
pub use error::{InferenceError, Result};
pub use hyperparams::{InferenceMode, InferenceParams, InferenceValidParams};
pub use inference::{estimate_sigma, infer};
pub use polyhedral::{truncation_limits, PolyhedralTest, PolyhedralTester};
pub use stopping::{aic_stop, forward_stop, AicStop};
pub use truncnorm::{norm_cdf, norm_sf, tnorm_surv};

mod auxiliary;
mod error;
mod hyperparams;
mod inference;
mod polyhedral;
mod stopping;
mod truncnorm;

/// Outcome of selective inference on a LAR path
///
/// Tables have one row per tested variable, in the order of [`vars`](Self::vars).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LarInference<F> {
    mode: InferenceMode,
    sigma: F,
    alpha: F,
    k: usize,
    khat: Option<usize>,
    vars: Vec<usize>,
    sign: Array1<F>,
    pv: Array1<F>,
    vlo: Array1<F>,
    vup: Array1<F>,
    ci: Array2<F>,
    tailarea: Array2<F>,
    vmat: Array2<F>,
    aic: Option<Array1<F>>,
    pv_spacing: Vec<Option<F>>,
    pv_asymptotic: Vec<Option<F>>,
    pv_covtest: Vec<Option<F>>,
}

impl<F> LarInference<F> {
    pub fn mode(&self) -> InferenceMode {
        self.mode
    }

    /// Noise level used by the tests, given or estimated
    pub fn sigma(&self) -> &F {
        &self.sigma
    }

    pub fn alpha(&self) -> &F {
        &self.alpha
    }

    /// Number of path steps considered
    pub fn k(&self) -> usize {
        self.k
    }

    /// Estimated stopping step: ForwardStop on the p-values in `Active` mode, the AIC choice in
    /// `Aic` mode and `None` in `All` mode
    pub fn khat(&self) -> Option<usize> {
        self.khat
    }

    /// Tested variables
    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    /// Sign of every tested coefficient
    pub fn sign(&self) -> &Array1<F> {
        &self.sign
    }

    /// Two-sided selective p-values
    pub fn pv(&self) -> &Array1<F> {
        &self.pv
    }

    /// Lower truncation limits of the signed coefficients
    pub fn vlo(&self) -> &Array1<F> {
        &self.vlo
    }

    /// Upper truncation limits of the signed coefficients
    pub fn vup(&self) -> &Array1<F> {
        &self.vup
    }

    /// Selective confidence intervals of the coefficients, one `[lower, upper]` row per variable
    pub fn ci(&self) -> &Array2<F> {
        &self.ci
    }

    /// Tail areas achieved at the interval ends
    pub fn tailarea(&self) -> &Array2<F> {
        &self.tailarea
    }

    /// Test directions, row `i` maps the targets onto the signed coefficient of `vars[i]`
    pub fn vmat(&self) -> &Array2<F> {
        &self.vmat
    }

    /// AIC criterion of the empty model and of every inspected step, `Aic` mode only
    pub fn aic(&self) -> Option<&Array1<F>> {
        self.aic.as_ref()
    }

    /// Spacing test per step, `Active` mode only
    pub fn pv_spacing(&self) -> &[Option<F>] {
        &self.pv_spacing
    }

    /// Asymptotic spacing test per step, `None` where the path is too short, `Active` mode only
    pub fn pv_asymptotic(&self) -> &[Option<F>] {
        &self.pv_asymptotic
    }

    /// Covariance test per step, `None` where the path is too short, `Active` mode only
    pub fn pv_covtest(&self) -> &[Option<F>] {
        &self.pv_covtest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<LarInference<f64>>();
        has_autotraits::<InferenceParams<f64>>();
        has_autotraits::<InferenceValidParams<f64>>();
        has_autotraits::<PolyhedralTester<f64>>();
        has_autotraits::<AicStop<f64>>();
        has_autotraits::<InferenceError>();
    }
}
