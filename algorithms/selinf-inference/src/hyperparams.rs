#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use selinf::{Float, ParamGuard};

use crate::error::InferenceError;

/// Which coefficients are tested and on which selection event
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferenceMode {
    /// Test the variable entering at every step `j <= k` in the model of the first `j` entering
    /// variables, conditioning on the path up to step `j`
    Active,
    /// Test every variable of the model made of the first `k` entering variables, conditioning on
    /// the path up to step `k`
    All,
    /// Choose the model size by AIC and test the selected variables, conditioning on the path and
    /// on the AIC stopping event
    Aic,
}

/// A verified hyper-parameter set for post-selection inference
///
/// See [`InferenceParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceValidParams<F> {
    pub(crate) sigma: Option<F>,
    pub(crate) alpha: F,
    pub(crate) k: Option<usize>,
    pub(crate) mode: InferenceMode,
    pub(crate) grid_width_factor: F,
    pub(crate) grid_points: usize,
    pub(crate) aic_mult: F,
    pub(crate) aic_patience: usize,
}

impl<F: Float> InferenceValidParams<F> {
    /// Known noise level, estimated from the path if `None`
    pub fn sigma(&self) -> Option<F> {
        self.sigma
    }

    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn k(&self) -> Option<usize> {
        self.k
    }

    pub fn mode(&self) -> InferenceMode {
        self.mode
    }

    pub fn grid_width_factor(&self) -> F {
        self.grid_width_factor
    }

    pub fn grid_points(&self) -> usize {
        self.grid_points
    }

    pub fn aic_mult(&self) -> F {
        self.aic_mult
    }

    pub fn aic_patience(&self) -> usize {
        self.aic_patience
    }
}

/// A hyper-parameter set for post-selection inference on a LAR path
///
/// The parameter set can be verified into an [`InferenceValidParams`] by calling
/// [ParamGuard::check](Self::check). [`infer`](Self::infer) verifies the set implicitely and
/// forwards any error.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [sigma](Self::sigma) | `None` | Noise level, estimated when not given | `(0, inf)` |
/// | [alpha](Self::alpha) | `0.1` | Miscoverage of the intervals and level of ForwardStop | `(0, 1)` |
/// | [k](Self::k) | `None` | Number of steps to test, the whole path when not given | `[1, inf)` |
/// | [mode](Self::mode) | `Active` | Tested coefficients and conditioning event | [`InferenceMode`] |
/// | [grid_width_factor](Self::grid_width_factor) | `25.0` | Half-width of the interval search grid in standard errors | `(0, inf)` |
/// | [grid_points](Self::grid_points) | `1000` | Points of the interval search grid | `[2, inf)` |
/// | [aic_mult](Self::aic_mult) | `2.0` | Penalty per degree of freedom of the AIC criterion | `(0, inf)` |
/// | [aic_patience](Self::aic_patience) | `2` | Consecutive AIC increases before stopping | `[1, inf)` |
///
/// # Errors
///
/// Every out-of-range parameter maps on its own variant of
/// [`InferenceError`](crate::InferenceError), for example `InvalidAlpha` for a level outside of
/// `(0, 1)`.
///
/// # Example
///
/// ```rust
/// use selinf_inference::{InferenceMode, InferenceParams};
/// use selinf::ParamGuard;
///
/// let params = InferenceParams::new()
///     .sigma(Some(1.0))
///     .alpha(0.05)
///     .mode(InferenceMode::All)
///     .k(Some(3))
///     .check()
///     .unwrap();
/// assert_eq!(params.grid_points(), 1000);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceParams<F>(InferenceValidParams<F>);

impl<F: Float> Default for InferenceParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> InferenceParams<F> {
    pub fn new() -> Self {
        Self(InferenceValidParams {
            sigma: None,
            alpha: F::cast(0.1),
            k: None,
            mode: InferenceMode::Active,
            grid_width_factor: F::cast(25.0),
            grid_points: 1000,
            aic_mult: F::cast(2.0),
            aic_patience: 2,
        })
    }

    /// Set a known noise level. With `None` the level is estimated from the residuals of the full
    /// least squares fit if there are at least twice as many samples as features, and from the
    /// standard deviation of the targets otherwise.
    pub fn sigma(mut self, sigma: Option<F>) -> Self {
        self.0.sigma = sigma;
        self
    }

    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    pub fn k(mut self, k: Option<usize>) -> Self {
        self.0.k = k;
        self
    }

    pub fn mode(mut self, mode: InferenceMode) -> Self {
        self.0.mode = mode;
        self
    }

    pub fn grid_width_factor(mut self, grid_width_factor: F) -> Self {
        self.0.grid_width_factor = grid_width_factor;
        self
    }

    pub fn grid_points(mut self, grid_points: usize) -> Self {
        self.0.grid_points = grid_points;
        self
    }

    pub fn aic_mult(mut self, aic_mult: F) -> Self {
        self.0.aic_mult = aic_mult;
        self
    }

    pub fn aic_patience(mut self, aic_patience: usize) -> Self {
        self.0.aic_patience = aic_patience;
        self
    }
}

impl<F: Float> ParamGuard for InferenceParams<F> {
    type Checked = InferenceValidParams<F>;
    type Error = InferenceError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if let Some(sigma) = p.sigma {
            if !sigma.is_finite() || sigma <= F::zero() {
                return Err(InferenceError::InvalidSigma(
                    sigma.to_f32().unwrap_or(f32::NAN),
                ));
            }
        }
        if !(p.alpha > F::zero() && p.alpha < F::one()) {
            Err(InferenceError::InvalidAlpha(
                p.alpha.to_f32().unwrap_or(f32::NAN),
            ))
        } else if p.k == Some(0) {
            Err(InferenceError::InvalidStep)
        } else if !p.grid_width_factor.is_finite()
            || p.grid_width_factor <= F::zero()
            || p.grid_points < 2
        {
            Err(InferenceError::InvalidGrid)
        } else if !p.aic_mult.is_finite() || p.aic_mult <= F::zero() || p.aic_patience == 0 {
            Err(InferenceError::InvalidAicParams)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = InferenceParams::<f64>::new().check().unwrap();
        assert_eq!(params.sigma(), None);
        assert_eq!(params.alpha(), 0.1);
        assert_eq!(params.k(), None);
        assert_eq!(params.mode(), InferenceMode::Active);
        assert_eq!(params.grid_width_factor(), 25.0);
        assert_eq!(params.grid_points(), 1000);
        assert_eq!(params.aic_mult(), 2.0);
        assert_eq!(params.aic_patience(), 2);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let params = InferenceParams::<f64>::new;
        assert!(matches!(
            params().sigma(Some(0.0)).check(),
            Err(InferenceError::InvalidSigma(_))
        ));
        assert!(matches!(
            params().sigma(Some(f64::INFINITY)).check(),
            Err(InferenceError::InvalidSigma(_))
        ));
        assert!(matches!(
            params().alpha(1.0).check(),
            Err(InferenceError::InvalidAlpha(_))
        ));
        assert!(matches!(
            params().alpha(0.0).check(),
            Err(InferenceError::InvalidAlpha(_))
        ));
        assert!(matches!(
            params().k(Some(0)).check(),
            Err(InferenceError::InvalidStep)
        ));
        assert!(matches!(
            params().grid_points(1).check(),
            Err(InferenceError::InvalidGrid)
        ));
        assert!(matches!(
            params().grid_width_factor(-1.0).check(),
            Err(InferenceError::InvalidGrid)
        ));
        assert!(matches!(
            params().aic_patience(0).check(),
            Err(InferenceError::InvalidAicParams)
        ));
        assert!(matches!(
            params().aic_mult(0.0).check(),
            Err(InferenceError::InvalidAicParams)
        ));
    }
}
