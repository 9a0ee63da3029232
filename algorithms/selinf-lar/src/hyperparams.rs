#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use selinf::{Float, ParamGuard};

use crate::error::LarError;

/// A verified hyper-parameter set ready for the computation of a least angle regression path
///
/// See [`LarParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarValidParams<F> {
    max_steps: usize,
    min_lambda: F,
    with_intercept: bool,
    normalize: bool,
}

impl<F: Float> LarValidParams<F> {
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn min_lambda(&self) -> F {
        self.min_lambda
    }

    pub fn with_intercept(&self) -> bool {
        self.with_intercept
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }
}

/// A hyper-parameter set for the least angle regression path
///
/// The parameter set can be verified into a [`LarValidParams`] by calling
/// [ParamGuard::check](Self::check). It is also possible to directly fit a path with
/// [Fit::fit](selinf::traits::Fit::fit) which implicitely verifies the parameter set prior to
/// the path computation and forwards any error.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [max_steps](Self::max_steps) | `2000` | Step budget of the path | `[1, inf)` |
/// | [min_lambda](Self::min_lambda) | `0.0` | Stop once a knot falls below this value | `[0, inf)` |
/// | [with_intercept](Self::with_intercept) | `true` | Center records and targets | `false`, `true` |
/// | [normalize](Self::normalize) | `true` | Scale records to unit column norm | `false`, `true` |
///
/// # Errors
///
/// Returns [`InvalidMaxSteps`](LarError::InvalidMaxSteps) if the step budget is zero.
///
/// Returns [`InvalidMinLambda`](LarError::InvalidMinLambda) if the floor is negative or not
/// finite.
///
/// # Example
///
/// ```rust
/// use selinf_lar::{LarParams, LarError};
/// use selinf::prelude::*;
/// use ndarray::array;
///
/// let ds = Dataset::new(
///     array![[1.0, 0.2], [0.1, 1.0], [0.5, -0.3], [-0.7, 0.4]],
///     array![3.0, 2.0, 1.0, -1.0],
/// );
///
/// let path = LarParams::new().with_intercept(false).fit(&ds)?;
/// assert!(path.completepath());
/// # Ok::<(), LarError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LarParams<F>(LarValidParams<F>);

impl<F: Float> Default for LarParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> LarParams<F> {
    /// Create default LAR hyper parameters
    ///
    /// By default, an intercept will be removed by centering and the feature matrix is scaled to
    /// unit column norm. The path runs until no variable can enter anymore.
    pub fn new() -> Self {
        Self(LarValidParams {
            max_steps: 2000,
            min_lambda: F::zero(),
            with_intercept: true,
            normalize: true,
        })
    }

    /// Set the maximal number of steps. A path stopped by this budget is incomplete.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.0.max_steps = max_steps;
        self
    }

    /// Stop the path after the first knot below `min_lambda`. A path stopped by this floor is
    /// incomplete.
    pub fn min_lambda(mut self, min_lambda: F) -> Self {
        self.0.min_lambda = min_lambda;
        self
    }

    /// Whether to center records and targets before computing the path.
    /// Defaults to `true` if not set.
    pub fn with_intercept(mut self, with_intercept: bool) -> Self {
        self.0.with_intercept = with_intercept;
        self
    }

    /// Whether to scale every record column to unit Euclidean norm.
    /// Defaults to `true` if not set.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.0.normalize = normalize;
        self
    }
}

impl<F: Float> ParamGuard for LarParams<F> {
    type Checked = LarValidParams<F>;
    type Error = LarError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.max_steps == 0 {
            Err(LarError::InvalidMaxSteps)
        } else if !self.0.min_lambda.is_finite() || self.0.min_lambda.is_negative() {
            Err(LarError::InvalidMinLambda(
                self.0.min_lambda.to_f32().unwrap_or(f32::NAN),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
