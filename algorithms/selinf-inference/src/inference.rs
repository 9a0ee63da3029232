use ndarray::{concatenate, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use selinf::{Float, ParamGuard};
use selinf_lar::{LarPath, QrFactor};
use tracing::{debug, trace, warn};

use crate::auxiliary::{asymptotic_pvalue, covariance_test, spacing_pvalue};
use crate::error::{InferenceError, Result};
use crate::hyperparams::{InferenceMode, InferenceParams, InferenceValidParams};
use crate::polyhedral::PolyhedralTester;
use crate::stopping::{aic_stop, forward_stop};
use crate::LarInference;

/// Test the variables selected along a LAR path
///
/// Shorthand for [`InferenceParams::infer`].
pub fn infer<F: Float>(path: &LarPath<F>, params: &InferenceParams<F>) -> Result<LarInference<F>> {
    params.infer(path)
}

/// Noise level estimate of a path
///
/// With at least twice as many samples as features this is the residual standard error of the
/// least squares fit on all features, otherwise the sample standard deviation of the targets.
pub fn estimate_sigma<F: Float>(path: &LarPath<F>) -> Result<F> {
    let (n, p) = path.x().dim();
    let intercept = if path.with_intercept() { 1 } else { 0 };

    let sigma = if n >= 2 * p && n > p + intercept {
        let qr = QrFactor::thin_from_columns(path.x())?;
        let resid = qr.residual(path.y());
        (resid.dot(&resid) / F::cast(n - p - intercept)).sqrt()
    } else {
        warn!(
            n,
            p, "too few samples for a residual based noise level, using the deviation of the targets"
        );
        if n < 2 {
            return Err(selinf::Error::NotEnoughSamples.into());
        }
        path.y().std(F::one())
    };

    if sigma > F::zero() && sigma.is_finite() {
        Ok(sigma)
    } else {
        Err(InferenceError::InvalidSigma(
            sigma.to_f32().unwrap_or(f32::NAN),
        ))
    }
}

impl<F: Float> InferenceParams<F> {
    /// Verify the parameters and test the variables selected along `path`
    pub fn infer(&self, path: &LarPath<F>) -> Result<LarInference<F>> {
        self.check_ref()?.infer(path)
    }
}

/// Rows of the result table, one per tested variable
struct Table<F> {
    vars: Vec<usize>,
    sign: Vec<F>,
    pv: Vec<F>,
    vlo: Vec<F>,
    vup: Vec<F>,
    ci: Vec<F>,
    tailarea: Vec<F>,
    vmat: Vec<F>,
}

impl<F: Float> Table<F> {
    fn with_capacity(rows: usize, n: usize) -> Self {
        Table {
            vars: Vec::with_capacity(rows),
            sign: Vec::with_capacity(rows),
            pv: Vec::with_capacity(rows),
            vlo: Vec::with_capacity(rows),
            vup: Vec::with_capacity(rows),
            ci: Vec::with_capacity(2 * rows),
            tailarea: Vec::with_capacity(2 * rows),
            vmat: Vec::with_capacity(rows * n),
        }
    }

    /// Test the coefficient `contrast . y` of variable `var`
    ///
    /// The contrast is normalized and signed such that the statistic is non-negative. Truncation
    /// limits refer to the signed coefficient, intervals and tail areas to the coefficient itself,
    /// both on the scale of the original records.
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        tester: &PolyhedralTester<F>,
        path: &LarPath<F>,
        gamma: &ArrayBase<impl Data<Elem = F>, Ix2>,
        u: &ArrayBase<impl Data<Elem = F>, Ix1>,
        contrast: Array1<F>,
        var: usize,
    ) -> Result<()> {
        let y = path.y();
        let norm = contrast.dot(&contrast).sqrt();
        let mut v = contrast / norm;
        let sign = if v.dot(y) >= F::zero() {
            F::one()
        } else {
            -F::one()
        };
        v *= sign;

        let test = tester.test(y, gamma, u, &v)?;
        let scale = norm / path.sx()[var];
        let (lo, hi) = (test.interval.0 * scale, test.interval.1 * scale);
        let (lower_tail, upper_tail) = test.tailarea;

        self.vars.push(var);
        self.sign.push(sign);
        self.pv.push(test.pvalue);
        self.vlo.push(test.vlo * scale);
        self.vup.push(test.vup * scale);
        if sign > F::zero() {
            self.ci.extend([lo, hi].iter());
            self.tailarea.extend([lower_tail, upper_tail].iter());
        } else {
            self.ci.extend([-hi, -lo].iter());
            self.tailarea.extend([upper_tail, lower_tail].iter());
        }
        self.vmat.extend(v.iter().map(|&vi| vi * scale));

        trace!(variable = var, pvalue = %test.pvalue, vlo = %test.vlo, vup = %test.vup, "tested variable");
        Ok(())
    }
}

impl<F: Float> InferenceValidParams<F> {
    /// Test the variables selected along `path`
    ///
    /// * `Active`: the variable entering at step `j` for every `j <= k`, with `k` clamped to the
    ///   recorded steps. Adds ForwardStop on the p-values and the approximate tests per step.
    /// * `All`: every variable of the model made of the first `k` entering variables. Fails with
    ///   [`InsufficientPath`](InferenceError::InsufficientPath) if `k` exceeds the recorded steps.
    /// * `Aic`: the variables entering before the AIC stopping point among the first `k` steps,
    ///   conditioning on the stopping event as well.
    pub fn infer(&self, path: &LarPath<F>) -> Result<LarInference<F>> {
        let sigma = match self.sigma() {
            Some(sigma) => sigma,
            None => estimate_sigma(path)?,
        };
        let tester = PolyhedralTester::with_grid(
            sigma,
            self.alpha(),
            self.grid_width_factor(),
            self.grid_points(),
        )?;
        let nsteps = path.nsteps();
        let n = path.y().len();
        let constraints = path.constraints();
        debug!(mode = ?self.mode(), sigma = %sigma, nsteps, "selective inference on a LAR path");

        let step_contrast = |j: usize| &path.contrasts().row(j) * path.signs()[j];

        let (table, k, khat, aic) = match self.mode() {
            InferenceMode::Active => {
                let k = self.k().unwrap_or(nsteps).min(nsteps);
                let mut table = Table::with_capacity(k, n);
                for j in 0..k {
                    let gamma = constraints.rows_through(j + 1)?;
                    let u = Array1::<F>::zeros(gamma.nrows());
                    table.push(&tester, path, &gamma, &u, step_contrast(j), path.actions()[j])?;
                }
                let khat = forward_stop(&Array1::from(table.pv.clone()), self.alpha());
                (table, k, Some(khat), None)
            }
            InferenceMode::All => {
                let k = self.k().unwrap_or(nsteps);
                if k > nsteps {
                    return Err(InferenceError::InsufficientPath {
                        requested: k,
                        available: nsteps,
                    });
                }
                let active = &path.actions()[..k];
                let gamma = constraints.rows_through(k)?;
                let u = Array1::<F>::zeros(gamma.nrows());
                let pinv = QrFactor::thin_from_columns(&path.x().select(Axis(1), active))?
                    .pseudo_inverse()?;

                let mut table = Table::with_capacity(k, n);
                for (row, &var) in pinv.rows().into_iter().zip(active) {
                    table.push(&tester, path, &gamma, &u, row.to_owned(), var)?;
                }
                (table, k, None, None)
            }
            InferenceMode::Aic => {
                let k = self.k().unwrap_or(nsteps).min(nsteps);
                let stop = aic_stop(
                    path.x(),
                    path.y(),
                    &path.actions()[..k],
                    &path.df()[..k],
                    sigma,
                    self.aic_mult(),
                    self.aic_patience(),
                )?;
                // condition on every step the stopping rule looked at
                let path_rows = constraints.rows_through(stop.inspected())?;
                let gamma = concatenate(Axis(0), &[stop.gamma.view(), path_rows])
                    .map_err(selinf::Error::from)?;
                let zeros = Array1::<F>::zeros(path_rows.nrows());
                let u = concatenate(Axis(0), &[stop.u.view(), zeros.view()])
                    .map_err(selinf::Error::from)?;

                let mut table = Table::with_capacity(stop.khat, n);
                for j in 0..stop.khat {
                    table.push(&tester, path, &gamma, &u, step_contrast(j), path.actions()[j])?;
                }
                (table, k, Some(stop.khat), Some(stop.aic))
            }
        };

        let (spacing, asymptotic, covtest) = if self.mode() == InferenceMode::Active {
            let mut spacing = Vec::with_capacity(k);
            let mut asymptotic = Vec::with_capacity(k);
            let mut covtest = Vec::with_capacity(k);
            for step in 1..=k {
                spacing.push(Some(spacing_pvalue(path, sigma, step)?));
                asymptotic.push(available(asymptotic_pvalue(path, sigma, step), step)?);
                covtest.push(available(covariance_test(path, sigma, step), step)?);
            }
            (spacing, asymptotic, covtest)
        } else {
            (Vec::new(), Vec::new(), Vec::new())
        };

        let rows = table.vars.len();
        Ok(LarInference {
            mode: self.mode(),
            sigma,
            alpha: self.alpha(),
            k,
            khat,
            vars: table.vars,
            sign: Array1::from(table.sign),
            pv: Array1::from(table.pv),
            vlo: Array1::from(table.vlo),
            vup: Array1::from(table.vup),
            ci: Array2::from_shape_vec((rows, 2), table.ci).map_err(selinf::Error::from)?,
            tailarea: Array2::from_shape_vec((rows, 2), table.tailarea)
                .map_err(selinf::Error::from)?,
            vmat: Array2::from_shape_vec((rows, n), table.vmat).map_err(selinf::Error::from)?,
            aic,
            pv_spacing: spacing,
            pv_asymptotic: asymptotic,
            pv_covtest: covtest,
        })
    }
}

/// Map a test needing the omitted tail of an incomplete path onto `None`
fn available<F>(res: Result<F>, step: usize) -> Result<Option<F>> {
    match res {
        Ok(pv) => Ok(Some(pv)),
        Err(InferenceError::InsufficientPath { .. }) => {
            warn!(step, "the path is incomplete, the approximate test is not available");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
