//! Data-driven choices of the model size
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use selinf::Float;
use selinf_lar::QrFactor;
use tracing::debug;

use crate::error::{InferenceError, Result};

/// ForwardStop rule for a sequence of p-values
///
/// Returns the largest `k` for which the running mean of `-ln(1 - p_i)` over the first `k`
/// p-values is at most `alpha`, or `0` if there is none. Under independence of the null
/// p-values this controls the false discovery rate of the first `k` steps at level `alpha`.
///
/// G'Sell et al., "Sequential selection procedures and false discovery rate control", 2016
///
/// ```rust
/// use ndarray::array;
/// use selinf_inference::forward_stop;
///
/// assert_eq!(forward_stop(&array![0.0, 0.01, 0.6, 0.9], 0.1), 2);
/// ```
pub fn forward_stop<F: Float>(pvalues: &ArrayBase<impl Data<Elem = F>, Ix1>, alpha: F) -> usize {
    let mut sum = F::zero();
    let mut khat = 0;
    for (i, &pv) in pvalues.iter().enumerate() {
        sum += -(F::one() - pv).ln();
        if sum / F::cast(i + 1) <= alpha {
            khat = i + 1;
        }
    }

    khat
}

/// Outcome of AIC stopping along a path
#[derive(Clone, Debug, PartialEq)]
pub struct AicStop<F> {
    /// Selected number of steps, possibly zero
    pub khat: usize,
    /// Rows `g` with `g . y <= u` characterizing the stopping decisions, one per inspected step
    pub gamma: Array2<F>,
    pub u: Array1<F>,
    /// Criterion of the empty model followed by the criterion after every inspected step
    pub aic: Array1<F>,
    /// Whether the criterion stopped improving before the last given step
    pub stopped: bool,
}

impl<F> AicStop<F> {
    /// Number of steps the stopping decision looked at
    pub fn inspected(&self) -> usize {
        self.u.len()
    }
}

/// Stop a forward path once the criterion `RSS + mult sigma^2 df` failed to improve `patience`
/// times in a row
///
/// `actions` are the entering variables in path order and `df[i]` the degrees of freedom before
/// the `i`-th of them entered. The criterion after step `i` compares the least squares fit on the
/// first `i` actions with the fit before that step, which improves exactly when the partial
/// correlation `|x~^T y| / |x~|` of the entering variable exceeds `sqrt(mult) sigma`. Every
/// inspected step contributes that comparison, with the sign of the partial correlation, as a
/// linear constraint on `y`.
///
/// The selected size is the last improving step before a stop, or the number of actions if the
/// criterion never stopped.
pub fn aic_stop<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    actions: &[usize],
    df: &[usize],
    sigma: F,
    mult: F,
    patience: usize,
) -> Result<AicStop<F>> {
    let n = y.len();
    if x.nrows() != n {
        return Err(selinf::Error::MismatchedShapes {
            records: x.nrows(),
            targets: n,
        }
        .into());
    }
    if actions.is_empty() || actions.len() != df.len() {
        return Err(InferenceError::InvalidInput(format!(
            "{} actions with {} degrees of freedom",
            actions.len(),
            df.len()
        )));
    }
    if let Some(&j) = actions.iter().find(|&&j| j >= x.ncols()) {
        return Err(InferenceError::InvalidInput(format!(
            "action {} out of range for {} features",
            j,
            x.ncols()
        )));
    }
    if !sigma.is_finite() || sigma <= F::zero() {
        return Err(InferenceError::InvalidSigma(
            sigma.to_f32().unwrap_or(f32::NAN),
        ));
    }
    if !mult.is_finite() || mult <= F::zero() || patience == 0 {
        return Err(InferenceError::InvalidAicParams);
    }

    let penalty = mult * sigma * sigma;
    let bound = mult.sqrt() * sigma;
    let k = actions.len();

    let mut qr = QrFactor::thin(n);
    let mut aic = Vec::with_capacity(k + 1);
    aic.push(y.dot(y) + penalty * F::cast(df[0]));
    let mut rows: Vec<F> = Vec::with_capacity(k * n);
    let mut u = Vec::with_capacity(k);
    let mut misses = 0;
    let mut stop_at = None;

    for (i, &j) in actions.iter().enumerate() {
        let xj = x.column(j);
        let xtil = qr.residual(&xj);
        let norm = xtil.dot(&xtil).sqrt();
        let s = if xtil.dot(y) >= F::zero() {
            F::one()
        } else {
            -F::one()
        };

        qr.update(&xj)?;
        let resid = qr.residual(y);
        let crit = resid.dot(&resid) + penalty * F::cast(df[i] + 1);

        if crit <= aic[i] {
            // s x~ . y / |x~| >= bound
            rows.extend(xtil.iter().map(|&v| -s * v / norm));
            u.push(-bound);
            misses = 0;
        } else {
            // s x~ . y / |x~| <= bound
            rows.extend(xtil.iter().map(|&v| s * v / norm));
            u.push(bound);
            misses += 1;
        }
        aic.push(crit);

        if misses == patience {
            stop_at = Some(i + 1);
            break;
        }
    }

    let inspected = u.len();
    let (khat, stopped) = match stop_at {
        Some(step) => (step - patience, true),
        None => (k, false),
    };
    debug!(khat, inspected, stopped, "AIC stopping");

    Ok(AicStop {
        khat,
        gamma: Array2::from_shape_vec((inspected, n), rows).map_err(selinf::Error::from)?,
        u: Array1::from(u),
        aic: Array1::from(aic),
        stopped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn forward_stop_extremes() {
        assert_eq!(forward_stop(&Array1::<f64>::zeros(7), 0.1), 7);
        assert_eq!(forward_stop(&Array1::<f64>::ones(7), 0.1), 0);
        assert_eq!(forward_stop(&Array1::<f64>::zeros(0), 0.1), 0);
    }

    #[test]
    fn forward_stop_takes_the_last_admissible_prefix() {
        // running means: 0.01, 0.52, 0.35, 0.27
        let pv = array![
            1.0 - (-0.01f64).exp(),
            1.0 - (-1.03f64).exp(),
            1.0 - (-0.01f64).exp(),
            1.0 - (-0.03f64).exp()
        ];
        assert_eq!(forward_stop(&pv, 0.1), 1);
        assert_eq!(forward_stop(&pv, 0.3), 4);
        assert_eq!(forward_stop(&pv, 0.4), 4);
        assert_eq!(forward_stop(&pv, 0.6), 4);
        assert_eq!(forward_stop(&pv, 0.005), 0);
    }

    #[test]
    fn aic_stop_on_orthogonal_design() {
        // partial correlations are the entries of y
        let x = Array2::<f64>::eye(6);
        let y = array![5.0, -4.0, 0.5, 0.2, 3.0, 0.1];
        let stop = aic_stop(&x, &y, &[0, 1, 2, 3, 4, 5], &[0, 1, 2, 3, 4, 5], 1.0, 2.0, 2).unwrap();

        // improvements at steps 1 and 2, misses at 3 and 4
        assert!(stop.stopped);
        assert_eq!(stop.khat, 2);
        assert_eq!(stop.inspected(), 4);
        assert_abs_diff_eq!(
            stop.aic,
            array![50.3, 27.3, 13.3, 15.05, 17.01],
            epsilon = 1e-10
        );

        // the response satisfies its own stopping event
        let slack = stop.gamma.dot(&y) - &stop.u;
        assert!(slack.iter().all(|&v| v <= 1e-12));
        assert_abs_diff_eq!(stop.u, array![-2f64.sqrt(), -2f64.sqrt(), 2f64.sqrt(), 2f64.sqrt()], epsilon = 1e-12);
        assert_abs_diff_eq!(stop.gamma.row(1).to_owned(), array![0.0, 1.0, 0.0, 0.0, 0.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn aic_without_stop_selects_everything() {
        let x = Array2::<f64>::eye(3);
        let y = array![5.0, -4.0, 3.0];
        let stop = aic_stop(&x, &y, &[0, 1, 2], &[1, 2, 3], 1.0, 2.0, 2).unwrap();
        assert!(!stop.stopped);
        assert_eq!(stop.khat, 3);
        assert_eq!(stop.inspected(), 3);
    }

    #[test]
    fn aic_stop_before_the_first_step() {
        let x = Array2::<f64>::eye(4);
        let y = array![0.5, 0.1, 5.0, 5.0];
        let stop = aic_stop(&x, &y, &[0, 1, 2, 3], &[0, 1, 2, 3], 1.0, 2.0, 2).unwrap();
        assert!(stop.stopped);
        assert_eq!(stop.khat, 0);
    }

    #[test]
    fn aic_stop_rejects_malformed_input() {
        let x = Array2::<f64>::eye(3);
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            aic_stop(&x, &y, &[0, 1], &[0], 1.0, 2.0, 2),
            Err(InferenceError::InvalidInput(_))
        ));
        assert!(matches!(
            aic_stop(&x, &y, &[3], &[0], 1.0, 2.0, 2),
            Err(InferenceError::InvalidInput(_))
        ));
        assert!(matches!(
            aic_stop(&x, &y, &[0], &[0], -1.0, 2.0, 2),
            Err(InferenceError::InvalidSigma(_))
        ));
        assert!(matches!(
            aic_stop(&x, &y, &[0], &[0], 1.0, 2.0, 0),
            Err(InferenceError::InvalidAicParams)
        ));
        assert!(matches!(
            aic_stop(&x, &array![1.0, 2.0], &[0], &[0], 1.0, 2.0, 1),
            Err(InferenceError::BaseCrate(_))
        ));
    }
}
