use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix1, Ix2};
use tracing::debug;

use selinf::{
    dataset::{AsSingleTargets, DatasetBase},
    traits::Fit,
    Float,
};

use crate::{
    constraints::ConstraintBuilder,
    error::{LarError, Result},
    qr::QrFactor,
    LarParams, LarPath, LarValidParams,
};

impl<F, D, T> Fit<ArrayBase<D, Ix2>, T, LarError> for LarValidParams<F>
where
    T: AsSingleTargets<Elem = F>,
    D: Data<Elem = F>,
    F: Float,
{
    type Object = LarPath<F>;

    /// Compute the LAR path of the targets on the records.
    ///
    /// The feature matrix `x` must have shape `(n_samples, n_features)`
    /// The target variable `y` must have shape `(n_samples)`
    ///
    /// Returns a [`LarPath`] holding the knots, entering variables, signs, coefficients and the
    /// polyhedral constraints of the selection event.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        dataset.check_shapes()?;
        let standardized = standardize(
            dataset.records().view(),
            dataset.as_single_targets(),
            self.with_intercept(),
            self.normalize(),
        )?;

        lar_path(standardized, self)
    }
}

/// Compute the LAR path of `y` on `x`
///
/// Shorthand for fitting [`LarParams`] with the given settings. A path stopped by `max_steps` or
/// by a knot below `min_lambda` is reported as incomplete.
pub fn build_path<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    max_steps: usize,
    min_lambda: F,
    with_intercept: bool,
    normalize: bool,
) -> Result<LarPath<F>> {
    LarParams::new()
        .max_steps(max_steps)
        .min_lambda(min_lambda)
        .with_intercept(with_intercept)
        .normalize(normalize)
        .fit(&DatasetBase::new(x.view(), y.view()))
}

/// Centered and scaled copy of a dataset
struct Standardized<F> {
    x: Array2<F>,
    y: Array1<F>,
    bx: Array1<F>,
    by: F,
    sx: Array1<F>,
    with_intercept: bool,
    normalize: bool,
}

/// Center records and targets if an intercept should be used and scale every record column to
/// unit norm if requested.
fn standardize<F: Float>(
    x: ArrayView2<F>,
    y: ArrayView1<F>,
    with_intercept: bool,
    normalize: bool,
) -> Result<Standardized<F>> {
    let (n, p) = x.dim();
    if p == 0 {
        return Err(LarError::InvalidInput("records have no features".into()));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(LarError::InvalidInput(
            "records and targets must be finite".into(),
        ));
    }

    let (bx, by) = if with_intercept {
        let bx = x
            .mean_axis(Axis(0))
            .ok_or(selinf::Error::NotEnoughSamples)?;
        let by = y.mean().ok_or(selinf::Error::NotEnoughSamples)?;
        (bx, by)
    } else {
        (Array1::zeros(p), F::zero())
    };
    let mut x = &x - &bx.view().insert_axis(Axis(0));
    let y = &y - by;

    let sx = if normalize {
        let sx = x.map_axis(Axis(0), |col| col.dot(&col).sqrt());
        if let Some(j) = sx.iter().position(|&s| s <= F::zero()) {
            return Err(LarError::InvalidInput(format!(
                "column {} has zero norm after centering",
                j
            )));
        }
        x /= &sx.view().insert_axis(Axis(0));
        sx
    } else {
        Array1::ones(p)
    };
    debug_assert_eq!(x.nrows(), n);

    Ok(Standardized {
        x,
        y,
        bx,
        by,
        sx,
        with_intercept,
        normalize,
    })
}

fn sign<F: Float>(v: F) -> F {
    if v >= F::zero() {
        F::one()
    } else {
        -F::one()
    }
}

/// Index of the first maximal value, NaNs are never selected
fn first_argmax<F: Float>(values: impl Iterator<Item = F>) -> Option<usize> {
    let mut best: Option<(usize, F)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Largest lower truncation bound of the winning statistic implied by its competitors
///
/// `c` holds one column per candidate with `c_j . y` the hitting time of candidate `j`. A
/// competitor with `1 - ratio <= 0` can never be the tightest bound and is left out.
fn competing_bound<F: Float>(
    c: &ArrayView2<F>,
    winner: usize,
    competitors: &[usize],
    y: &ArrayView1<F>,
) -> F {
    let cw = c.column(winner);
    let cw_norm = cw.dot(&cw);
    let cw_y = cw.dot(y);

    competitors
        .iter()
        .filter(|&&j| j != winner)
        .filter_map(|&j| {
            let cj = c.column(j);
            let ratio = cj.dot(&cw) / cw_norm;
            let denom = F::one() - ratio;
            if denom > F::zero() {
                Some((cj.dot(y) - ratio * cw_y) / denom)
            } else {
                None
            }
        })
        .fold(F::zero(), F::max)
}

/// Compute the least angle regression path of standardized data
///
/// Returns the knots, entering variables and signs, coefficients, constraint system and, for a
/// complete path, the least squares refit.
///
/// References
/// * ["Least Angle Regression", Efron et al.](http://statweb.stanford.edu/~tibs/ftp/lars.pdf)
/// * ["Exact Post-Selection Inference for Sequential Regression Procedures", Tibshirani et al.](https://arxiv.org/abs/1401.3889)
fn lar_path<F: Float>(data: Standardized<F>, params: &LarValidParams<F>) -> Result<LarPath<F>> {
    let x = data.x.view();
    let y = data.y.view();
    let (n, p) = x.dim();

    let max_steps = params.max_steps();
    let max_active = if data.with_intercept { n - 1 } else { n }.min(p);

    let buffer = max_steps.min(p).min(500) + 1;
    let mut lambdas: Vec<F> = Vec::with_capacity(buffer);
    let mut actions: Vec<usize> = Vec::with_capacity(buffer);
    let mut signs: Vec<F> = Vec::with_capacity(buffer);
    let mut df: Vec<usize> = Vec::with_capacity(buffer);
    let mut coefs: Vec<F> = Vec::with_capacity(buffer * p);
    let mut contrasts: Vec<F> = Vec::with_capacity(buffer * n);
    let mut constraints = ConstraintBuilder::new(n, p);

    // first variable to enter and its sign
    let u = x.t().dot(&y);
    let first = first_argmax(u.iter().map(|v| v.abs()))
        .ok_or_else(|| LarError::InvalidInput("correlations are not defined".into()))?;
    let s = sign(u[first]);
    let hit = u[first].abs();
    let xw = x.column(first);

    lambdas.push(hit);
    actions.push(first);
    signs.push(s);
    df.push(0);
    coefs.extend(std::iter::repeat(F::zero()).take(p));
    let xw_norm = xw.dot(&xw);
    contrasts.extend(xw.iter().map(|&v| s * v / xw_norm));

    let others: Vec<usize> = (0..p).filter(|&j| j != first).collect();
    for &j in &others {
        let xj = x.column(j);
        constraints.push_nonnegative(xw.iter().zip(xj.iter()).map(|(&w, &v)| s * w + v));
    }
    for &j in &others {
        let xj = x.column(j);
        constraints.push_nonnegative(xw.iter().zip(xj.iter()).map(|(&w, &v)| s * w - v));
    }
    constraints.push_nonnegative(xw.iter().map(|&w| s * w));
    let signed = &x * &u.mapv(sign).insert_axis(Axis(0));
    constraints.close_step(competing_bound(&signed.view(), first, &others, &y));

    debug!(step = 1, lambda = %hit, variable = first, active = 1, "variable entered the path");

    let mut qr = QrFactor::thin(n);
    qr.update(&xw).map_err(|e| rank_error(e, first))?;
    let mut active = vec![first];
    let mut inactive = others;
    let mut s_active = vec![s];
    // the entering statistic of the previous step, `previous . y = lambda`
    let mut previous: Array1<F> = xw.mapv(|v| s * v);

    let mut step = 2;
    let bls = loop {
        let last = lambdas[lambdas.len() - 1];
        if step > max_steps {
            debug!(max_steps, "reached the maximal number of steps, skipping the rest of the path");
            break None;
        }
        if last < params.min_lambda() {
            debug!(lambda = %last, min_lambda = %params.min_lambda(), "reached the minimal lambda, skipping the rest of the path");
            break None;
        }

        let s_vec = Array1::from(s_active.clone());
        let a = qr.least_squares(&y)?;
        let w = qr.solve_rt(&s_vec)?;
        let b = qr.solve_r(&w)?;

        if active.len() >= max_active || inactive.is_empty() {
            debug!(step, "no inactive variable left, path is complete");
            break Some(scatter(&active, &a, p));
        }

        let x2 = x.select(Axis(1), &inactive);
        let x2perp = qr.project_out(&x2.view());
        let aa = x2perp.t().dot(&y);
        let bb = x2.t().dot(&qr.q1().dot(&w));
        let shits = aa.mapv(sign);
        let denom = &shits - &bb;
        let raw = &aa / &denom;

        // a candidate beyond the current knot cannot enter anymore
        let hits = raw.mapv(|h| if h.is_finite() && h <= last { h } else { F::zero() });
        let winner = match first_argmax(hits.iter().copied()) {
            Some(i) if hits[i] > F::zero() => i,
            _ => {
                debug!(step, "no positive hitting time left, path is complete");
                break Some(scatter(&active, &a, p));
            }
        };
        let hit = hits[winner];
        let shit = shits[winner];
        let entering = inactive[winner];

        lambdas.push(hit);
        actions.push(entering);
        signs.push(shit);
        df.push(active.len());
        let beta = &a - &(&b * hit);
        coefs.extend(scatter(&active, &beta, p).iter().copied());

        let c = &x2perp / &denom.insert_axis(Axis(0));
        let cw = c.column(winner);
        let competitors: Vec<usize> = (0..inactive.len())
            .filter(|&j| raw[j].is_finite() && raw[j] <= last)
            .collect();

        for (j, xj) in x2perp.columns().into_iter().enumerate() {
            let sj = shits[j];
            constraints.push_nonnegative(xj.iter().map(|&v| sj * v));
        }
        for j in 0..inactive.len() {
            if j == winner || !raw[j].is_finite() {
                continue;
            }
            let cj = c.column(j);
            if raw[j] <= last {
                constraints.push_nonnegative(cw.iter().zip(cj.iter()).map(|(&w, &v)| w - v));
            } else {
                constraints
                    .push_nonnegative(cj.iter().zip(previous.iter()).map(|(&v, &l)| v - l));
            }
        }
        constraints.push_nonnegative(cw.iter().copied());
        constraints.close_step(competing_bound(&c.view(), winner, &competitors, &y));

        let xp = x2perp.column(winner);
        let norm = xp.dot(&xp);
        contrasts.extend(xp.iter().map(|&v| shit * v / norm));
        previous = cw.to_owned();

        qr.update(&x.column(entering))
            .map_err(|e| rank_error(e, entering))?;
        active.push(entering);
        s_active.push(shit);
        inactive.remove(winner);

        debug!(step, lambda = %hit, variable = entering, active = active.len(), "variable entered the path");
        step += 1;
    };

    let nsteps = actions.len();
    let completepath = bls.is_some();
    let mut coefs = Array2::from_shape_vec((nsteps, p), coefs)
        .map_err(selinf::Error::from)?
        .reversed_axes();
    let contrasts = Array2::from_shape_vec((nsteps, n), contrasts).map_err(selinf::Error::from)?;
    let mut bls = bls;

    if data.normalize {
        coefs /= &data.sx.view().insert_axis(Axis(1));
        if let Some(bls) = bls.as_mut() {
            *bls /= &data.sx;
        }
    }
    if data.with_intercept {
        df.iter_mut().for_each(|d| *d += 1);
    }

    Ok(LarPath {
        lambdas: Array1::from(lambdas),
        actions,
        signs: Array1::from(signs),
        df,
        coefs,
        constraints: constraints.finish()?,
        contrasts,
        bls,
        completepath,
        x: data.x,
        y: data.y,
        bx: data.bx,
        by: data.by,
        sx: data.sx,
        with_intercept: data.with_intercept,
        normalize: data.normalize,
    })
}

/// Place the active-set coefficients into a vector of all features
fn scatter<F: Float>(active: &[usize], values: &Array1<F>, p: usize) -> Array1<F> {
    let mut out = Array1::zeros(p);
    for (&j, &v) in active.iter().zip(values.iter()) {
        out[j] = v;
    }
    out
}

/// Report rank deficiency with the index of the offending feature
fn rank_error(err: LarError, feature: usize) -> LarError {
    match err {
        LarError::RankDeficiency { .. } => LarError::RankDeficiency { column: feature },
        other => other,
    }
}
