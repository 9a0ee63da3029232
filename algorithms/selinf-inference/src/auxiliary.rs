//! Approximate tests of the knots of a LAR path
//!
//! These tests only look at the knots and one constraint row per step, which makes them cheap
//! approximations of the exact polyhedral p-values. See Tibshirani et al., "Exact
//! post-selection inference for sequential regression procedures", 2016 (spacing test) and
//! Lockhart et al., "A significance test for the lasso", 2014 (covariance test).
use ndarray::{s, Array1, Axis};
use selinf::Float;
use selinf_lar::{LarPath, QrFactor};

use crate::error::{InferenceError, Result};
use crate::polyhedral::to_f64;
use crate::truncnorm::tnorm_surv;

fn check_step<F: Float>(path: &LarPath<F>, k: usize) -> Result<()> {
    if k == 0 {
        Err(InferenceError::InvalidStep)
    } else if k > path.nsteps() {
        Err(InferenceError::InsufficientPath {
            requested: k,
            available: path.nsteps(),
        })
    } else {
        Ok(())
    }
}

/// Knot following step `k`, zero after the last step of a complete path
fn next_knot<F: Float>(path: &LarPath<F>, k: usize) -> Result<F> {
    if k < path.nsteps() {
        Ok(path.lambdas()[k])
    } else if path.completepath() {
        Ok(F::zero())
    } else {
        Err(InferenceError::InsufficientPath {
            requested: k + 1,
            available: path.nsteps(),
        })
    }
}

/// Survival probability of the knot `lambda_k` truncated to `(lower, lambda_{k-1})`
fn knot_pvalue<F: Float>(path: &LarPath<F>, sigma: F, k: usize, lower: F) -> Result<F> {
    let v = path.constraints().boundary_row(k)?;
    let sd = sigma * v.dot(&v).sqrt();
    let upper = if k == 1 {
        F::infinity()
    } else {
        path.lambdas()[k - 2]
    };

    let pv = tnorm_surv(
        to_f64(path.lambdas()[k - 1]),
        0.0,
        to_f64(sd),
        to_f64(lower),
        to_f64(upper),
    );
    Ok(F::cast(pv))
}

/// Spacing test of step `k` (1-based)
///
/// Treats the knot `lambda_k` as a normal variable truncated to `(mp_k, lambda_{k-1})`, with
/// `lambda_0 = inf`, where `mp_k` is the lower bound the competing variables impose.
pub fn spacing_pvalue<F: Float>(path: &LarPath<F>, sigma: F, k: usize) -> Result<F> {
    check_step(path, k)?;
    knot_pvalue(path, sigma, k, path.constraints().mp()[k - 1])
}

/// Asymptotic version of the spacing test of step `k` (1-based)
///
/// The lower truncation point is the next knot `lambda_{k+1}`, zero after the last step of a
/// complete path. The last step of an incomplete path cannot be tested.
pub fn asymptotic_pvalue<F: Float>(path: &LarPath<F>, sigma: F, k: usize) -> Result<F> {
    check_step(path, k)?;
    let lower = next_knot(path, k)?;
    knot_pvalue(path, sigma, k, lower)
}

/// Covariance test of step `k` (1-based)
///
/// The statistic `C_k lambda_k (lambda_k - lambda_{k+1}) / sigma^2` is compared with an
/// exponential distribution of unit rate, where
/// `C_k = |X_A (X_A^T X_A)^{-1} s_A - X_B (X_B^T X_B)^{-1} s_B|^2` for the active sets `A` after
/// and `B` before step `k` and their signs. At the last step of a complete path the signs of `A`
/// are those of the least squares refit and `lambda_{k+1} = 0`; the last step of an incomplete
/// path cannot be tested.
pub fn covariance_test<F: Float>(path: &LarPath<F>, sigma: F, k: usize) -> Result<F> {
    check_step(path, k)?;
    let lam1 = path.lambdas()[k - 1];
    let lam2 = next_knot(path, k)?;
    let actions = &path.actions()[..k];
    let x = path.x();

    let mut signs: Array1<F> = path.signs().slice(s![..k]).to_owned();
    if k == path.nsteps() {
        if let Some(bls) = path.bls() {
            signs = bls
                .select(Axis(0), actions)
                .mapv(|b| if b >= F::zero() { F::one() } else { -F::one() });
        }
    }

    // X_A (X_A^T X_A)^{-1} s = Q1 R^{-T} s
    let mut qr = QrFactor::thin_from_columns(&x.select(Axis(1), &actions[..k - 1]))?;
    let before = if k > 1 {
        let previous = path.signs().slice(s![..k - 1]);
        qr.q1().dot(&qr.solve_rt(&previous)?)
    } else {
        Array1::zeros(x.nrows())
    };
    qr.update(&x.column(actions[k - 1]))?;
    let after = qr.q1().dot(&qr.solve_rt(&signs)?);

    let diff = after - before;
    let stat = diff.dot(&diff) * lam1 * (lam1 - lam2) / (sigma * sigma);
    Ok((-stat).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncnorm::norm_sf;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use selinf_datasets::generate::sparse_regression;
    use selinf_lar::build_path;

    fn orthogonal_path(max_steps: usize) -> LarPath<f64> {
        build_path(
            &array![[1.0, 0.0], [0.0, 1.0]],
            &array![3.0, 2.0],
            max_steps,
            0.0,
            false,
            false,
        )
        .unwrap()
    }

    #[test]
    fn spacing_on_orthogonal_design() {
        let path = orthogonal_path(10);
        assert_abs_diff_eq!(
            spacing_pvalue(&path, 1.0, 1).unwrap(),
            norm_sf(3.0) / norm_sf(2.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            spacing_pvalue(&path, 1.0, 2).unwrap(),
            (norm_sf(2.0) - norm_sf(3.0)) / (0.5 - norm_sf(3.0)),
            epsilon = 1e-12
        );
        // on an orthogonal design the next knot is the competing bound
        for k in 1..=2 {
            assert_abs_diff_eq!(
                asymptotic_pvalue(&path, 1.0, k).unwrap(),
                spacing_pvalue(&path, 1.0, k).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn covariance_test_on_complete_path() {
        let path = orthogonal_path(10);
        assert!(path.completepath());
        // C = 1 at both steps, lambda_3 = 0 after the last one
        assert_abs_diff_eq!(covariance_test(&path, 1.0, 1).unwrap(), (-3.0f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(covariance_test(&path, 1.0, 2).unwrap(), (-4.0f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(covariance_test(&path, 2.0, 2).unwrap(), (-1.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn last_step_of_incomplete_path() {
        let path = orthogonal_path(1);
        assert!(!path.completepath());
        assert!(spacing_pvalue(&path, 1.0, 1).is_ok());
        assert!(matches!(
            covariance_test(&path, 1.0, 1),
            Err(InferenceError::InsufficientPath {
                requested: 2,
                available: 1
            })
        ));
        assert!(matches!(
            asymptotic_pvalue(&path, 1.0, 1),
            Err(InferenceError::InsufficientPath {
                requested: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn steps_outside_of_the_path() {
        let path = orthogonal_path(10);
        assert!(matches!(
            spacing_pvalue(&path, 1.0, 0),
            Err(InferenceError::InvalidStep)
        ));
        assert!(matches!(
            covariance_test(&path, 1.0, 3),
            Err(InferenceError::InsufficientPath {
                requested: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn pvalues_are_probabilities() {
        let mut rng = Xoshiro256Plus::seed_from_u64(17);
        let ds = sparse_regression(40, &array![3.0, 0.0, 0.0, -2.0, 0.0, 0.0], 1.0, &mut rng);
        let path = build_path(ds.records(), ds.targets(), 100, 0.0, true, true).unwrap();

        for k in 1..=path.nsteps() {
            for pv in [
                spacing_pvalue(&path, 1.0, k).unwrap(),
                asymptotic_pvalue(&path, 1.0, k).unwrap(),
                covariance_test(&path, 1.0, k).unwrap(),
            ] {
                assert!((0.0..=1.0).contains(&pv));
            }
        }
        // the strongest signal enters first with a tiny p-value
        assert!(spacing_pvalue(&path, 1.0, 1).unwrap() < 1e-3);
        assert!(covariance_test(&path, 1.0, 1).unwrap() < 1e-3);
    }
}
