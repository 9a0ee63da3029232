//! Utility functions for randomly generating regression problems

use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Distribution, Normal, StandardNormal},
    RandomExt,
};
use selinf::Dataset;

/// Draw an `(n_samples, n_features)` design with i.i.d. standard normal entries.
pub fn gaussian_design(n_samples: usize, n_features: usize, rng: &mut impl Rng) -> Array2<f64> {
    Array::random_using((n_samples, n_features), StandardNormal, rng)
}

/// Center every column and scale it to unit sample standard deviation.
///
/// Constant columns are only centered.
pub fn standardize_columns(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
    let n = x.nrows() as f64;
    let mut out = x.to_owned();
    for mut column in out.axis_iter_mut(Axis(1)) {
        let mean = column.sum() / n;
        column -= mean;
        let sd = (column.dot(&column) / (n - 1.0)).sqrt();
        if sd > 0.0 {
            column /= sd;
        }
    }
    out
}

/// Noise drawn from `distribution` around the mean `x * beta`.
///
/// ## Panics
///
/// If `beta` does not have one entry per column of `x`.
pub fn response_with_distribution(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    beta: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    distribution: impl Distribution<f64>,
    rng: &mut impl Rng,
) -> Array1<f64> {
    assert_eq!(
        x.ncols(),
        beta.len(),
        "one coefficient per design column is required"
    );
    let noise: Array1<f64> = Array::random_using(x.nrows(), distribution, rng);
    x.dot(beta) + noise
}

/// Generate a sparse linear regression problem.
///
/// The design has `n_samples` rows and `beta.len()` column-standardized Gaussian columns, the
/// response is `x * beta + sigma * eps` with standard normal `eps`. Zero entries of `beta` are
/// the null variables.
///
/// ## Panics
///
/// If `sigma` is negative or not finite.
///
/// # Example
/// ```
/// use ndarray::array;
/// use ndarray_rand::rand::{rngs::SmallRng, SeedableRng};
/// use selinf_datasets::generate::sparse_regression;
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let ds = sparse_regression(20, &array![2.0, 0.0, 0.0], 1.0, &mut rng);
/// assert_eq!(ds.records().dim(), (20, 3));
/// ```
pub fn sparse_regression(
    n_samples: usize,
    beta: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    sigma: f64,
    rng: &mut impl Rng,
) -> Dataset<f64> {
    let x = standardize_columns(&gaussian_design(n_samples, beta.len(), rng));
    let noise = Normal::new(0.0, sigma).expect("sigma must be finite and non-negative");
    let y = response_with_distribution(&x, beta, noise, rng);

    Dataset::new(x, y)
}

/// Pure noise response for a fixed design, the global null hypothesis.
///
/// ## Panics
///
/// If `sigma` is negative or not finite.
pub fn null_response(n_samples: usize, sigma: f64, rng: &mut impl Rng) -> Array1<f64> {
    let noise = Normal::new(0.0, sigma).expect("sigma must be finite and non-negative");
    Array::random_using(n_samples, noise, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256Plus};

    #[test]
    fn standardized_columns_have_unit_variance() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let x = standardize_columns(&gaussian_design(40, 5, &mut rng));
        for column in x.axis_iter(Axis(1)) {
            assert_abs_diff_eq!(column.sum(), 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(column.dot(&column) / 39.0, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn zero_noise_reproduces_the_mean() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        let ds = sparse_regression(30, &array![1.5, 0.0, -2.0], 0.0, &mut rng);
        let mean = ds.records().dot(&array![1.5, 0.0, -2.0]);
        assert_abs_diff_eq!(ds.targets(), &mean, epsilon = 1e-12);
    }

    #[test]
    fn constant_column_is_only_centered() {
        let x = array![[1.0, 2.0], [1.0, 4.0], [1.0, 6.0]];
        let s = standardize_columns(&x);
        assert_abs_diff_eq!(s.column(0), array![0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(s.column(1), array![-1.0, 0.0, 1.0], epsilon = 1e-12);
    }

    #[test]
    #[should_panic(expected = "one coefficient per design column is required")]
    fn response_needs_one_coefficient_per_column() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        let x = gaussian_design(10, 3, &mut rng);
        response_with_distribution(&x, &array![1.0, 2.0], StandardNormal, &mut rng);
    }

    #[test]
    #[should_panic]
    fn negative_noise_level_panics() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        null_response(10, -1.0, &mut rng);
    }
}
