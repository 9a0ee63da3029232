//! Incrementally maintained QR factorization of the active columns
//!
//! `q1` spans the active columns and `active columns = q1 * r` with `r` upper triangular.
//! A full factorization also keeps `q2`, an orthonormal basis of the orthogonal complement in
//! the sample space, so that `[q1 q2]` is square. Adding or removing one column only touches a
//! few Givens rotations instead of factoring the active set from scratch.
//!
//! Least squares refits and the path itself only ever need `q1`. The thin factorization drops
//! the complement, grows `q1` by Gram-Schmidt with one reorthogonalization pass and costs
//! `O(n r)` per added column and `O(n r)` memory.
use ndarray::{concatenate, s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2};
use linfa_linalg::triangular::{SolveTriangularInplace, UPLO};
use selinf::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{LarError, Result};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct QrFactor<F> {
    q1: Array2<F>,
    q2: Option<Array2<F>>,
    r: Array2<F>,
}

/// Rotation `[c s; -s c]` mapping `(a, b)` onto `(rho, 0)`
fn givens<F: Float>(a: F, b: F) -> (F, F, F) {
    if b == F::zero() {
        return (F::one(), F::zero(), a);
    }
    let rho = a.hypot(b);
    (a / rho, b / rho, rho)
}

/// Apply the rotation to the columns `i` and `j` of `m`, i.e. `m <- m * G^T`
fn rotate_columns<F: Float>(m: &mut Array2<F>, i: usize, j: usize, c: F, s: F) {
    let (mut left, mut right) = m.multi_slice_mut((s![.., i], s![.., j]));
    for (u, v) in left.iter_mut().zip(right.iter_mut()) {
        let (a, b) = (*u, *v);
        *u = c * a + s * b;
        *v = c * b - s * a;
    }
}

/// A new direction is rejected when its component outside the span is this small
fn is_dependent<F: Float>(diag: F, norm: F) -> bool {
    norm == F::zero() || diag.abs() <= F::epsilon().sqrt() * norm
}

/// New unit direction and `r` diagonal entry from rotating the complement onto `column`
///
/// The first column of the rotated complement is split off on success.
fn split_complement<F: Float>(
    q2: &mut Array2<F>,
    column: &ArrayBase<impl Data<Elem = F>, Ix1>,
    rank: usize,
) -> Result<(Array1<F>, F)> {
    let m = q2.ncols();
    if m == 0 {
        return Err(LarError::RankDeficiency { column: rank });
    }

    let mut w = q2.t().dot(column);
    for i in (0..m - 1).rev() {
        let (c, s, rho) = givens(w[i], w[i + 1]);
        w[i] = rho;
        w[i + 1] = F::zero();
        rotate_columns(q2, i, i + 1, c, s);
    }

    let mut diag = w[0];
    if is_dependent(diag, column.dot(column).sqrt()) {
        return Err(LarError::RankDeficiency { column: rank });
    }

    let mut direction = q2.column(0).to_owned();
    if diag < F::zero() {
        diag = -diag;
        direction.mapv_inplace(|v| -v);
    }
    *q2 = q2.slice(s![.., 1..]).to_owned();

    Ok((direction, diag))
}

/// New unit direction and `r` diagonal entry by Gram-Schmidt against `q1`
fn orthogonalize<F: Float>(
    q1: &Array2<F>,
    column: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<(Array1<F>, F)> {
    let rank = q1.ncols();
    if rank == q1.nrows() {
        return Err(LarError::RankDeficiency { column: rank });
    }

    let mut w = column - &q1.dot(&q1.t().dot(column));
    // a second pass removes what cancellation left in the span
    let again = q1.dot(&q1.t().dot(&w));
    w -= &again;

    let diag = w.dot(&w).sqrt();
    if is_dependent(diag, column.dot(column).sqrt()) {
        return Err(LarError::RankDeficiency { column: rank });
    }
    w.mapv_inplace(|v| v / diag);

    Ok((w, diag))
}

impl<F: Float> QrFactor<F> {
    /// Factorization of an empty set of columns in a sample space of dimension `nrows`
    ///
    /// Keeps the complement basis `q2`, which starts as the `nrows x nrows` identity.
    pub fn new(nrows: usize) -> QrFactor<F> {
        QrFactor {
            q1: Array2::zeros((nrows, 0)),
            q2: Some(Array2::eye(nrows)),
            r: Array2::zeros((0, 0)),
        }
    }

    /// Factorization of an empty set of columns without the complement basis
    pub fn thin(nrows: usize) -> QrFactor<F> {
        QrFactor {
            q1: Array2::zeros((nrows, 0)),
            q2: None,
            r: Array2::zeros((0, 0)),
        }
    }

    /// Factorize the columns of `x` by adding them one after another
    ///
    /// Returns [`RankDeficiency`](LarError::RankDeficiency) with the offending column index if
    /// the columns are linearly dependent.
    pub fn from_columns(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<QrFactor<F>> {
        QrFactor::new(x.nrows()).extend(x)
    }

    /// Thin factorization of the columns of `x`, for least squares refits
    pub fn thin_from_columns(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<QrFactor<F>> {
        QrFactor::thin(x.nrows()).extend(x)
    }

    fn extend(mut self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<QrFactor<F>> {
        for column in x.columns() {
            self.update(&column)?;
        }
        Ok(self)
    }

    /// Number of factored columns
    pub fn rank(&self) -> usize {
        self.r.nrows()
    }

    pub fn nrows(&self) -> usize {
        self.q1.nrows()
    }

    /// Orthonormal basis of the factored columns, `n x r`
    pub fn q1(&self) -> &Array2<F> {
        &self.q1
    }

    /// Orthonormal basis of the orthogonal complement, `n x (n - r)`, absent when thin
    pub fn q2(&self) -> Option<&Array2<F>> {
        self.q2.as_ref()
    }

    /// Upper triangular factor, `r x r`
    pub fn r(&self) -> &Array2<F> {
        &self.r
    }

    /// Append `column` to the factorization
    ///
    /// A full factorization expresses the column in the complement basis `q2`, rotates it onto
    /// its first direction and promotes that direction into `q1`, costing `O(n (n - r))`. A thin
    /// one orthogonalizes against `q1` in `O(n r)`. On failure the factored columns are
    /// unchanged.
    pub fn update(&mut self, column: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<()> {
        let rank = self.rank();
        if column.len() != self.nrows() {
            return Err(LarError::InvalidInput(format!(
                "column of length {} added to a factorization with {} rows",
                column.len(),
                self.nrows()
            )));
        }

        let (direction, diag) = match self.q2.as_mut() {
            Some(q2) => split_complement(q2, column, rank)?,
            None => orthogonalize(&self.q1, column)?,
        };

        let mut r = Array2::zeros((rank + 1, rank + 1));
        r.slice_mut(s![..rank, ..rank]).assign(&self.r);
        r.slice_mut(s![..rank, rank]).assign(&self.q1.t().dot(column));
        r[[rank, rank]] = diag;

        self.q1 = concatenate![Axis(1), self.q1, direction.insert_axis(Axis(1))];
        self.r = r;

        Ok(())
    }

    /// Remove the factored column at `position`
    ///
    /// Dropping a column leaves `r` upper Hessenberg from `position` on; Givens rotations on
    /// consecutive rows restore the triangle. The direction freed at the end of `q1` is demoted
    /// to the front of `q2`, or discarded by a thin factorization.
    pub fn downdate(&mut self, position: usize) -> Result<()> {
        let rank = self.rank();
        if position >= rank {
            return Err(LarError::InvalidInput(format!(
                "cannot remove column {} from a factorization of rank {}",
                position, rank
            )));
        }

        let mut h = concatenate![
            Axis(1),
            self.r.slice(s![.., ..position]),
            self.r.slice(s![.., position + 1..])
        ];
        for j in position..rank - 1 {
            let (c, s, _) = givens(h[[j, j]], h[[j + 1, j]]);
            let (mut upper, mut lower) = h.multi_slice_mut((s![j, ..], s![j + 1, ..]));
            for (u, v) in upper.iter_mut().zip(lower.iter_mut()) {
                let (a, b) = (*u, *v);
                *u = c * a + s * b;
                *v = c * b - s * a;
            }
            h[[j + 1, j]] = F::zero();
            rotate_columns(&mut self.q1, j, j + 1, c, s);
        }

        if let Some(q2) = self.q2.take() {
            let freed = self.q1.slice(s![.., rank - 1..]);
            self.q2 = Some(concatenate![Axis(1), freed, q2]);
        }
        self.q1 = self.q1.slice(s![.., ..rank - 1]).to_owned();
        self.r = h.slice(s![..rank - 1, ..]).to_owned();

        Ok(())
    }

    /// `r^{-1} b`
    pub fn solve_r(&self, b: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let mut rhs = b.to_owned().insert_axis(Axis(1));
        self.r.solve_triangular_inplace(&mut rhs, UPLO::Upper)?;
        Ok(rhs.remove_axis(Axis(1)))
    }

    /// `r^{-T} b`
    pub fn solve_rt(&self, b: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let mut rhs = b.to_owned().insert_axis(Axis(1));
        self.r.t().solve_triangular_inplace(&mut rhs, UPLO::Lower)?;
        Ok(rhs.remove_axis(Axis(1)))
    }

    /// Least squares coefficients of `y` on the factored columns, `r^{-1} q1^T y`
    pub fn least_squares(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        self.solve_r(&self.q1.t().dot(y))
    }

    /// Residual of `y` after projection onto the factored columns
    pub fn residual(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        y - &self.q1.dot(&self.q1.t().dot(y))
    }

    /// Residuals of every column of `x` after projection onto the factored columns
    pub fn project_out(&self, x: &ArrayView2<F>) -> Array2<F> {
        x - &self.q1.dot(&self.q1.t().dot(x))
    }

    /// Rows of the pseudo-inverse `(X^T X)^{-1} X^T = r^{-1} q1^T` of the factored columns
    pub fn pseudo_inverse(&self) -> Result<Array2<F>> {
        let mut rhs = self.q1.t().to_owned();
        self.r.solve_triangular_inplace(&mut rhs, UPLO::Upper)?;
        Ok(rhs)
    }
}
