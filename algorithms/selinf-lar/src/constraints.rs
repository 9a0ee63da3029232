//! Polyhedral description of the selection event of a path
//!
//! Every recorded step appends rows `g` with `g . y <= 0` for the response that produced the
//! path. Rows are only ever appended, `nk[k]` marks how many rows exist once step `k + 1` has
//! been recorded.
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix1};
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
pub struct ConstraintSystem<F> {
    gamma: Array2<F>,
    nk: Vec<usize>,
    mp: Array1<F>,
}

impl<F: Float> ConstraintSystem<F> {
    /// All accumulated rows, one column per sample
    pub fn gamma(&self) -> &Array2<F> {
        &self.gamma
    }

    /// Row counts after each step
    pub fn nk(&self) -> &[usize] {
        &self.nk
    }

    /// Lower truncation bound of each knot used by the spacing test
    pub fn mp(&self) -> &Array1<F> {
        &self.mp
    }

    pub fn nsteps(&self) -> usize {
        self.nk.len()
    }

    /// Rows characterizing the first `step` steps (1-based)
    pub fn rows_through(&self, step: usize) -> Result<ArrayView2<F>> {
        let end = self.row_count(step)?;
        Ok(self.gamma.slice(s![..end, ..]))
    }

    /// Row count once `step` (1-based) has been recorded
    pub fn row_count(&self, step: usize) -> Result<usize> {
        match step {
            0 => Ok(0),
            _ => self
                .nk
                .get(step - 1)
                .copied()
                .ok_or(LarError::InsufficientPath {
                    requested: step,
                    available: self.nsteps(),
                }),
        }
    }

    /// Boundary row of the entering variable at `step` (1-based)
    ///
    /// Its negation `c` satisfies `c . y = lambda_step`.
    pub fn boundary_row(&self, step: usize) -> Result<ArrayView1<F>> {
        if step == 0 {
            return Err(LarError::InvalidInput("steps are counted from 1".into()));
        }
        let end = self.row_count(step)?;
        Ok(self.gamma.row(end - 1))
    }

    /// Largest value of `gamma . y` over all rows, non-positive iff `y` lies in the polyhedron
    pub fn max_violation(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> F {
        self.gamma
            .dot(y)
            .iter()
            .fold(F::neg_infinity(), |acc, &v| acc.max(v))
    }
}

/// Growable row buffer used while the path is computed
#[derive(Debug)]
pub(crate) struct ConstraintBuilder<F> {
    data: Vec<F>,
    ncols: usize,
    nrows: usize,
    nk: Vec<usize>,
    mp: Vec<F>,
}

impl<F: Float> ConstraintBuilder<F> {
    pub fn new(ncols: usize, nfeatures: usize) -> Self {
        ConstraintBuilder {
            data: Vec::with_capacity(ncols * (2 * nfeatures).max(1)),
            ncols,
            nrows: 0,
            nk: Vec::new(),
            mp: Vec::new(),
        }
    }

    /// Append the row `-(g)`, i.e. record the constraint `g . y >= 0`
    pub fn push_nonnegative<I: IntoIterator<Item = F>>(&mut self, g: I) {
        let before = self.data.len();
        self.data.extend(g.into_iter().map(|v| -v));
        debug_assert_eq!(self.data.len() - before, self.ncols);
        self.nrows += 1;
    }

    /// Mark the end of a step
    pub fn close_step(&mut self, mp: F) {
        self.nk.push(self.nrows);
        self.mp.push(mp);
    }

    pub fn finish(self) -> Result<ConstraintSystem<F>> {
        let gamma =
            Array2::from_shape_vec((self.nrows, self.ncols), self.data).map_err(selinf::Error::from)?;
        Ok(ConstraintSystem {
            gamma,
            nk: self.nk,
            mp: Array1::from(self.mp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy() -> ConstraintSystem<f64> {
        let mut builder = ConstraintBuilder::new(2, 2);
        builder.push_nonnegative(vec![1.0, 0.0]);
        builder.push_nonnegative(vec![1.0, 1.0]);
        builder.close_step(0.5);
        builder.push_nonnegative(vec![0.0, 2.0]);
        builder.close_step(0.0);
        builder.finish().unwrap()
    }

    #[test]
    fn rows_are_negated_and_counted() {
        let system = toy();
        assert_eq!(system.gamma(), &array![[-1.0, 0.0], [-1.0, -1.0], [0.0, -2.0]]);
        assert_eq!(system.nk(), &[2, 3]);
        assert_eq!(system.mp(), &array![0.5, 0.0]);
        assert_eq!(system.rows_through(1).unwrap().nrows(), 2);
        assert_eq!(system.boundary_row(2).unwrap(), array![0.0, -2.0]);
    }

    #[test]
    fn containment() {
        let system = toy();
        assert!(system.max_violation(&array![1.0, 1.0]) <= 0.0);
        assert!(system.max_violation(&array![1.0, -1.0]) > 0.0);
    }

    #[test]
    fn steps_beyond_the_path_are_insufficient() {
        let system = toy();
        assert!(matches!(
            system.rows_through(3),
            Err(LarError::InsufficientPath {
                requested: 3,
                available: 2
            })
        ));
        assert!(system.boundary_row(0).is_err());
    }
}
