//! Datasets
//!
//! This module implements the dataset struct pairing a design matrix with its response, and the
//! floating point bound used throughout the selinf crates.
use ndarray::{ArrayBase, ArrayView1, Data, Ix1, Ix2, NdFloat, OwnedRepr, ViewRepr};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use crate::error::{Error, Result};

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. Design matrices, responses and every
/// quantity derived from them are generic over it.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + approx::AbsDiffEq<Epsilon = Self>
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// DatasetBase
///
/// A design matrix (`records`) together with the response it should explain (`targets`).
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<R, T> {
    pub records: R,
    pub targets: T,
}

/// Dataset
///
/// An owned design matrix with a single owned response vector.
pub type Dataset<F> = DatasetBase<ArrayBase<OwnedRepr<F>, Ix2>, ArrayBase<OwnedRepr<F>, Ix1>>;

/// DatasetView
///
/// A read only view of a Dataset
pub type DatasetView<'a, F> =
    DatasetBase<ArrayBase<ViewRepr<&'a F>, Ix2>, ArrayBase<ViewRepr<&'a F>, Ix1>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

impl<F: Float, S: Data<Elem = F>> Records for ArrayBase<S, Ix2> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        self.nrows()
    }

    fn nfeatures(&self) -> usize {
        self.ncols()
    }
}

/// Return a view on a single target variable
pub trait AsSingleTargets {
    type Elem;

    fn as_single_targets(&self) -> ArrayView1<Self::Elem>;
}

impl<F: Float, S: Data<Elem = F>> AsSingleTargets for ArrayBase<S, Ix1> {
    type Elem = F;

    fn as_single_targets(&self) -> ArrayView1<F> {
        self.view()
    }
}

impl<R, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase { records, targets }
    }

    /// Return references to the records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Return references to the targets
    pub fn targets(&self) -> &T {
        &self.targets
    }
}

impl<R: Records, T: AsSingleTargets<Elem = R::Elem>> DatasetBase<R, T> {
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }

    pub fn as_single_targets(&self) -> ArrayView1<R::Elem> {
        self.targets.as_single_targets()
    }

    /// Check that every record has exactly one target and that there is at least one sample
    pub fn check_shapes(&self) -> Result<()> {
        let targets = self.targets.as_single_targets().len();
        if self.records.nsamples() != targets {
            return Err(Error::MismatchedShapes {
                records: self.records.nsamples(),
                targets,
            });
        }
        if targets == 0 {
            return Err(Error::NotEnoughSamples);
        }
        Ok(())
    }
}
