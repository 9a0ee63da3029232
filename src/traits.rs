//! Algorithm traits shared by the selinf crates

use std::error::Error;

use crate::dataset::DatasetBase;

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// the least angle regression path of a response on a design matrix.
pub trait Fit<R, T, E: Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E>;
}
