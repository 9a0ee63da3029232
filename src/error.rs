//! Error types in selinf
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("records have {records} samples but targets have {targets}")]
    MismatchedShapes { records: usize, targets: usize },
    #[error("not enough samples to compute the mean")]
    NotEnoughSamples,
}
