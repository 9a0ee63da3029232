//! Errors raised while building a least angle regression path
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LarError>;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Error, Debug, Clone)]
pub enum LarError {
    /// Malformed input or hyper-parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The column about to enter lies in the span of the active columns
    #[error("column {column} is linearly dependent on the active columns")]
    RankDeficiency { column: usize },
    /// A quantity was requested beyond the recorded part of the path
    #[error("step {requested} requested but only {available} steps of the path are available")]
    InsufficientPath { requested: usize, available: usize },
    #[error("invalid maximal number of steps")]
    InvalidMaxSteps,
    #[error("invalid minimal lambda {0}")]
    InvalidMinLambda(f32),
    #[error("linear algebra error: {0}")]
    Linalg(String),
    #[error(transparent)]
    #[cfg_attr(feature = "serde", serde(skip))]
    BaseCrate(#[from] selinf::Error),
}

impl From<linfa_linalg::LinalgError> for LarError {
    fn from(err: linfa_linalg::LinalgError) -> Self {
        LarError::Linalg(err.to_string())
    }
}
