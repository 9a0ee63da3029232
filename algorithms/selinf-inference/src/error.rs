//! Errors raised by the inference routines
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

use selinf_lar::LarError;

pub type Result<T> = std::result::Result<T, InferenceError>;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    #[error("noise level should be positive and finite, got {0}")]
    InvalidSigma(f32),
    #[error("significance level should be in (0, 1), got {0}")]
    InvalidAlpha(f32),
    #[error("the number of tested steps should be at least one")]
    InvalidStep,
    #[error("the confidence interval grid needs a positive width and at least two points")]
    InvalidGrid,
    #[error("the AIC penalty should be positive and the patience at least one")]
    InvalidAicParams,
    /// Malformed stand-alone input, for example mismatched dimensions
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The test needs a part of the path that was not computed
    #[error("step {requested} requested but only {available} steps of the path are available")]
    InsufficientPath { requested: usize, available: usize },
    #[error(transparent)]
    Path(#[from] LarError),
    #[error(transparent)]
    #[cfg_attr(feature = "serde", serde(skip))]
    BaseCrate(#[from] selinf::Error),
}
