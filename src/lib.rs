//! `selinf` provides the shared building blocks of a small toolkit for selective inference on
//! sparse regression paths.
//!
//! The crate itself only contains the plumbing every algorithm crate relies on:
//!
//! * the [`Float`] bound used for all numeric code,
//! * the [`DatasetBase`] container pairing a design matrix with its response,
//! * the [`Fit`](traits::Fit) trait and the [`ParamGuard`] pattern separating unchecked
//!   hyper-parameters from verified ones,
//! * the base [`Error`](error::Error) type wrapped by the algorithm crates.
//!
//! The algorithms live in their own crates:
//!
//! * `selinf-lar` computes the least angle regression path together with the polyhedral
//!   description of the selection event,
//! * `selinf-inference` turns that description into exact conditional p-values and confidence
//!   intervals, stopping rules and cheaper approximate tests.

pub mod benchmarks;
pub mod dataset;
pub mod error;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float};
pub use error::Error;
pub use param_guard::ParamGuard;
