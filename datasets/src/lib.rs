//! `selinf-datasets` provides synthetic regression problems used in the tests, examples and
//! benchmarks of the selinf crates.
//!
//! ## The Big Picture
//!
//! Selective inference is easiest to validate on data whose generating process is known: a
//! Gaussian design, a sparse coefficient vector and Gaussian noise of known scale. The
//! [`generate`] module builds such problems from a caller-provided random number generator, so
//! every test stays reproducible.
//!
//! ## Using a generator
//!
//! ```ignore
//! use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256Plus};
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let beta = ndarray::array![3.0, -2.0, 0.0, 0.0];
//! let dataset = selinf_datasets::generate::sparse_regression(50, &beta, 1.0, &mut rng);
//! ```

pub mod generate;
