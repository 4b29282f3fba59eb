//! Semidefinite programming layer.
//!
//! The problem compiler lowers a performance estimation problem into the
//! numeric [`SdpProblem`] form defined here: linear forms over the entries
//! of a positive semidefinite Gram matrix and a vector of free scalars,
//! with the objective of maximizing the smallest of the performance
//! metrics. Solving is behind the [`SdpSolver`] trait; the bundled backend
//! is [`Admm`].

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

mod admm;

pub use admm::{Admm, AdmmOptions};

/// Affine function of the Gram matrix entries and the scalar vector.
///
/// Represents `constant + sum scalars + sum gram` where the Gram terms are
/// indexed by unordered entry pairs `(i, j)` with `i <= j` and stand for
/// `weight * G[i, j]`.
#[derive(Debug, Clone, Default)]
pub struct LinearForm {
    /// Constant offset.
    pub constant: f64,
    /// Weighted scalar-vector entries.
    pub scalars: Vec<(usize, f64)>,
    /// Weighted Gram-matrix entries with `i <= j`.
    pub gram: Vec<(usize, usize, f64)>,
}

/// Relation of an [`SdpConstraint`]'s form to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpComparison {
    /// `form <= 0`.
    LessEqual,
    /// `form == 0`.
    Equal,
}

/// One scalar constraint of the semidefinite program.
#[derive(Debug, Clone)]
pub struct SdpConstraint {
    /// Constrained affine form.
    pub form: LinearForm,
    /// Relation of the form to zero.
    pub comparison: SdpComparison,
}

/// Numeric semidefinite program produced by the problem compiler.
///
/// The decision variables are a `gram_dim x gram_dim` positive semidefinite
/// matrix and `scalar_dim` free scalars. The objective is to maximize the
/// minimum of the `objectives` forms subject to the constraints.
#[derive(Debug, Clone)]
pub struct SdpProblem {
    /// Side length of the Gram matrix.
    pub gram_dim: usize,
    /// Length of the scalar vector.
    pub scalar_dim: usize,
    /// Scalar constraints.
    pub constraints: Vec<SdpConstraint>,
    /// Performance metric forms; the objective maximizes their minimum.
    pub objectives: Vec<LinearForm>,
}

/// Primal solution of an [`SdpProblem`].
#[derive(Debug, Clone)]
pub struct SdpSolution {
    /// Attained objective value.
    pub objective: f64,
    /// Gram matrix at the optimum.
    pub gram: DMatrix<f64>,
    /// Scalar vector at the optimum.
    pub scalars: DVector<f64>,
}

/// Failure of a semidefinite solve.
#[derive(Debug, Error)]
pub enum SdpError {
    /// The constraints admit no feasible point.
    #[error("problem is infeasible")]
    Infeasible,
    /// The objective grows without bound over the feasible set.
    #[error("problem is unbounded")]
    Unbounded,
    /// The solver stopped before reaching the required accuracy.
    #[error("solver did not converge: {0}")]
    Interrupted(String),
}

/// Common interface of semidefinite backends.
pub trait SdpSolver {
    /// Name of the solver used in logs.
    const NAME: &'static str;

    /// Error while solving.
    type Error;

    /// Solves the program, returning the primal optimum.
    fn solve(&mut self, problem: &SdpProblem) -> Result<SdpSolution, Self::Error>;
}
