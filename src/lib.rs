#![warn(missing_docs)]

//! # Pep
//!
//! A pure Rust engine for computing tight worst-case guarantees of
//! first-order optimization methods through performance estimation
//! problems.
//!
//! A performance estimation problem asks: over *every* function of a given
//! class and every admissible starting state, how badly can a fixed
//! first-order method do after a fixed number of iterations? For a wide
//! range of classes and methods this worst case is the optimal value of a
//! tractable semidefinite program, and the bound it yields is tight: the
//! solver also produces a concrete worst-case instance attaining it.
//!
//! The method under analysis is written against symbolic objects. Points
//! ([`Point`]) stand for unknown vectors such as iterates and gradients,
//! expressions ([`Expression`]) for unknown scalars such as function
//! values, and [`Function`] handles record every oracle call the method
//! makes. Nothing is ever evaluated while the method runs; the recorded
//! trace, the interpolation constraints of the declared function classes
//! (see [`functions`]) and the initial conditions are compiled by [`Pep`]
//! into a semidefinite program over the Gram matrix of all recorded
//! vectors, which the embedded solver (see [`sdp`]) then maximizes.
//!
//! ## Example
//!
//! Worst-case contraction of one gradient step on a smooth strongly convex
//! function, which is known to be `max(|1 - gamma * mu|, |1 - gamma * L|)^2`:
//!
//! ```rust
//! use pep::functions::SmoothStronglyConvex;
//! use pep::steps::gradient_step;
//! use pep::Pep;
//!
//! let mut problem = Pep::new();
//!
//! // f is L-smooth and mu-strongly convex with mu = 0.1 and L = 1.
//! let f = problem.declare_function(SmoothStronglyConvex::new(0.1, 1.0));
//! let (xs, _) = f.stationary_point();
//!
//! // The method starts at most at unit distance from the optimum.
//! let x0 = problem.set_initial_point();
//! problem.set_initial_condition((&x0 - &xs).sq().less_equal(1.0));
//!
//! // One gradient step with step size 1.
//! let (x1, _, _) = gradient_step(&f, &x0, 1.0);
//!
//! problem.set_performance_metric((&x1 - &xs).sq());
//!
//! let solution = problem.solve()?;
//! assert!((solution.value() - 0.81).abs() < 1e-3);
//! # Ok::<(), pep::SolveError>(())
//! ```
//!
//! The returned [`Solution`] also exposes the worst-case instance itself:
//! [`Solution::evaluate`] gives the value of any recorded scalar and
//! [`Solution::point`] concrete coordinates of any recorded vector.
//!
//! ## License
//!
//! Licensed under [MIT](https://opensource.org/licenses/MIT).

mod core;
mod problem;

pub mod functions;
pub mod sdp;
pub mod steps;

pub use crate::core::*;
pub use problem::{Pep, Solution, SolveError};

pub use nalgebra;
