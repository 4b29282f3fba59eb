//! Symbolic building blocks of a performance estimation problem.
//!
//! [`Point`] and [`Expression`] are the symbolic vectors and scalars that
//! iterates, gradients and function values are written in; [`Function`] is
//! the oracle-recording abstraction whose classes emit interpolation
//! [`Constraint`]s. Generator bookkeeping is private to the crate and lives
//! in the per-problem [`Basis`] registry.

mod basis;
mod constraint;
mod expression;
mod function;
mod point;

pub(crate) use basis::Basis;

pub use constraint::*;
pub use expression::*;
pub use function::*;
pub use point::*;
