//! Symbolic constraints.

use super::expression::Expression;

/// Relation of a constraint's expression to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `expression <= 0`.
    LessEqual,
    /// `expression == 0`.
    Equal,
}

/// A named symbolic inequality or equality, normalized to `expression ⋈ 0`.
///
/// Constraints are produced by the comparison builders on
/// [`Expression`](super::expression::Expression), by the interpolation
/// conditions of function classes, and by user-supplied initial conditions.
/// The name is purely diagnostic.
#[derive(Debug, Clone)]
pub struct Constraint {
    expression: Expression,
    comparison: Comparison,
    name: String,
}

impl Constraint {
    pub(crate) fn new(expression: Expression, comparison: Comparison) -> Self {
        Self {
            expression,
            comparison,
            name: String::new(),
        }
    }

    /// Attaches a diagnostic label to the constraint.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Diagnostic label, empty if none was attached.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relation of the expression to zero.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Left-hand side of the normalized relation `expression ⋈ 0`.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}
