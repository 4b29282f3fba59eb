//! Symbolic scalars.

use std::collections::BTreeMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::constraint::{Comparison, Constraint};
use super::point::{accumulate, impl_binary_op, join_tags};

/// A symbolic scalar: an affine combination of scalar generators plus a
/// quadratic part over Gram-matrix entries.
///
/// The linear part maps scalar-generator indices (function-value samples) to
/// coefficients. The quadratic part maps unordered vector-generator pairs
/// `(i, j)` with `i <= j` to coefficients and represents inner products of
/// points; it is only ever produced by multiplying already-constructed
/// points, never by touching generators directly.
///
/// Like [`Point`](super::point::Point), expressions are immutable values
/// with no numeric meaning until the problem is solved.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    tag: u64,
    constant: f64,
    linear: BTreeMap<usize, f64>,
    quadratic: BTreeMap<(usize, usize), f64>,
}

impl Expression {
    /// A constant scalar, attached to no particular problem.
    pub fn constant(value: f64) -> Self {
        Self {
            tag: 0,
            constant: value,
            linear: BTreeMap::new(),
            quadratic: BTreeMap::new(),
        }
    }

    /// Unit expression over a single scalar generator.
    pub(crate) fn scalar_generator(tag: u64, index: usize) -> Self {
        let mut linear = BTreeMap::new();
        linear.insert(index, 1.0);

        Self {
            tag,
            constant: 0.0,
            linear,
            quadratic: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        tag: u64,
        constant: f64,
        linear: BTreeMap<usize, f64>,
        quadratic: BTreeMap<(usize, usize), f64>,
    ) -> Self {
        Self {
            tag,
            constant,
            linear,
            quadratic,
        }
    }

    pub(crate) fn tag(&self) -> u64 {
        self.tag
    }

    pub(crate) fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Scalar-generator indices with their coefficients, in index order.
    pub(crate) fn linear_terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.linear.iter().map(|(&index, &weight)| (index, weight))
    }

    /// Gram entries `(i, j)` with `i <= j` and their coefficients.
    pub(crate) fn quadratic_terms(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.quadratic.iter().map(|(&pair, &weight)| (pair, weight))
    }

    /// Constraint `self <= rhs`.
    pub fn less_equal(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self - rhs.into(), Comparison::LessEqual)
    }

    /// Constraint `self >= rhs`.
    pub fn greater_equal(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(rhs.into() - self, Comparison::LessEqual)
    }

    /// Constraint `self == rhs`.
    pub fn equal(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self - rhs.into(), Comparison::Equal)
    }

    fn combine(a: &Expression, b: &Expression, weight: f64) -> Expression {
        let tag = join_tags(a.tag, b.tag);
        let mut linear = a.linear.clone();
        let mut quadratic = a.quadratic.clone();
        for (&index, &value) in &b.linear {
            accumulate(&mut linear, index, weight * value);
        }
        for (&pair, &value) in &b.quadratic {
            accumulate(&mut quadratic, pair, weight * value);
        }

        Expression {
            tag,
            constant: a.constant + weight * b.constant,
            linear,
            quadratic,
        }
    }

    fn scaled(&self, weight: f64) -> Expression {
        let linear = self
            .linear
            .iter()
            .filter(|(_, &value)| weight * value != 0.0)
            .map(|(&index, &value)| (index, weight * value))
            .collect();
        let quadratic = self
            .quadratic
            .iter()
            .filter(|(_, &value)| weight * value != 0.0)
            .map(|(&pair, &value)| (pair, weight * value))
            .collect();

        Expression {
            tag: self.tag,
            constant: weight * self.constant,
            linear,
            quadratic,
        }
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value)
    }
}

impl_binary_op!(Add, add, Expression, Expression, Expression, |a, b| {
    Expression::combine(a, b, 1.0)
});
impl_binary_op!(Sub, sub, Expression, Expression, Expression, |a, b| {
    Expression::combine(a, b, -1.0)
});
impl_binary_op!(Mul, mul, Expression, f64, Expression, |a: &Expression, w: &f64| a.scaled(*w));
impl_binary_op!(Mul, mul, f64, Expression, Expression, |w: &f64, a: &Expression| a.scaled(*w));
impl_binary_op!(Div, div, Expression, f64, Expression, |a: &Expression, w: &f64| {
    a.scaled(1.0 / *w)
});

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.scaled(-1.0)
    }
}

impl Neg for &Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.scaled(-1.0)
    }
}
