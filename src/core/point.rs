//! Symbolic vectors.

use std::collections::BTreeMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::expression::Expression;

/// A symbolic vector: a sparse linear combination of vector generators.
///
/// Points stand for unknown high-dimensional vectors (iterates, gradients)
/// and are never evaluated during problem construction; numeric coordinates
/// exist only after the semidefinite program has been solved. All arithmetic
/// is pure and produces new points.
///
/// Duplicate generators collapse by summing coefficients and exact zeros are
/// dropped, so two points built through different arithmetic routes compare
/// equal whenever their linear combinations agree. Oracle deduplication
/// relies on this.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    tag: u64,
    coefficients: BTreeMap<usize, f64>,
}

/// Sums `weight` into `map[key]`, removing the entry when it cancels out.
pub(crate) fn accumulate<K: Ord + Copy>(map: &mut BTreeMap<K, f64>, key: K, weight: f64) {
    use std::collections::btree_map::Entry;

    match map.entry(key) {
        Entry::Vacant(entry) => {
            if weight != 0.0 {
                entry.insert(weight);
            }
        }
        Entry::Occupied(mut entry) => {
            let updated = *entry.get() + weight;
            if updated == 0.0 {
                entry.remove();
            } else {
                *entry.get_mut() = updated;
            }
        }
    }
}

/// Combines the problem tags of two operands, panicking on a mismatch.
///
/// Tag `0` marks purely constant objects that belong to no problem.
pub(crate) fn join_tags(a: u64, b: u64) -> u64 {
    if a == 0 {
        return b;
    }
    if b == 0 {
        return a;
    }
    assert_eq!(a, b, "operands belong to different problems");
    a
}

impl Point {
    /// Unit point over a single vector generator.
    pub(crate) fn generator(tag: u64, index: usize) -> Self {
        let mut coefficients = BTreeMap::new();
        coefficients.insert(index, 1.0);

        Self { tag, coefficients }
    }

    /// The zero vector of the given problem.
    pub(crate) fn zero(tag: u64) -> Self {
        Self {
            tag,
            coefficients: BTreeMap::new(),
        }
    }

    pub(crate) fn tag(&self) -> u64 {
        self.tag
    }

    /// Generator indices with their coefficients, in index order.
    pub(crate) fn coefficients(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients.iter().map(|(&index, &weight)| (index, weight))
    }

    /// Squared Euclidean norm as a symbolic scalar.
    pub fn sq(&self) -> Expression {
        inner_product(self, self)
    }

    fn combine(a: &Point, b: &Point, weight: f64) -> Point {
        let tag = join_tags(a.tag, b.tag);
        let mut coefficients = a.coefficients.clone();
        for (&index, &value) in &b.coefficients {
            accumulate(&mut coefficients, index, weight * value);
        }

        Point { tag, coefficients }
    }

    fn scaled(&self, weight: f64) -> Point {
        let coefficients = self
            .coefficients
            .iter()
            .filter(|(_, &value)| weight * value != 0.0)
            .map(|(&index, &value)| (index, weight * value))
            .collect();

        Point {
            tag: self.tag,
            coefficients,
        }
    }
}

/// Inner product of two points, expanded over generator pairs.
///
/// The result is stored over *unordered* generator pairs, so `a * b` and
/// `b * a` have identical representations and a self-product contributes a
/// single diagonal Gram entry.
fn inner_product(a: &Point, b: &Point) -> Expression {
    let tag = join_tags(a.tag, b.tag);
    let mut quadratic = BTreeMap::new();
    for (&i, &ai) in &a.coefficients {
        for (&j, &bj) in &b.coefficients {
            let key = if i <= j { (i, j) } else { (j, i) };
            accumulate(&mut quadratic, key, ai * bj);
        }
    }

    Expression::from_parts(tag, 0.0, BTreeMap::new(), quadratic)
}

macro_rules! impl_binary_op {
    ($Op:ident, $method:ident, $Lhs:ty, $Rhs:ty, $Out:ty, $body:expr) => {
        impl $Op<$Rhs> for $Lhs {
            type Output = $Out;

            fn $method(self, rhs: $Rhs) -> $Out {
                let f: fn(&$Lhs, &$Rhs) -> $Out = $body;
                f(&self, &rhs)
            }
        }

        impl<'a> $Op<&'a $Rhs> for $Lhs {
            type Output = $Out;

            fn $method(self, rhs: &'a $Rhs) -> $Out {
                let f: fn(&$Lhs, &$Rhs) -> $Out = $body;
                f(&self, rhs)
            }
        }

        impl<'a> $Op<$Rhs> for &'a $Lhs {
            type Output = $Out;

            fn $method(self, rhs: $Rhs) -> $Out {
                let f: fn(&$Lhs, &$Rhs) -> $Out = $body;
                f(self, &rhs)
            }
        }

        impl<'a, 'b> $Op<&'b $Rhs> for &'a $Lhs {
            type Output = $Out;

            fn $method(self, rhs: &'b $Rhs) -> $Out {
                let f: fn(&$Lhs, &$Rhs) -> $Out = $body;
                f(self, rhs)
            }
        }
    };
}

pub(crate) use impl_binary_op;

impl_binary_op!(Add, add, Point, Point, Point, |a, b| Point::combine(a, b, 1.0));
impl_binary_op!(Sub, sub, Point, Point, Point, |a, b| Point::combine(a, b, -1.0));
impl_binary_op!(Mul, mul, Point, Point, Expression, |a, b| inner_product(a, b));
impl_binary_op!(Mul, mul, Point, f64, Point, |a: &Point, w: &f64| a.scaled(*w));
impl_binary_op!(Mul, mul, f64, Point, Point, |w: &f64, a: &Point| a.scaled(*w));
impl_binary_op!(Div, div, Point, f64, Point, |a: &Point, w: &f64| a.scaled(1.0 / *w));

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        self.scaled(-1.0)
    }
}

impl Neg for &Point {
    type Output = Point;

    fn neg(self) -> Point {
        self.scaled(-1.0)
    }
}
