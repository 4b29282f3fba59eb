//! Oracle-recording function abstraction.
//!
//! A [`Function`] does not evaluate anything. It records the first-order
//! oracle calls made while an algorithm is being described and later emits
//! the finite set of interpolation constraints that characterizes
//! membership in its function class. Concrete classes live in
//! [`functions`](crate::functions) and implement [`FunctionClass`];
//! algebraic combinations of functions are built with `+`, `-`, `*` and `/`
//! and contribute no constraints of their own.
//!
//! Combinations flatten eagerly into a weighted list of leaf functions, so
//! the decomposition structure is acyclic by construction and constraint
//! collection is a plain walk over leaves.

use std::cell::RefCell;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use super::basis::Basis;
use super::constraint::Constraint;
use super::expression::Expression;
use super::point::{impl_binary_op, Point};

/// One recorded oracle triple of a function.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Point at which the oracle was queried.
    pub point: Point,
    /// Recorded (sub)gradient at the point.
    pub gradient: Point,
    /// Recorded function value at the point.
    pub value: Expression,
}

/// Behavior of a concrete function class.
///
/// Implementing this trait is all that is needed to add a new class; the
/// problem compiler never needs to change. The oracle-recording machinery
/// is shared and lives in [`Function`].
pub trait FunctionClass: Debug {
    /// Short class name used in logs.
    fn name(&self) -> &'static str;

    /// Whether repeated oracle calls at an already-seen point return the
    /// recorded pair instead of allocating fresh generators.
    ///
    /// Differentiable classes reuse their gradient; nonsmooth classes take
    /// a fresh subgradient on every call.
    fn reuse_gradient(&self) -> bool;

    /// Interpolation constraints characterizing class membership, given all
    /// recorded samples.
    fn class_constraints(&self, samples: &[Sample]) -> Vec<Constraint>;
}

#[derive(Debug)]
enum Definition {
    Leaf(Box<dyn FunctionClass>),
    Combination(Vec<(Function, f64)>),
}

#[derive(Debug)]
struct Inner {
    basis: Basis,
    definition: Definition,
    reuse_gradient: bool,
    samples: Vec<Sample>,
}

/// Handle to a function declared within a problem.
///
/// The handle is cheap to clone and shares the recorded samples; oracle
/// calls mutate the shared record. Leaf functions are created through
/// [`Pep::declare_function`](crate::Pep::declare_function), combinations
/// through arithmetic on handles.
#[derive(Debug, Clone)]
pub struct Function {
    inner: Rc<RefCell<Inner>>,
}

impl Function {
    pub(crate) fn leaf(basis: Basis, class: Box<dyn FunctionClass>) -> Self {
        let reuse_gradient = class.reuse_gradient();

        Self {
            inner: Rc::new(RefCell::new(Inner {
                basis,
                definition: Definition::Leaf(class),
                reuse_gradient,
                samples: Vec::new(),
            })),
        }
    }

    fn combination(components: Vec<(Function, f64)>) -> Self {
        assert!(
            !components.is_empty(),
            "combination of functions has no components"
        );

        let basis = components[0].0.basis();
        let reuse_gradient = components
            .iter()
            .all(|(function, _)| function.reuses_gradient());

        Self {
            inner: Rc::new(RefCell::new(Inner {
                basis,
                definition: Definition::Combination(components),
                reuse_gradient,
                samples: Vec::new(),
            })),
        }
    }

    /// Whether this function is defined from scratch rather than as a
    /// combination of other functions.
    pub fn is_leaf(&self) -> bool {
        matches!(self.inner.borrow().definition, Definition::Leaf(_))
    }

    /// Whether repeated oracle calls at one point reuse the recorded pair.
    ///
    /// For combinations this holds exactly if it holds for every leaf.
    pub fn reuses_gradient(&self) -> bool {
        self.inner.borrow().reuse_gradient
    }

    /// Number of interpolation samples recorded so far.
    pub fn sample_count(&self) -> usize {
        self.inner.borrow().samples.len()
    }

    pub(crate) fn basis(&self) -> Basis {
        self.inner.borrow().basis.clone()
    }

    pub(crate) fn same_identity(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn class_name(&self) -> &'static str {
        match &self.inner.borrow().definition {
            Definition::Leaf(class) => class.name(),
            Definition::Combination(_) => "combination",
        }
    }

    /// First-order oracle.
    ///
    /// Returns a (sub)gradient and the function value at `point`. For a
    /// fresh point this allocates exactly one vector generator and one
    /// scalar generator (per leaf, for combinations); if the point was
    /// queried before and the class reuses gradients, the recorded pair is
    /// returned instead.
    pub fn oracle(&self, point: &Point) -> (Point, Expression) {
        let basis = self.basis();
        assert_eq!(
            point.tag(),
            basis.tag(),
            "point belongs to a different problem"
        );

        if self.reuses_gradient() {
            if let Some(recorded) = self.find_sample(point) {
                return recorded;
            }
        }

        let (gradient, value) = if self.is_leaf() {
            (basis.vector_point(), basis.scalar_expression())
        } else {
            let mut gradient = Point::zero(basis.tag());
            let mut value = Expression::constant(0.0);
            for (function, weight) in self.components() {
                let (g, v) = function.oracle(point);
                gradient = gradient + weight * g;
                value = value + weight * v;
            }
            (gradient, value)
        };

        self.push_sample(point, &gradient, &value);
        (gradient, value)
    }

    /// Records an externally constructed interpolation triple.
    ///
    /// On a leaf the triple is stored as-is. On a combination, every
    /// component except the last is queried through its own oracle and the
    /// last component absorbs the remainder, so that the weighted sums of
    /// component gradients and values reproduce `gradient` and `value`.
    pub fn register_sample(&self, point: &Point, gradient: &Point, value: &Expression) {
        let basis = self.basis();
        assert_eq!(
            point.tag(),
            basis.tag(),
            "point belongs to a different problem"
        );

        if self.is_leaf() {
            self.push_sample(point, gradient, value);
            return;
        }

        let components = self.components();
        // Combinations always have at least one component.
        let (last, rest) = components.split_last().unwrap();

        let mut gradient_rest = gradient.clone();
        let mut value_rest = value.clone();
        for (function, weight) in rest {
            let (g, v) = function.oracle(point);
            gradient_rest = gradient_rest - *weight * g;
            value_rest = value_rest - *weight * v;
        }

        let (function, weight) = last;
        function.register_sample(point, &(&gradient_rest / *weight), &(&value_rest / *weight));

        self.push_sample(point, gradient, value);
    }

    /// Records a fresh point whose (sub)gradient is `gradient`.
    ///
    /// This is the oracle "run backwards": mirror and proximal machinery
    /// knows the gradient of the new iterate before the iterate itself.
    /// Returns the new point together with its fresh function value.
    pub fn inverse_oracle(&self, gradient: &Point) -> (Point, Expression) {
        let basis = self.basis();
        let point = basis.vector_point();
        let value = basis.scalar_expression();
        self.register_sample(&point, gradient, &value);

        (point, value)
    }

    /// Records a sample whose point is defined in terms of its own fresh
    /// (sub)gradient.
    ///
    /// `position` receives the fresh gradient and must return the point at
    /// which it is attained. Returns `(point, gradient, value)`.
    pub fn implicit_oracle(
        &self,
        position: impl FnOnce(&Point) -> Point,
    ) -> (Point, Point, Expression) {
        let basis = self.basis();
        let gradient = basis.vector_point();
        let value = basis.scalar_expression();
        let point = position(&gradient);
        assert_eq!(
            point.tag(),
            basis.tag(),
            "point belongs to a different problem"
        );
        self.register_sample(&point, &gradient, &value);

        (point, gradient, value)
    }

    /// Records a fresh point with zero (sub)gradient.
    ///
    /// Models an optimal point of the function. Returns the point and its
    /// fresh function value.
    pub fn stationary_point(&self) -> (Point, Expression) {
        let basis = self.basis();
        let point = basis.vector_point();
        let value = basis.scalar_expression();
        let zero = Point::zero(basis.tag());
        self.register_sample(&point, &zero, &value);

        (point, value)
    }

    /// Interpolation constraints of this function.
    ///
    /// Combinations contribute none; their semantics are carried entirely
    /// by the leaves.
    pub(crate) fn class_constraints(&self) -> Vec<Constraint> {
        let inner = self.inner.borrow();
        match &inner.definition {
            Definition::Leaf(class) => class.class_constraints(&inner.samples),
            Definition::Combination(_) => Vec::new(),
        }
    }

    fn components(&self) -> Vec<(Function, f64)> {
        match &self.inner.borrow().definition {
            Definition::Leaf(_) => Vec::new(),
            Definition::Combination(components) => components.clone(),
        }
    }

    fn find_sample(&self, point: &Point) -> Option<(Point, Expression)> {
        self.inner
            .borrow()
            .samples
            .iter()
            .find(|sample| sample.point == *point)
            .map(|sample| (sample.gradient.clone(), sample.value.clone()))
    }

    fn push_sample(&self, point: &Point, gradient: &Point, value: &Expression) {
        self.inner.borrow_mut().samples.push(Sample {
            point: point.clone(),
            gradient: gradient.clone(),
            value: value.clone(),
        });
    }

    fn flatten_into(accumulator: &mut Vec<(Function, f64)>, function: &Function, weight: f64) {
        if weight == 0.0 {
            return;
        }
        match &function.inner.borrow().definition {
            Definition::Leaf(_) => {
                if let Some(entry) = accumulator
                    .iter_mut()
                    .find(|(known, _)| known.same_identity(function))
                {
                    entry.1 += weight;
                    if entry.1 == 0.0 {
                        accumulator.retain(|(_, w)| *w != 0.0);
                    }
                    return;
                }
                accumulator.push((function.clone(), weight));
            }
            Definition::Combination(components) => {
                for (component, component_weight) in components {
                    Self::flatten_into(accumulator, component, weight * component_weight);
                }
            }
        }
    }

    fn combine(a: &Function, a_weight: f64, b: &Function, b_weight: f64) -> Function {
        assert_eq!(
            a.basis().tag(),
            b.basis().tag(),
            "functions belong to different problems"
        );

        let mut components = Vec::new();
        Self::flatten_into(&mut components, a, a_weight);
        Self::flatten_into(&mut components, b, b_weight);
        Function::combination(components)
    }

    fn scaled(&self, weight: f64) -> Function {
        let mut components = Vec::new();
        Self::flatten_into(&mut components, self, weight);
        Function::combination(components)
    }
}

impl_binary_op!(Add, add, Function, Function, Function, |a, b| {
    Function::combine(a, 1.0, b, 1.0)
});
impl_binary_op!(Sub, sub, Function, Function, Function, |a, b| {
    Function::combine(a, 1.0, b, -1.0)
});
impl_binary_op!(Mul, mul, Function, f64, Function, |a: &Function, w: &f64| a.scaled(*w));
impl_binary_op!(Mul, mul, f64, Function, Function, |w: &f64, a: &Function| a.scaled(*w));
impl_binary_op!(Div, div, Function, f64, Function, |a: &Function, w: &f64| {
    a.scaled(1.0 / *w)
});

impl Neg for Function {
    type Output = Function;

    fn neg(self) -> Function {
        self.scaled(-1.0)
    }
}

impl Neg for &Function {
    type Output = Function;

    fn neg(self) -> Function {
        self.scaled(-1.0)
    }
}
