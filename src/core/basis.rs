//! Per-problem registry of elementary generators.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::expression::Expression;
use super::point::Point;

static NEXT_PROBLEM_TAG: AtomicU64 = AtomicU64::new(1);

/// Registry handle assigning indices to the elementary generators of one
/// problem.
///
/// Every symbolic vector is a linear combination of *vector generators*
/// (gradient samples, free initial points) and every symbolic scalar is an
/// affine combination of *scalar generators* (function-value samples). The
/// registry hands out dense, never-reused indices for both kinds from two
/// independent counters. It is deliberately not a process-wide singleton:
/// each problem owns its own registry, so several problems can be built
/// side by side without index collisions.
///
/// Everything created through a registry carries its problem tag; algebra
/// mixing objects from two different problems panics right where the mixing
/// happens instead of producing a silently inconsistent program.
#[derive(Debug, Clone)]
pub struct Basis {
    inner: Rc<RefCell<Counters>>,
}

#[derive(Debug)]
struct Counters {
    tag: u64,
    vectors: usize,
    scalars: usize,
}

impl Basis {
    pub(crate) fn new() -> Self {
        let tag = NEXT_PROBLEM_TAG.fetch_add(1, Ordering::Relaxed);

        Self {
            inner: Rc::new(RefCell::new(Counters {
                tag,
                vectors: 0,
                scalars: 0,
            })),
        }
    }

    pub(crate) fn tag(&self) -> u64 {
        self.inner.borrow().tag
    }

    /// Allocates a fresh vector generator and returns its index.
    pub(crate) fn new_vector_generator(&self) -> usize {
        let mut counters = self.inner.borrow_mut();
        let index = counters.vectors;
        counters.vectors += 1;
        index
    }

    /// Allocates a fresh scalar generator and returns its index.
    pub(crate) fn new_scalar_generator(&self) -> usize {
        let mut counters = self.inner.borrow_mut();
        let index = counters.scalars;
        counters.scalars += 1;
        index
    }

    /// Number of vector generators allocated so far (the Gram dimension).
    pub(crate) fn vector_count(&self) -> usize {
        self.inner.borrow().vectors
    }

    /// Number of scalar generators allocated so far.
    pub(crate) fn scalar_count(&self) -> usize {
        self.inner.borrow().scalars
    }

    /// Fresh vector generator wrapped as a unit [`Point`].
    pub(crate) fn vector_point(&self) -> Point {
        Point::generator(self.tag(), self.new_vector_generator())
    }

    /// Fresh scalar generator wrapped as a unit [`Expression`].
    pub(crate) fn scalar_expression(&self) -> Expression {
        Expression::scalar_generator(self.tag(), self.new_scalar_generator())
    }
}
