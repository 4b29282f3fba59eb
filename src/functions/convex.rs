//! Closed convex functions.

use getset::CopyGetters;

use crate::core::{Constraint, FunctionClass, Sample};

/// Class of closed, proper convex functions.
///
/// Interpolation is characterized by the subgradient inequality between
/// every ordered pair of distinct samples, so `k` samples produce
/// `k * (k - 1)` constraints.
///
/// The class is nonsmooth, so by default every oracle call draws a fresh
/// subgradient even at an already-queried point. Call
/// [`with_reuse_gradient`](Convex::with_reuse_gradient) to model a function
/// whose oracle is deterministic.
#[derive(Debug, Clone, CopyGetters)]
pub struct Convex {
    /// Whether repeated oracle calls at one point return the recorded pair.
    #[getset(get_copy = "pub")]
    reuse_gradient: bool,
}

impl Convex {
    /// Initializes the class with default options.
    pub fn new() -> Self {
        Self {
            reuse_gradient: false,
        }
    }

    /// Sets whether repeated oracle calls at one point reuse the recorded
    /// subgradient.
    pub fn with_reuse_gradient(mut self, reuse_gradient: bool) -> Self {
        self.reuse_gradient = reuse_gradient;
        self
    }
}

impl Default for Convex {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionClass for Convex {
    fn name(&self) -> &'static str {
        "convex"
    }

    fn reuse_gradient(&self) -> bool {
        self.reuse_gradient
    }

    fn class_constraints(&self, samples: &[Sample]) -> Vec<Constraint> {
        let mut constraints = Vec::new();

        for (i, si) in samples.iter().enumerate() {
            for (j, sj) in samples.iter().enumerate() {
                if i == j {
                    continue;
                }

                // f_i >= f_j + <g_j, x_i - x_j>
                let cut = &sj.value + &sj.gradient * (&si.point - &sj.point);
                constraints.push(
                    si.value
                        .greater_equal(cut)
                        .named(format!("convexity cut ({i}, {j})")),
                );
            }
        }

        constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Basis, Comparison, Function};

    #[test]
    fn ordered_pairs_of_distinct_samples() {
        let basis = Basis::new();
        let f = Function::leaf(basis.clone(), Box::new(Convex::new()));

        for _ in 0..3 {
            f.oracle(&basis.vector_point());
        }

        let constraints = f.class_constraints();
        assert_eq!(constraints.len(), 6);
        assert!(constraints
            .iter()
            .all(|c| c.comparison() == Comparison::LessEqual));
    }

    #[test]
    fn no_samples_no_constraints() {
        let basis = Basis::new();
        let f = Function::leaf(basis, Box::new(Convex::new()));

        assert!(f.class_constraints().is_empty());
    }
}
