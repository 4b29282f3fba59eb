//! Indicator functions of closed convex sets.

use getset::CopyGetters;
use log::warn;

use crate::core::{Constraint, FunctionClass, Sample};

/// Class of indicator functions of closed convex sets of diameter at most
/// `diameter`.
///
/// Every sample's value is pinned to zero (the point lies in the set), the
/// recorded subgradients are normal-cone cuts between every ordered pair of
/// distinct samples, and each unordered pair of samples is at most
/// `diameter` apart. With an infinite diameter the pairwise distance
/// constraints are vacuous and are omitted, so `k` samples produce `k^2`
/// constraints, plus `k * (k - 1) / 2` more when the diameter is finite.
#[derive(Debug, Clone, CopyGetters)]
pub struct ConvexIndicator {
    /// Upper bound on the diameter of the underlying set.
    #[getset(get_copy = "pub")]
    diameter: f64,
}

impl ConvexIndicator {
    /// Initializes the class for sets of diameter at most `diameter`.
    ///
    /// `f64::INFINITY` is accepted and means the set is unbounded.
    pub fn new(diameter: f64) -> Self {
        assert!(diameter > 0.0, "diameter must be positive");

        if diameter.is_infinite() {
            warn!("convex indicator declared with infinite diameter; no distance constraints will be produced");
        }

        Self { diameter }
    }
}

impl FunctionClass for ConvexIndicator {
    fn name(&self) -> &'static str {
        "convex indicator"
    }

    fn reuse_gradient(&self) -> bool {
        false
    }

    fn class_constraints(&self, samples: &[Sample]) -> Vec<Constraint> {
        let mut constraints = Vec::new();

        for (i, si) in samples.iter().enumerate() {
            constraints.push(
                si.value
                    .equal(0.0)
                    .named(format!("membership value ({i})")),
            );
        }

        for (i, si) in samples.iter().enumerate() {
            for (j, sj) in samples.iter().enumerate() {
                if i == j {
                    continue;
                }

                // <g_j, x_i - x_j> <= 0
                let cut = &sj.gradient * (&si.point - &sj.point);
                constraints.push(cut.less_equal(0.0).named(format!("normal cone ({i}, {j})")));
            }
        }

        if self.diameter.is_finite() {
            for (i, si) in samples.iter().enumerate() {
                for (j, sj) in samples.iter().enumerate().skip(i + 1) {
                    let distance = (&si.point - &sj.point).sq();
                    constraints.push(
                        distance
                            .less_equal(self.diameter * self.diameter)
                            .named(format!("diameter ({i}, {j})")),
                    );
                }
            }
        }

        constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Basis, Comparison, Function};

    fn sampled(diameter: f64, count: usize) -> Function {
        let basis = Basis::new();
        let f = Function::leaf(basis.clone(), Box::new(ConvexIndicator::new(diameter)));
        for _ in 0..count {
            f.oracle(&basis.vector_point());
        }
        f
    }

    #[test]
    fn unbounded_set_has_no_distance_constraints() {
        let constraints = sampled(f64::INFINITY, 3).class_constraints();

        assert_eq!(constraints.len(), 9);
        assert_eq!(
            constraints
                .iter()
                .filter(|c| c.comparison() == Comparison::Equal)
                .count(),
            3
        );
    }

    #[test]
    fn finite_diameter_bounds_every_pair() {
        let constraints = sampled(1.0, 3).class_constraints();

        assert_eq!(constraints.len(), 12);
    }

    #[test]
    #[should_panic(expected = "diameter must be positive")]
    fn rejects_nonpositive_diameter() {
        let _ = ConvexIndicator::new(0.0);
    }
}
