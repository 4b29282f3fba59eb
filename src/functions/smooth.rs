//! Smooth, possibly nonconvex functions.

use getset::CopyGetters;
use log::warn;

use crate::core::{Constraint, FunctionClass, Sample};

/// Class of `L`-smooth functions, convex or not.
///
/// Interpolation is characterized by
///
/// ```text
/// f_i - f_j >= -L/4 ||x_i - x_j||^2 + 1/2 <g_i + g_j, x_i - x_j>
///              + 1/(4L) ||g_i - g_j||^2
/// ```
///
/// over every ordered pair of samples, including the trivial `i == j`
/// pair, so `k` samples produce `k^2` constraints.
#[derive(Debug, Clone, CopyGetters)]
pub struct Smooth {
    /// Smoothness constant of the class.
    #[getset(get_copy = "pub")]
    smoothness: f64,
}

impl Smooth {
    /// Initializes the class of `smoothness`-smooth functions.
    pub fn new(smoothness: f64) -> Self {
        assert!(smoothness > 0.0, "smoothness constant must be positive");

        if smoothness.is_infinite() {
            warn!("smooth class declared with infinite smoothness constant; no constraints will be produced");
        }

        Self { smoothness }
    }
}

impl FunctionClass for Smooth {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn reuse_gradient(&self) -> bool {
        true
    }

    fn class_constraints(&self, samples: &[Sample]) -> Vec<Constraint> {
        if self.smoothness.is_infinite() {
            return Vec::new();
        }

        let l = self.smoothness;
        let mut constraints = Vec::new();

        for (i, si) in samples.iter().enumerate() {
            for (j, sj) in samples.iter().enumerate() {
                let dx = &si.point - &sj.point;
                let dg = &si.gradient - &sj.gradient;
                let bound = -l / 4.0 * dx.sq()
                    + 0.5 * ((&si.gradient + &sj.gradient) * &dx)
                    + 1.0 / (4.0 * l) * dg.sq();
                constraints.push(
                    (&si.value - &sj.value)
                        .greater_equal(bound)
                        .named(format!("smoothness ({i}, {j})")),
                );
            }
        }

        constraints
    }
}
