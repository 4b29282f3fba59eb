//! Smooth strongly convex functions.

use getset::CopyGetters;

use crate::core::{Constraint, FunctionClass, Sample};

/// Class of `L`-smooth, `mu`-strongly convex functions with `0 <= mu < L`.
///
/// Interpolation is characterized by
///
/// ```text
/// f_i >= f_j + <g_j, x_i - x_j> + 1/(2L) ||g_i - g_j||^2
///        + mu*L / (2*(L - mu)) ||x_i - x_j - (g_i - g_j)/L||^2
/// ```
///
/// over every ordered pair of distinct samples, so `k` samples produce
/// `k * (k - 1)` constraints. With `mu = 0` this is the class of smooth
/// convex functions.
#[derive(Debug, Clone, CopyGetters)]
pub struct SmoothStronglyConvex {
    /// Strong convexity constant of the class.
    #[getset(get_copy = "pub")]
    strong_convexity: f64,
    /// Smoothness constant of the class.
    #[getset(get_copy = "pub")]
    smoothness: f64,
}

impl SmoothStronglyConvex {
    /// Initializes the class of `smoothness`-smooth, `strong_convexity`-strongly
    /// convex functions.
    pub fn new(strong_convexity: f64, smoothness: f64) -> Self {
        assert!(
            strong_convexity >= 0.0,
            "strong convexity constant must be nonnegative"
        );
        assert!(
            smoothness.is_finite() && smoothness > strong_convexity,
            "smoothness constant must be finite and exceed the strong convexity constant"
        );

        Self {
            strong_convexity,
            smoothness,
        }
    }
}

impl FunctionClass for SmoothStronglyConvex {
    fn name(&self) -> &'static str {
        "smooth strongly convex"
    }

    fn reuse_gradient(&self) -> bool {
        true
    }

    fn class_constraints(&self, samples: &[Sample]) -> Vec<Constraint> {
        let mu = self.strong_convexity;
        let l = self.smoothness;
        let mut constraints = Vec::new();

        for (i, si) in samples.iter().enumerate() {
            for (j, sj) in samples.iter().enumerate() {
                if i == j {
                    continue;
                }

                let dx = &si.point - &sj.point;
                let dg = &si.gradient - &sj.gradient;
                let bound = &sj.value
                    + &sj.gradient * &dx
                    + 1.0 / (2.0 * l) * dg.sq()
                    + mu * l / (2.0 * (l - mu)) * (&dx - &dg / l).sq();
                constraints.push(
                    si.value
                        .greater_equal(bound)
                        .named(format!("interpolation ({i}, {j})")),
                );
            }
        }

        constraints
    }
}
