//! Primitive steps of first-order methods.
//!
//! These helpers express one iteration of a method in terms of oracle
//! calls, so that a whole algorithm run is a short chain of step calls on
//! symbolic points. Each returns the new iterate together with the oracle
//! information recorded while producing it.

use crate::core::{Expression, Function, Point};

/// Explicit gradient step `x - gamma * grad f(x)`.
///
/// Queries the oracle of `function` at `x` and returns the new iterate
/// along with the (sub)gradient and function value at `x`.
pub fn gradient_step(
    function: &Function,
    x: &Point,
    gamma: f64,
) -> (Point, Point, Expression) {
    let (gradient, value) = function.oracle(x);
    let next = x - gamma * &gradient;

    (next, gradient, value)
}

/// Proximal step `argmin_u { f(u) + ||u - x||^2 / (2 * gamma) }`.
///
/// The minimizer satisfies `u = x - gamma * grad f(u)` with a (sub)gradient
/// taken at `u` itself, so the sample is recorded through the implicit
/// oracle. Returns the new iterate along with the (sub)gradient and
/// function value at it.
pub fn proximal_step(
    function: &Function,
    x: &Point,
    gamma: f64,
) -> (Point, Point, Expression) {
    function.implicit_oracle(|gradient| x - gamma * gradient)
}

/// Bregman (mirror) gradient step with mirror map `h`.
///
/// Moves in the dual space of the mirror map: with `s = grad h(x)`, the new
/// iterate is the point whose mirror gradient is `s - gamma * grad f(x)`.
/// Returns the new iterate along with the mirror gradient and mirror-map
/// value at it.
pub fn bregman_gradient_step(
    gradient: &Point,
    mirror_gradient: &Point,
    mirror_map: &Function,
    gamma: f64,
) -> (Point, Point, Expression) {
    let dual = mirror_gradient - gamma * gradient;
    let (next, value) = mirror_map.inverse_oracle(&dual);

    (next, dual, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Basis, Function};
    use crate::functions::{Convex, Smooth};

    #[test]
    fn gradient_step_moves_against_the_gradient() {
        let basis = Basis::new();
        let f = Function::leaf(basis.clone(), Box::new(Smooth::new(1.0)));
        let x = basis.vector_point();

        let (next, gradient, _) = gradient_step(&f, &x, 0.5);

        assert_eq!(next, &x - 0.5 * &gradient);
        assert_eq!(f.sample_count(), 1);
    }

    #[test]
    fn proximal_step_takes_the_gradient_at_the_new_iterate() {
        let basis = Basis::new();
        let f = Function::leaf(basis.clone(), Box::new(Convex::new()));
        let x = basis.vector_point();

        let (next, gradient, _) = proximal_step(&f, &x, 2.0);

        assert_eq!(&next + 2.0 * &gradient, x);
        assert_eq!(f.sample_count(), 1);
    }

    #[test]
    fn bregman_step_updates_the_dual_iterate() {
        let basis = Basis::new();
        let h = Function::leaf(
            basis.clone(),
            Box::new(Convex::new().with_reuse_gradient(true)),
        );
        let x = basis.vector_point();
        let (sx, _) = h.oracle(&x);
        let gradient = basis.vector_point();

        let (next, dual, _) = bregman_gradient_step(&gradient, &sx, &h, 1.0);

        assert_eq!(dual, &sx - &gradient);
        let (recorded, _) = h.oracle(&next);
        assert_eq!(recorded, dual);
    }
}
