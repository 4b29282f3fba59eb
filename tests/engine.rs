//! End-to-end worst-case analyses with known closed-form answers.

use approx::assert_abs_diff_eq;

use pep::functions::{Convex, ConvexIndicator, Smooth, SmoothStronglyConvex};
use pep::steps::{gradient_step, proximal_step};
use pep::Pep;

/// A single oracle call on a smooth function constrains nothing; the
/// compiled program is feasible and bounded by the initial condition alone.
#[test]
fn single_sample_smoke() {
    let mut problem = Pep::new();
    let f = problem.declare_function(Smooth::new(1.0));

    let x0 = problem.set_initial_point();
    let _ = f.oracle(&x0);

    problem.set_initial_condition(x0.sq().less_equal(1.0));
    problem.set_performance_metric(x0.sq());

    let solution = problem.solve().unwrap();
    assert_abs_diff_eq!(solution.value(), 1.0, epsilon = 1e-3);
}

/// n steps of gradient descent on a smooth strongly convex function
/// contract the distance to the optimum by max(|1-gm|, |1-gL|)^2 each.
#[test]
fn gradient_descent_contraction() {
    let mu = 0.1;
    let l = 1.0;
    let gamma = 1.0;
    let n = 2;

    let mut problem = Pep::new();
    let f = problem.declare_function(SmoothStronglyConvex::new(mu, l));
    let (xs, _) = f.stationary_point();

    let x0 = problem.set_initial_point();
    problem.set_initial_condition((&x0 - &xs).sq().less_equal(1.0));

    let mut x = x0;
    for _ in 0..n {
        let (next, _, _) = gradient_step(&f, &x, gamma);
        x = next;
    }

    let metric = (&x - &xs).sq();
    problem.set_performance_metric(metric.clone());

    let solution = problem.solve().unwrap();

    let rate = (1.0 - gamma * mu).abs().max((1.0 - gamma * l).abs());
    assert_abs_diff_eq!(solution.value(), rate.powi(2 * n), epsilon = 1e-3);

    // The counter-example attains the bound.
    assert_abs_diff_eq!(solution.evaluate(&metric), solution.value(), epsilon = 1e-4);
    assert_abs_diff_eq!(
        solution.point(&(&x - &xs)).norm_squared(),
        solution.value(),
        epsilon = 1e-3
    );
}

/// The proximal point method on a closed convex function satisfies
/// f(x_n) - f_* <= ||x_0 - x_*||^2 / (4 * gamma * n), tightly.
#[test]
fn proximal_point_method() {
    let gamma = 1.0;
    let n = 2;

    let mut problem = Pep::new();
    let f = problem.declare_function(Convex::new());
    let (xs, optimal_value) = f.stationary_point();

    let x0 = problem.set_initial_point();
    problem.set_initial_condition((&x0 - &xs).sq().less_equal(1.0));

    let mut x = x0;
    let mut value = optimal_value.clone();
    for _ in 0..n {
        let (next, _, next_value) = proximal_step(&f, &x, gamma);
        x = next;
        value = next_value;
    }

    problem.set_performance_metric(value - optimal_value);

    let solution = problem.solve().unwrap();
    assert_abs_diff_eq!(
        solution.value(),
        1.0 / (4.0 * gamma * n as f64),
        epsilon = 1e-3
    );
}

/// Two points of a set of diameter 1 are at squared distance at most 1,
/// and the bound is attained.
#[test]
fn bounded_set_diameter_is_tight() {
    let mut problem = Pep::new();
    let set = problem.declare_function(ConvexIndicator::new(1.0));

    let x = problem.set_initial_point();
    let y = problem.set_initial_point();
    set.oracle(&x);
    set.oracle(&y);

    problem.set_performance_metric((&x - &y).sq());

    let solution = problem.solve().unwrap();
    assert_abs_diff_eq!(solution.value(), 1.0, epsilon = 1e-3);
}

/// A weighted sum of declared functions carries its interpolation
/// constraints through its leaves: minimizing f + g over one proximal step
/// is the same analysis whether the sum was built before or after oracle
/// calls on the parts.
#[test]
fn composite_objective_via_combination() {
    let gamma = 1.0;

    let mut problem = Pep::new();
    let smooth = problem.declare_function(SmoothStronglyConvex::new(0.0, 1.0));
    let set = problem.declare_function(ConvexIndicator::new(f64::INFINITY));
    let composite = &smooth + &set;

    let (xs, _) = composite.stationary_point();
    let x0 = problem.set_initial_point();
    problem.set_initial_condition((&x0 - &xs).sq().less_equal(1.0));

    // Projected gradient: explicit step on the smooth part, proximal step
    // on the indicator.
    let (half, _, _) = gradient_step(&smooth, &x0, gamma);
    let (x1, _, _) = proximal_step(&set, &half, gamma);

    problem.set_performance_metric((&x1 - &xs).sq());

    let solution = problem.solve().unwrap();

    // Projections do not expand distances, so one projected gradient step
    // with gamma = 1/L cannot do worse than the unconstrained step.
    assert!(solution.value() <= 1.0 + 1e-3);
    assert!(solution.value() >= -1e-6);
}
