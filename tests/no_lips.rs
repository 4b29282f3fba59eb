//! Worst-case guarantees of the NoLips method.
//!
//! NoLips minimizes `F = f + i` where `i` is the indicator of a closed
//! convex set and `f` is smooth *relative* to a convex mirror map `h`,
//! without being smooth in the usual sense. Relative smoothness with
//! constant `L` means both `h - f / L` and `h + f / L` are convex, which is
//! modeled here by writing `f` and `h` as combinations of two declared
//! convex functions.
//!
//! Both computed bounds are known in closed form and are tight.

use approx::assert_abs_diff_eq;

use pep::functions::{Convex, ConvexIndicator};
use pep::steps::bregman_gradient_step;
use pep::{Function, Pep};

struct RelativelySmooth {
    problem: Pep,
    objective: Function,
    smooth_part: Function,
    mirror_map: Function,
    indicator: Function,
}

fn relatively_smooth(l: f64) -> RelativelySmooth {
    let mut problem = Pep::new();

    let d1 = problem.declare_function(Convex::new().with_reuse_gradient(true));
    let d2 = problem.declare_function(Convex::new().with_reuse_gradient(true));
    let smooth_part = (&d2 - &d1) / 2.0;
    let mirror_map = (&d1 + &d2) / (2.0 * l);

    let indicator = problem.declare_function(ConvexIndicator::new(f64::INFINITY));
    let objective = &smooth_part + &indicator;

    RelativelySmooth {
        problem,
        objective,
        smooth_part,
        mirror_map,
        indicator,
    }
}

/// min_t Dh(x_t; x_{t+1}) <= gamma / n * (F(x_0) - F(x_n)), with the
/// Bregman distances anchored at the new iterate.
#[test]
fn bregman_distance_to_the_next_iterate() {
    let l = 1.0;
    let gamma = 1.0 / l;
    let n = 3;

    let RelativelySmooth {
        mut problem,
        objective,
        smooth_part,
        mirror_map,
        indicator,
    } = relatively_smooth(l);

    let x0 = problem.set_initial_point();
    let (gh0, h0) = mirror_map.oracle(&x0);
    let (gf0, _) = smooth_part.oracle(&x0);
    let (_, initial_value) = objective.oracle(&x0);

    let mut x = x0;
    let mut h = h0;
    let mut gradient = gf0;
    let mut mirror_gradient = gh0;
    for _ in 0..n {
        let lifted = &indicator + &mirror_map;
        let (next, _, _) = bregman_gradient_step(&gradient, &mirror_gradient, &lifted, gamma);

        let (gf, _) = smooth_part.oracle(&next);
        let (gh, h_next) = mirror_map.oracle(&next);

        let distance = &h - &h_next - &gh * (&x - &next);
        problem.set_performance_metric(distance);

        x = next;
        h = h_next;
        gradient = gf;
        mirror_gradient = gh;
    }

    let (_, final_value) = objective.oracle(&x);
    problem.set_initial_condition((initial_value - final_value).less_equal(1.0));

    let solution = problem.solve().unwrap();

    assert_abs_diff_eq!(solution.value(), gamma / n as f64, epsilon = 2e-3);
    assert_eq!(solution.gram().nrows(), 5 + 3 * n);
}

/// min_t Dh(x_{t+1}; x_t) <= gamma / ((1 - L * gamma) * n)
/// * (F(x_0) - F(x_n)), with the Bregman distances anchored at the
/// previous iterate.
#[test]
fn bregman_distance_to_the_previous_iterate() {
    let l = 1.0;
    let gamma = 1.0 / (2.0 * l);
    let n = 4;

    let RelativelySmooth {
        mut problem,
        objective,
        smooth_part,
        mirror_map,
        indicator,
    } = relatively_smooth(l);

    let x0 = problem.set_initial_point();
    let (gh0, h0) = mirror_map.oracle(&x0);
    let (gf0, _) = smooth_part.oracle(&x0);
    let (_, initial_value) = objective.oracle(&x0);

    let mut x = x0;
    let mut h = h0;
    let mut gradient = gf0;
    let mut mirror_gradient = gh0;
    for _ in 0..n {
        let lifted = &indicator + &mirror_map;
        let (next, _, _) = bregman_gradient_step(&gradient, &mirror_gradient, &lifted, gamma);

        let (gf, _) = smooth_part.oracle(&next);
        let (gh, h_next) = mirror_map.oracle(&next);

        let distance = &h_next - &h - &mirror_gradient * (&next - &x);
        problem.set_performance_metric(distance);

        x = next;
        h = h_next;
        gradient = gf;
        mirror_gradient = gh;
    }

    let (_, final_value) = objective.oracle(&x);
    problem.set_initial_condition((initial_value - final_value).less_equal(1.0));

    let solution = problem.solve().unwrap();

    assert_abs_diff_eq!(
        solution.value(),
        gamma / ((1.0 - l * gamma) * n as f64),
        epsilon = 2e-3
    );
}

/// The oracle bookkeeping behind the analysis: the two declared convex
/// parts see each iterate once thanks to gradient reuse, while the
/// indicator takes a fresh subgradient at the last iterate when the final
/// objective value is queried.
#[test]
fn oracle_calls_per_declared_function() {
    let n = 3;
    let RelativelySmooth {
        mut problem,
        objective,
        smooth_part,
        mirror_map,
        indicator,
    } = relatively_smooth(1.0);

    let x0 = problem.set_initial_point();
    let (gh0, _) = mirror_map.oracle(&x0);
    let (gf0, _) = smooth_part.oracle(&x0);
    let (_, _) = objective.oracle(&x0);

    let mut x = x0;
    let mut gradient = gf0;
    let mut mirror_gradient = gh0;
    for _ in 0..n {
        let lifted = &indicator + &mirror_map;
        let (next, _, _) = bregman_gradient_step(&gradient, &mirror_gradient, &lifted, 1.0);
        let (gf, _) = smooth_part.oracle(&next);
        let (gh, _) = mirror_map.oracle(&next);
        x = next;
        gradient = gf;
        mirror_gradient = gh;
    }
    let (_, _) = objective.oracle(&x);

    // x_0 .. x_n for the smooth part, one extra indicator subgradient at x_n
    assert_eq!(smooth_part.sample_count(), n + 1);
    assert_eq!(indicator.sample_count(), n + 2);
}
