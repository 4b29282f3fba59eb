//! Performance estimation problems.

use getset::CopyGetters;
use log::{debug, info};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use thiserror::Error;

use crate::core::{Basis, Comparison, Constraint, Expression, Function, FunctionClass, Point};
use crate::sdp::{
    Admm, LinearForm, SdpComparison, SdpConstraint, SdpError, SdpProblem, SdpSolver,
};

/// Failure of solving a performance estimation problem.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The initial conditions and interpolation constraints admit no
    /// instance; the described worst case is empty.
    #[error("performance estimation problem is infeasible")]
    Infeasible,
    /// The performance metric is not bounded over the described instances;
    /// no finite worst-case guarantee exists.
    #[error("performance estimation problem is unbounded")]
    Unbounded,
    /// The semidefinite backend failed.
    #[error("solver failure: {0}")]
    Solver(String),
}

impl From<SdpError> for SolveError {
    fn from(error: SdpError) -> Self {
        match error {
            SdpError::Infeasible => SolveError::Infeasible,
            SdpError::Unbounded => SolveError::Unbounded,
            SdpError::Interrupted(message) => SolveError::Solver(message),
        }
    }
}

/// A performance estimation problem under construction.
///
/// The worst case of a first-order method is described in four moves:
/// declare the functions the method interacts with, create initial points,
/// bound the initial state with conditions, and pick the performance metric
/// whose worst case is sought. [`solve`](Pep::solve) then compiles the
/// recorded description into a semidefinite program and maximizes the
/// metric over every instance consistent with the description.
///
/// ```
/// use pep::functions::SmoothStronglyConvex;
/// use pep::steps::gradient_step;
/// use pep::Pep;
///
/// let mut problem = Pep::new();
/// let f = problem.declare_function(SmoothStronglyConvex::new(0.1, 1.0));
/// let (xs, _) = f.stationary_point();
///
/// let x0 = problem.set_initial_point();
/// problem.set_initial_condition((&x0 - &xs).sq().less_equal(1.0));
///
/// let (x1, _, _) = gradient_step(&f, &x0, 1.0);
/// problem.set_performance_metric((&x1 - &xs).sq());
///
/// let solution = problem.solve()?;
/// assert!((solution.value() - 0.81).abs() < 1e-3);
/// # Ok::<(), pep::SolveError>(())
/// ```
#[derive(Debug)]
pub struct Pep {
    basis: Basis,
    functions: Vec<Function>,
    initial_points: usize,
    conditions: Vec<Constraint>,
    metrics: Vec<Expression>,
    solved: bool,
}

impl Pep {
    /// Initializes an empty problem with its own generator registry.
    pub fn new() -> Self {
        Self {
            basis: Basis::new(),
            functions: Vec::new(),
            initial_points: 0,
            conditions: Vec::new(),
            metrics: Vec::new(),
            solved: false,
        }
    }

    /// Declares a function of the given class and returns its handle.
    pub fn declare_function<C: FunctionClass + 'static>(&mut self, class: C) -> Function {
        self.assert_unsolved();
        let function = Function::leaf(self.basis.clone(), Box::new(class));
        self.functions.push(function.clone());
        function
    }

    /// Creates a free initial point.
    pub fn set_initial_point(&mut self) -> Point {
        self.assert_unsolved();
        self.initial_points += 1;
        self.basis.vector_point()
    }

    /// Adds a constraint on the initial state, typically bounding the
    /// distance between the initial point and an optimum.
    pub fn set_initial_condition(&mut self, condition: Constraint) {
        self.assert_unsolved();
        self.assert_owned(condition.expression().tag());
        self.conditions.push(condition);
    }

    /// Adds a performance metric.
    ///
    /// The solved worst case is over the smallest of the metrics, so adding
    /// several metrics bounds their minimum.
    pub fn set_performance_metric(&mut self, metric: Expression) {
        self.assert_unsolved();
        self.assert_owned(metric.tag());
        self.metrics.push(metric);
    }

    /// Compiles and solves the problem with the bundled backend.
    ///
    /// On success the problem is frozen; further mutation panics.
    pub fn solve(&mut self) -> Result<Solution, SolveError> {
        self.solve_with(&mut Admm::new())
    }

    /// Compiles the problem and solves it with the given backend.
    pub fn solve_with<S>(&mut self, solver: &mut S) -> Result<Solution, SolveError>
    where
        S: SdpSolver<Error = SdpError>,
    {
        self.assert_unsolved();
        assert!(
            !self.metrics.is_empty(),
            "no performance metric has been set"
        );
        self.solved = true;

        let mut constraints: Vec<SdpConstraint> =
            self.conditions.iter().map(compile_constraint).collect();
        for function in &self.functions {
            let class_constraints = function.class_constraints();
            debug!(
                "function of class {} with {} samples contributes {} constraints",
                function.class_name(),
                function.sample_count(),
                class_constraints.len()
            );
            constraints.extend(class_constraints.iter().map(compile_constraint));
        }

        let problem = SdpProblem {
            gram_dim: self.basis.vector_count(),
            scalar_dim: self.basis.scalar_count(),
            constraints,
            objectives: self.metrics.iter().map(compile_form).collect(),
        };

        info!(
            "solving with {}: Gram matrix of order {}, {} function values, {} constraints, {} metrics",
            S::NAME,
            problem.gram_dim,
            problem.scalar_dim,
            problem.constraints.len(),
            problem.objectives.len()
        );

        let solved = solver.solve(&problem)?;
        info!("worst-case value: {:.6e}", solved.objective);

        Ok(Solution::new(self.basis.tag(), solved))
    }

    fn assert_unsolved(&self) {
        assert!(!self.solved, "problem has already been solved");
    }

    fn assert_owned(&self, tag: u64) {
        assert!(
            tag == 0 || tag == self.basis.tag(),
            "expression belongs to a different problem"
        );
    }
}

impl Default for Pep {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_form(expression: &Expression) -> LinearForm {
    LinearForm {
        constant: expression.constant_term(),
        scalars: expression.linear_terms().collect(),
        gram: expression
            .quadratic_terms()
            .map(|((i, j), weight)| (i, j, weight))
            .collect(),
    }
}

fn compile_constraint(constraint: &Constraint) -> SdpConstraint {
    SdpConstraint {
        form: compile_form(constraint.expression()),
        comparison: match constraint.comparison() {
            Comparison::LessEqual => SdpComparison::LessEqual,
            Comparison::Equal => SdpComparison::Equal,
        },
    }
}

/// Solved worst case together with the instance attaining it.
///
/// Besides the worst-case [`value`](Solution::value), the solution carries
/// the Gram matrix and function values of the extremal instance, so any
/// symbolic quantity recorded while building the problem can be evaluated
/// in the counter-example through [`evaluate`](Solution::evaluate) and
/// [`point`](Solution::point).
#[derive(Debug, Clone, CopyGetters)]
pub struct Solution {
    tag: u64,
    /// Worst-case value of the performance metric.
    #[getset(get_copy = "pub")]
    value: f64,
    gram: DMatrix<f64>,
    scalars: DVector<f64>,
    factor: DMatrix<f64>,
}

impl Solution {
    fn new(tag: u64, solved: crate::sdp::SdpSolution) -> Self {
        // G = V diag(l) V', so B = diag(sqrt l) V' reproduces G as B'B and
        // its columns are concrete coordinates for the generators. Small
        // negative eigenvalues from the numeric solve are clamped.
        let eigen = SymmetricEigen::new(solved.gram.clone());
        let roots = eigen.eigenvalues.map(|value| value.max(0.0).sqrt());
        let factor = DMatrix::from_diagonal(&roots) * eigen.eigenvectors.transpose();

        Self {
            tag,
            value: solved.objective,
            gram: solved.gram,
            scalars: solved.scalars,
            factor,
        }
    }

    /// Gram matrix of the extremal instance.
    pub fn gram(&self) -> &DMatrix<f64> {
        &self.gram
    }

    /// Evaluates a symbolic scalar in the extremal instance.
    pub fn evaluate(&self, expression: &Expression) -> f64 {
        self.assert_owned(expression.tag());

        let mut value = expression.constant_term();
        for (index, weight) in expression.linear_terms() {
            assert!(
                index < self.scalars.len(),
                "expression uses a function value recorded after the solve"
            );
            value += weight * self.scalars[index];
        }
        for ((i, j), weight) in expression.quadratic_terms() {
            assert!(
                j < self.gram.nrows(),
                "expression uses a point recorded after the solve"
            );
            value += weight * self.gram[(i, j)];
        }

        value
    }

    /// Concrete coordinates of a symbolic point in the extremal instance.
    ///
    /// The coordinates live in the factorization of the Gram matrix, so
    /// inner products of returned vectors match
    /// [`evaluate`](Solution::evaluate) on the corresponding products up to
    /// the numeric accuracy of the solve.
    pub fn point(&self, point: &Point) -> DVector<f64> {
        self.assert_owned(point.tag());

        let mut coordinates = DVector::zeros(self.factor.nrows());
        for (index, weight) in point.coefficients() {
            assert!(
                index < self.factor.ncols(),
                "point was recorded after the solve"
            );
            coordinates += weight * self.factor.column(index);
        }

        coordinates
    }

    fn assert_owned(&self, tag: u64) {
        assert!(
            tag == 0 || tag == self.tag,
            "expression belongs to a different problem"
        );
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::functions::Convex;

    #[test]
    fn norm_bound_is_attained() {
        let mut problem = Pep::new();
        let x0 = problem.set_initial_point();

        problem.set_initial_condition(x0.sq().less_equal(1.0));
        problem.set_performance_metric(x0.sq());

        let solution = problem.solve().unwrap();
        assert_abs_diff_eq!(solution.value(), 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(solution.evaluate(&x0.sq()), 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(solution.point(&x0).norm_squared(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn contradictory_conditions_are_reported() {
        let mut problem = Pep::new();
        let f = problem.declare_function(Convex::new());
        let x0 = problem.set_initial_point();
        let (_, value) = f.oracle(&x0);

        problem.set_initial_condition(value.less_equal(-1.0));
        problem.set_initial_condition(value.greater_equal(1.0));
        problem.set_performance_metric(value.clone());

        assert!(matches!(problem.solve(), Err(SolveError::Infeasible)));
    }

    #[test]
    fn unbounded_metric_is_reported() {
        let mut problem = Pep::new();
        let f = problem.declare_function(Convex::new());
        let x0 = problem.set_initial_point();
        let (_, value) = f.oracle(&x0);

        problem.set_performance_metric(value.clone());

        assert!(matches!(problem.solve(), Err(SolveError::Unbounded)));
    }

    #[test]
    #[should_panic(expected = "already been solved")]
    fn mutation_after_solve_panics() {
        let mut problem = Pep::new();
        let x0 = problem.set_initial_point();

        problem.set_initial_condition(x0.sq().less_equal(1.0));
        problem.set_performance_metric(x0.sq());
        problem.solve().unwrap();

        problem.set_initial_point();
    }

    #[test]
    #[should_panic(expected = "no performance metric")]
    fn solving_without_a_metric_panics() {
        let mut problem = Pep::new();
        let x0 = problem.set_initial_point();
        problem.set_initial_condition(x0.sq().less_equal(1.0));

        let _ = problem.solve();
    }
}
