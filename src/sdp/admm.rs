//! Embedded first-order conic solver.
//!
//! Operator-splitting solver for the cone programs produced by the problem
//! compiler, based on the homogeneous self-dual embedding. The embedding
//! makes one fixed-point iteration handle all three outcomes: it converges
//! to a primal-dual optimal pair when one exists and to a certificate of
//! infeasibility or unboundedness otherwise.
//!
//! The program is written as `minimize c'x subject to Ax + s = b, s in K`
//! with `K` a product of a zero cone (equalities), a nonnegative cone
//! (inequalities and the epigraph of the objective) and one positive
//! semidefinite cone holding the scaled upper-triangular vectorization of
//! the Gram matrix. Each iteration solves one linear system with a factored
//! splitting matrix and projects onto the cones, with the semidefinite
//! block projected through an eigenvalue decomposition.

use getset::{CopyGetters, Setters};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

use super::{LinearForm, SdpComparison, SdpError, SdpProblem, SdpSolution, SdpSolver};

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Options of the [`Admm`] solver.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct AdmmOptions {
    /// Relative accuracy required of primal residual, dual residual and
    /// duality gap before the iterate is accepted.
    tolerance: f64,
    /// Accuracy at which an infeasibility or unboundedness certificate is
    /// accepted.
    certificate_tolerance: f64,
    /// Relaxed accuracy accepted, with a warning, when the iteration limit
    /// is hit.
    fallback_tolerance: f64,
    /// Maximum number of iterations.
    max_iterations: usize,
    /// Over-relaxation parameter of the splitting, in `(0, 2)`.
    relaxation: f64,
    /// Number of iterations between convergence checks.
    check_interval: usize,
}

impl Default for AdmmOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            certificate_tolerance: 1e-7,
            fallback_tolerance: 1e-4,
            max_iterations: 200_000,
            relaxation: 1.5,
            check_interval: 25,
        }
    }
}

/// Operator-splitting semidefinite solver.
#[derive(Debug)]
pub struct Admm {
    options: AdmmOptions,
}

impl Admm {
    /// Initializes the solver with default options.
    pub fn new() -> Self {
        Self::with_options(AdmmOptions::default())
    }

    /// Initializes the solver with given options.
    pub fn with_options(options: AdmmOptions) -> Self {
        Self { options }
    }
}

impl Default for Admm {
    fn default() -> Self {
        Self::new()
    }
}

impl SdpSolver for Admm {
    const NAME: &'static str = "admm";

    type Error = SdpError;

    fn solve(&mut self, problem: &SdpProblem) -> Result<SdpSolution, SdpError> {
        assert!(
            !problem.objectives.is_empty(),
            "program has no objective form"
        );

        let program = ConeProgram::assemble(problem);
        let rows = program.a.nrows();
        let cols = program.a.ncols();
        debug!(
            "{}: {} rows, {} columns, semidefinite block of order {}",
            Self::NAME,
            rows,
            cols,
            program.psd_dim
        );

        // Splitting matrix I + Q with Q the skew embedding of (A, b, c).
        let dim = cols + rows + 1;
        let mut splitting = DMatrix::identity(dim, dim);
        for r in 0..rows {
            for col in 0..cols {
                let value = program.a[(r, col)];
                if value != 0.0 {
                    splitting[(col, cols + r)] += value;
                    splitting[(cols + r, col)] -= value;
                }
            }
        }
        for col in 0..cols {
            splitting[(col, dim - 1)] += program.c[col];
            splitting[(dim - 1, col)] -= program.c[col];
        }
        for r in 0..rows {
            splitting[(cols + r, dim - 1)] += program.b[r];
            splitting[(dim - 1, cols + r)] -= program.b[r];
        }
        let factored = splitting.lu();

        let relaxation = self.options.relaxation();
        let mut u = DVector::zeros(dim);
        u[dim - 1] = 1.0;
        let mut v = u.clone();

        for iteration in 1..=self.options.max_iterations() {
            let affine = factored
                .solve(&(&u + &v))
                .ok_or_else(|| SdpError::Interrupted("splitting system is singular".to_string()))?;

            let relaxed = relaxation * affine + (1.0 - relaxation) * &u;
            let mut next = &relaxed - &v;
            program.project_cone(&mut next);
            v += &next - &relaxed;
            u = next;

            if iteration % self.options.check_interval() == 0 {
                if let Some(result) = program.check(
                    &u,
                    &v,
                    self.options.tolerance(),
                    self.options.certificate_tolerance(),
                ) {
                    if result.is_ok() {
                        debug!("{}: converged after {} iterations", Self::NAME, iteration);
                    }
                    return result;
                }
            }
        }

        if let Some(result) = program.check(
            &u,
            &v,
            self.options.fallback_tolerance(),
            self.options.certificate_tolerance(),
        ) {
            if result.is_ok() {
                warn!(
                    "{}: iteration limit reached, accepting the iterate at reduced accuracy",
                    Self::NAME
                );
            }
            return result;
        }

        Err(SdpError::Interrupted(format!(
            "no solution within {} iterations",
            self.options.max_iterations()
        )))
    }
}

/// Assembled cone program `minimize c'x subject to Ax + s = b, s in K`.
#[derive(Debug)]
struct ConeProgram {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
    zero_rows: usize,
    nonneg_rows: usize,
    psd_dim: usize,
}

impl ConeProgram {
    fn assemble(problem: &SdpProblem) -> Self {
        let order = problem.gram_dim;
        let svec_len = order * (order + 1) / 2;
        let cols = svec_len + problem.scalar_dim + 1;
        let t_col = cols - 1;

        let zero_rows = problem
            .constraints
            .iter()
            .filter(|constraint| constraint.comparison == SdpComparison::Equal)
            .count();
        let nonneg_rows = problem.constraints.len() - zero_rows + problem.objectives.len();
        let rows = zero_rows + nonneg_rows + svec_len;

        let mut a = DMatrix::zeros(rows, cols);
        let mut b = DVector::zeros(rows);

        let mut equality = 0;
        let mut inequality = zero_rows;
        for constraint in &problem.constraints {
            let row = match constraint.comparison {
                SdpComparison::Equal => {
                    equality += 1;
                    equality - 1
                }
                SdpComparison::LessEqual => {
                    inequality += 1;
                    inequality - 1
                }
            };
            Self::fill_row(&mut a, svec_len, row, &constraint.form, 1.0);
            b[row] = -constraint.form.constant;
        }

        // The objective t lies below every metric; maximizing it maximizes
        // the minimum of the metrics.
        for form in &problem.objectives {
            let row = inequality;
            inequality += 1;
            Self::fill_row(&mut a, svec_len, row, form, -1.0);
            a[(row, t_col)] += 1.0;
            b[row] = form.constant;
        }

        let psd_offset = zero_rows + nonneg_rows;
        for k in 0..svec_len {
            a[(psd_offset + k, k)] = -1.0;
        }

        let mut c = DVector::zeros(cols);
        c[t_col] = -1.0;

        Self {
            a,
            b,
            c,
            zero_rows,
            nonneg_rows,
            psd_dim: order,
        }
    }

    /// Scatters a linear form into a row of `A`, mapping Gram entries onto
    /// the scaled vectorization (off-diagonal entries carry `sqrt(2)`).
    fn fill_row(a: &mut DMatrix<f64>, svec_len: usize, row: usize, form: &LinearForm, scale: f64) {
        for &(i, j, weight) in &form.gram {
            let column = j * (j + 1) / 2 + i;
            let coefficient = if i == j { weight } else { weight / SQRT_2 };
            a[(row, column)] += scale * coefficient;
        }
        for &(index, weight) in &form.scalars {
            a[(row, svec_len + index)] += scale * weight;
        }
    }

    /// Projects `(x, y, tau)` onto `R^n x K* x R+` in place.
    ///
    /// The dual cone leaves the equality multipliers free, clamps the
    /// nonnegative ones and projects the semidefinite block onto the cone
    /// by zeroing negative eigenvalues.
    fn project_cone(&self, u: &mut DVector<f64>) {
        let cols = self.a.ncols();
        let rows = self.a.nrows();

        for k in 0..self.nonneg_rows {
            let index = cols + self.zero_rows + k;
            if u[index] < 0.0 {
                u[index] = 0.0;
            }
        }

        let order = self.psd_dim;
        if order > 0 {
            let offset = cols + self.zero_rows + self.nonneg_rows;
            let mut symmetric = DMatrix::zeros(order, order);
            for j in 0..order {
                for i in 0..=j {
                    let value = u[offset + j * (j + 1) / 2 + i];
                    if i == j {
                        symmetric[(i, i)] = value;
                    } else {
                        let entry = value / SQRT_2;
                        symmetric[(i, j)] = entry;
                        symmetric[(j, i)] = entry;
                    }
                }
            }

            let eigen = SymmetricEigen::new(symmetric);
            let clamped = eigen.eigenvalues.map(|value| value.max(0.0));
            let projected =
                &eigen.eigenvectors * DMatrix::from_diagonal(&clamped) * eigen.eigenvectors.transpose();

            for j in 0..order {
                for i in 0..=j {
                    let index = offset + j * (j + 1) / 2 + i;
                    u[index] = if i == j {
                        projected[(i, i)]
                    } else {
                        SQRT_2 * projected[(i, j)]
                    };
                }
            }
        }

        if u[cols + rows] < 0.0 {
            u[cols + rows] = 0.0;
        }
    }

    /// Inspects the current iterate, returning a verdict once either the
    /// residuals meet `tolerance` or a certificate meets
    /// `certificate_tolerance`.
    fn check(
        &self,
        u: &DVector<f64>,
        v: &DVector<f64>,
        tolerance: f64,
        certificate_tolerance: f64,
    ) -> Option<Result<SdpSolution, SdpError>> {
        let cols = self.a.ncols();
        let rows = self.a.nrows();
        let tau = u[cols + rows];

        let ux = u.rows(0, cols).into_owned();
        let uy = u.rows(cols, rows).into_owned();
        let vs = v.rows(cols, rows).into_owned();

        // Certificates live in the raw iterates; tau stays at zero there.
        let bty = self.b.dot(&uy);
        if bty < 0.0 {
            let residual = (self.a.transpose() * &uy).norm() * self.b.norm();
            if residual <= -bty * certificate_tolerance {
                return Some(Err(SdpError::Infeasible));
            }
        }
        let ctx = self.c.dot(&ux);
        if ctx < 0.0 {
            let residual = (&self.a * &ux + &vs).norm() * self.c.norm();
            if residual <= -ctx * certificate_tolerance {
                return Some(Err(SdpError::Unbounded));
            }
        }

        if tau <= f64::EPSILON {
            return None;
        }

        let x = ux / tau;
        let y = uy / tau;
        let s = vs / tau;

        let primal = (&self.a * &x + &s - &self.b).norm() / (1.0 + self.b.norm());
        let dual = (self.a.transpose() * &y + &self.c).norm() / (1.0 + self.c.norm());
        let objective = self.c.dot(&x);
        let dual_objective = self.b.dot(&y);
        let gap =
            (objective + dual_objective).abs() / (1.0 + objective.abs() + dual_objective.abs());

        if primal <= tolerance && dual <= tolerance && gap <= tolerance {
            return Some(Ok(self.extract(&x)));
        }

        None
    }

    fn extract(&self, x: &DVector<f64>) -> SdpSolution {
        let order = self.psd_dim;
        let svec_len = order * (order + 1) / 2;
        let cols = self.a.ncols();

        let mut gram = DMatrix::zeros(order, order);
        for j in 0..order {
            for i in 0..=j {
                let value = x[j * (j + 1) / 2 + i];
                if i == j {
                    gram[(i, i)] = value;
                } else {
                    let entry = value / SQRT_2;
                    gram[(i, j)] = entry;
                    gram[(j, i)] = entry;
                }
            }
        }

        let scalars = x.rows(svec_len, cols - svec_len - 1).into_owned();
        let objective = x[cols - 1];

        SdpSolution {
            objective,
            gram,
            scalars,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::sdp::SdpConstraint;

    fn form(constant: f64, scalars: Vec<(usize, f64)>, gram: Vec<(usize, usize, f64)>) -> LinearForm {
        LinearForm {
            constant,
            scalars,
            gram,
        }
    }

    #[test]
    fn bounded_scalar_program() {
        // maximize f subject to f <= 5
        let problem = SdpProblem {
            gram_dim: 0,
            scalar_dim: 1,
            constraints: vec![SdpConstraint {
                form: form(-5.0, vec![(0, 1.0)], vec![]),
                comparison: SdpComparison::LessEqual,
            }],
            objectives: vec![form(0.0, vec![(0, 1.0)], vec![])],
        };

        let solution = Admm::new().solve(&problem).unwrap();
        assert_abs_diff_eq!(solution.objective, 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.scalars[0], 5.0, epsilon = 1e-4);
    }

    #[test]
    fn semidefinite_cone_binds() {
        // maximize -G00 subject to G >= 0
        let problem = SdpProblem {
            gram_dim: 1,
            scalar_dim: 0,
            constraints: vec![],
            objectives: vec![form(0.0, vec![], vec![(0, 0, -1.0)])],
        };

        let solution = Admm::new().solve(&problem).unwrap();
        assert_abs_diff_eq!(solution.objective, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.gram[(0, 0)], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn equality_pins_a_gram_entry() {
        // maximize G01 subject to G00 == 1, G11 == 1, G >= 0
        let pin = |i: usize| SdpConstraint {
            form: form(-1.0, vec![], vec![(i, i, 1.0)]),
            comparison: SdpComparison::Equal,
        };
        let problem = SdpProblem {
            gram_dim: 2,
            scalar_dim: 0,
            constraints: vec![pin(0), pin(1)],
            objectives: vec![form(0.0, vec![], vec![(0, 1, 1.0)])],
        };

        let solution = Admm::new().solve(&problem).unwrap();
        assert_abs_diff_eq!(solution.objective, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(solution.gram[(0, 1)], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn conflicting_bounds_are_infeasible() {
        // f <= -1 and f >= 1
        let problem = SdpProblem {
            gram_dim: 0,
            scalar_dim: 1,
            constraints: vec![
                SdpConstraint {
                    form: form(1.0, vec![(0, 1.0)], vec![]),
                    comparison: SdpComparison::LessEqual,
                },
                SdpConstraint {
                    form: form(1.0, vec![(0, -1.0)], vec![]),
                    comparison: SdpComparison::LessEqual,
                },
            ],
            objectives: vec![form(0.0, vec![(0, 1.0)], vec![])],
        };

        assert!(matches!(
            Admm::new().solve(&problem),
            Err(SdpError::Infeasible)
        ));
    }

    #[test]
    fn free_objective_is_unbounded() {
        let problem = SdpProblem {
            gram_dim: 0,
            scalar_dim: 1,
            constraints: vec![],
            objectives: vec![form(0.0, vec![(0, 1.0)], vec![])],
        };

        assert!(matches!(
            Admm::new().solve(&problem),
            Err(SdpError::Unbounded)
        ));
    }
}
