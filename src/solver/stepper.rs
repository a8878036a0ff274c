//! Crank-Nicolson time stepping
//!
//! Each step solves `A·C^{n+1} = B·C^n` for the next concentration profile.
//! `A` and `B` are constant during a run, so the implicit operator is
//! factorised once and reused:
//!
//! - [`LinearSolverKind::DenseLu`]: nalgebra LU decomposition of the dense `A`
//! - [`LinearSolverKind::Tridiagonal`]: Thomas algorithm on the bands of `A`
//!
//! # Stability
//!
//! Crank-Nicolson is unconditionally stable for diffusion, but large
//! `alpha = D·dt/(2·dx²)` values (typical for the well-mixed contact phase)
//! produce damped oscillations near steep fronts. They decay and do not
//! affect the integrated masses noticeably.
//!
//! # Example
//!
//! ```rust
//! use migration_rs::physics::{LayerSpec, Migrant, CONTACT_PHASE};
//! use migration_rs::solver::run_simulation;
//! use migration_rs::physics::resolve_stack;
//!
//! let migrant = Migrant::new(136.0, 25.0);
//! let layers = resolve_stack(&[
//!     LayerSpec::new("LDPE", 0.2, 10, 100.0).with_partition_coefficient(1.0),
//!     LayerSpec::new(CONTACT_PHASE, 2.0, 20, 0.0).with_density(0.9),
//! ], &migrant).unwrap();
//!
//! let result = run_simulation(&layers, 86_400.0, 3600.0).unwrap();
//! assert_eq!(result.len(), 24);
//! assert_eq!(result.time_points[0], 3600.0);
//! ```

use crate::analysis::{check_partitioning, trapezoid};
use crate::error::{MigrationError, MigrationResult};
use crate::physics::Layer;
use crate::solver::crank_nicolson::CrankNicolsonAssembler;
use crate::solver::grid::{build_grid, build_initial_concentration};
use crate::solver::scenario::Scenario;
use crate::solver::traits::{LinearSolverKind, SimulationResult, Solver, SolverConfiguration};
use crate::solver::tridiagonal::TridiagonalMatrix;
use crate::solver::validate_state;
use log::debug;
use nalgebra::{DMatrix, DVector, Dyn, linalg::LU};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

/// One-off dense solve of `A·C_next = B·C_current`
///
/// # Errors
///
/// `Solver` when `A` is singular or the dimensions disagree.
pub fn solve_timestep(
    implicit: &DMatrix<f64>,
    explicit: &DMatrix<f64>,
    current: &DVector<f64>,
) -> MigrationResult<DVector<f64>> {
    let n = current.len();
    if implicit.shape() != (n, n) || explicit.shape() != (n, n) {
        return Err(MigrationError::Solver {
            step: 0,
            message: format!(
                "dimension mismatch: A is {:?}, B is {:?}, C has {} entries",
                implicit.shape(),
                explicit.shape(),
                n
            ),
        });
    }
    let rhs = explicit * current;
    implicit.clone().lu().solve(&rhs).ok_or_else(|| MigrationError::Solver {
        step: 0,
        message: "implicit matrix is singular".to_string(),
    })
}

// =================================================================================================
// Step operator
// =================================================================================================

/// Pre-factorised operators of one run
enum StepOperator {
    Dense {
        lu: LU<f64, Dyn, Dyn>,
        explicit: DMatrix<f64>,
    },
    Banded {
        implicit: TridiagonalMatrix,
        explicit: TridiagonalMatrix,
    },
}

impl StepOperator {
    fn new(kind: LinearSolverKind, implicit: DMatrix<f64>, explicit: DMatrix<f64>) -> MigrationResult<Self> {
        match kind {
            LinearSolverKind::DenseLu => {
                let lu = implicit.lu();
                if !lu.is_invertible() {
                    return Err(MigrationError::Solver {
                        step: 0,
                        message: "implicit matrix is singular".to_string(),
                    });
                }
                Ok(StepOperator::Dense { lu, explicit })
            }
            LinearSolverKind::Tridiagonal => Ok(StepOperator::Banded {
                implicit: TridiagonalMatrix::from_dense(&implicit)?,
                explicit: TridiagonalMatrix::from_dense(&explicit)?,
            }),
        }
    }

    fn advance(&self, current: &DVector<f64>, step: usize) -> MigrationResult<DVector<f64>> {
        match self {
            StepOperator::Dense { lu, explicit } => {
                let rhs = explicit * current;
                lu.solve(&rhs).ok_or_else(|| MigrationError::Solver {
                    step,
                    message: "LU solve failed".to_string(),
                })
            }
            StepOperator::Banded { implicit, explicit } => {
                implicit.solve(&explicit.mul_vec(current, step)?, step)
            }
        }
    }
}

// =================================================================================================
// Solver
// =================================================================================================

/// Crank-Nicolson solver for multilayer stacks
#[derive(Debug, Clone, Copy, Default)]
pub struct CrankNicolsonSolver;

impl CrankNicolsonSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for CrankNicolsonSolver {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> MigrationResult<SimulationResult> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let layers = scenario.layers();
        let dt = config.time.time_step;
        let steps = config.time.steps();

        // ====== Step 2: Setup ======

        let grid = build_grid(layers);
        let (working, initial) = build_initial_concentration(layers);
        let matrices = CrankNicolsonAssembler::new(dt)?.assemble(layers)?;
        let n = matrices.size();

        debug!(
            "Crank-Nicolson run: {} layers, {} grid points, {} steps of {} s, {} solver",
            layers.len(),
            n,
            steps,
            dt,
            config.linear_solver.name()
        );

        let operator = StepOperator::new(config.linear_solver, matrices.implicit, matrices.explicit)?;

        let mut state = DVector::from_iterator(n, working.iter().copied());
        let mut snapshots = Array2::<f64>::zeros((steps, n));
        let mut total_masses = Vec::with_capacity(steps);

        // ====== Step 3: Time Integration ======

        for step in 0..steps {
            state = operator.advance(&state, step + 1)?;
            validate_state(&state, step + 1)?;

            let snapshot = ArrayView1::from(state.as_slice());
            total_masses.push(trapezoid(grid.view(), snapshot));
            snapshots.row_mut(step).assign(&snapshot);
        }

        // ====== Step 4: Build Result ======

        let partitioning = check_partitioning(layers, &snapshots);

        let mut result = SimulationResult {
            layers: layers.to_vec(),
            grid,
            initial_concentration: initial,
            snapshots,
            time_points: config.time.step_times(),
            total_masses,
            partitioning,
            time_step: dt,
            metadata: HashMap::new(),
        };

        result.add_metadata("solver", self.name());
        result.add_metadata("linear solver", config.linear_solver.name());
        result.add_metadata("time steps", &steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &config.time.total_time.to_string());

        Ok(result)
    }

    fn name(&self) -> &str {
        "Crank-Nicolson"
    }
}

/// Run a full multilayer simulation with the default dense solver
///
/// Equivalent to [`CrankNicolsonSolver`] on `Scenario::new(layers)` with
/// `SolverConfiguration::crank_nicolson(total_time, time_step)`.
pub fn run_simulation(layers: &[Layer], total_time: f64, time_step: f64) -> MigrationResult<SimulationResult> {
    let scenario = Scenario::new(layers.to_vec())?;
    let config = SolverConfiguration::crank_nicolson(total_time, time_step)?;
    CrankNicolsonSolver::new().solve(&scenario, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::LayerSpec;
    use approx::assert_relative_eq;

    fn layer(thickness: f64, nx: usize, c0: f64, d: f64) -> Layer {
        LayerSpec::new("LDPE", thickness, nx, c0)
            .with_diffusion_coefficient(d)
            .build()
            .unwrap()
    }

    #[test]
    fn test_solve_timestep_identity() {
        let a = DMatrix::<f64>::identity(3, 3);
        let b = DMatrix::<f64>::identity(3, 3) * 2.0;
        let c = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let next = solve_timestep(&a, &b, &c).unwrap();
        assert_eq!(next, DVector::from_vec(vec![2.0, 4.0, 6.0]));
    }

    #[test]
    fn test_solve_timestep_singular() {
        let a = DMatrix::<f64>::zeros(2, 2);
        let b = DMatrix::<f64>::identity(2, 2);
        let err = solve_timestep(&a, &b, &DVector::from_element(2, 1.0)).unwrap_err();
        assert!(matches!(err, MigrationError::Solver { .. }));
    }

    #[test]
    fn test_solve_timestep_dimension_mismatch() {
        let a = DMatrix::<f64>::identity(3, 3);
        let err = solve_timestep(&a, &a, &DVector::from_element(2, 1.0)).unwrap_err();
        assert!(matches!(err, MigrationError::Solver { .. }));
    }

    #[test]
    fn test_result_shapes() {
        let layers = vec![layer(0.1, 6, 10.0, 1e-7), layer(0.2, 11, 0.0, 1e-7)];
        let result = run_simulation(&layers, 10.0 * 3600.0, 3600.0).unwrap();

        assert_eq!(result.len(), 10);
        assert_eq!(result.snapshots.dim(), (10, 17));
        assert_eq!(result.total_masses.len(), 10);
        assert_eq!(result.partitioning.dim(), (1, 10));
        assert_eq!(result.time_points.first(), Some(&3600.0));
        assert_eq!(result.time_points.last(), Some(&36_000.0));
        assert_eq!(result.metadata("solver"), Some("Crank-Nicolson"));
        assert_eq!(result.initial_concentration[0], 10.0);
    }

    #[test]
    fn test_uniform_profile_stays_uniform() {
        let layers = vec![layer(0.1, 11, 5.0, 1e-6)];
        let result = run_simulation(&layers, 1000.0, 10.0).unwrap();
        for value in result.final_state().unwrap() {
            assert_relative_eq!(*value, 5.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_dense_and_banded_agree() {
        let layers = vec![
            LayerSpec::new("LDPE", 0.1, 11, 100.0)
                .with_diffusion_coefficient(1e-7)
                .with_partition_coefficient(2.0)
                .build()
                .unwrap(),
            layer(0.5, 21, 0.0, 1e-4),
        ];
        let scenario = Scenario::new(layers).unwrap();
        let dense = SolverConfiguration::crank_nicolson(86_400.0, 600.0).unwrap();
        let banded = dense.with_linear_solver(LinearSolverKind::Tridiagonal);

        let solver = CrankNicolsonSolver::new();
        let a = solver.solve(&scenario, &dense).unwrap();
        let b = solver.solve(&scenario, &banded).unwrap();

        for (x, y) in a.snapshots.iter().zip(b.snapshots.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let layers = vec![layer(0.1, 5, 1.0, 1e-8)];
        assert!(run_simulation(&layers, 10.0, 0.0).is_err());
        assert!(run_simulation(&layers, -10.0, 1.0).is_err());
        assert!(run_simulation(&[], 100.0, 10.0).is_err());
    }

    #[test]
    fn test_zero_steps_give_empty_history() {
        let layers = vec![layer(0.1, 5, 1.0, 1e-8), layer(0.1, 5, 0.0, 1e-8)];
        let result = run_simulation(&layers, 10.0, 100.0).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.snapshots.dim(), (0, 10));
        assert!(result.total_masses.is_empty());
        assert_eq!(result.partitioning.dim(), (1, 0));
        assert!(result.final_state().is_none());
        assert_eq!(result.initial_concentration[0], 1.0);
    }
}
