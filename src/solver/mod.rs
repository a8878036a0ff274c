//! Numerical multilayer solver
//!
//! This module discretises a stack of layers in space and integrates the
//! one-dimensional diffusion equation through time with the Crank-Nicolson
//! scheme, honouring flux continuity and partitioning at every interface.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve
//!    - Ordered layer stack, migrant source first
//!    - Diffusion coefficients resolved before the run
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Time axis (`TimeDiscretization`)
//!    - Linear solver (`LinearSolverKind`)
//!
//! 3. **Solver** (`Solver` trait) - The numerical method
//!    - `CrankNicolsonSolver`
//!
//! # Module Organization
//!
//! - **`traits`**: `Solver`, `SolverConfiguration`, `TimeDiscretization`, `SimulationResult`
//! - **`scenario`**: the layer stack and its index ranges
//! - **`grid`**: spatial grid and initial concentration profile
//! - **`crank_nicolson`**: assembly of the implicit/explicit operators `A` and `B`
//! - **`tridiagonal`**: banded storage and Thomas algorithm
//! - **`stepper`**: the time loop
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  LayerSpec[]    │  (user input)
//! └────────┬────────┘
//!          │ resolve(Migrant)
//! ┌────────▼────────┐
//! │ Scenario        │ ← WHAT to solve
//! └────────┬────────┘
//!          │
//! ┌────────▼─────────────┐
//! │ Solver Configuration │ ← HOW to solve
//! └────────┬─────────────┘
//!          │
//! ┌────────▼──────────────────┐
//! │ grid + A, B (once)        │
//! │ A·C^{n+1} = B·C^n (loop)  │ ← The method
//! └────────┬──────────────────┘
//!          │
//! ┌────────▼────────────┐
//! │ Simulation Result   │ ← snapshots, total mass,
//! │                     │   partitioning checks
//! └─────────────────────┘
//! ```
//!
//! # Quick Start Example
//!
//! ```rust
//! use migration_rs::physics::{LayerSpec, Migrant, CONTACT_PHASE};
//! use migration_rs::solver::{CrankNicolsonSolver, Scenario, Solver, SolverConfiguration};
//!
//! let specs = vec![
//!     LayerSpec::new("LDPE", 0.2, 10, 100.0).with_partition_coefficient(1.0),
//!     LayerSpec::new(CONTACT_PHASE, 2.0, 100, 0.0).with_density(0.9),
//! ];
//! let scenario = Scenario::from_specs(&specs, &Migrant::new(136.0, 25.0)).unwrap();
//! let config = SolverConfiguration::crank_nicolson(86_400.0, 1000.0).unwrap();
//!
//! let result = CrankNicolsonSolver::new().solve(&scenario, &config).unwrap();
//! assert_eq!(result.len(), 86);
//! ```
//!
//! # Error Handling
//!
//! Parameters are validated before the loop starts. Inside the loop the only
//! possible failure is `MigrationError::Solver` (singular matrix, NaN/Inf
//! state), which aborts the run.

// =================================================================================================
// Module Declarations
// =================================================================================================
mod traits;
mod scenario;
mod grid;
mod crank_nicolson;
mod tridiagonal;
mod stepper;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Deciding *when* to hand work off to Rayon is a numerical-execution concern.
// It is consulted by the curve fitting (candidate evaluation) and the EFSA
// curve generation.
//
// The threshold lives in an AtomicUsize and can be changed at runtime.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of independent evaluations above which batch operations
/// switch to parallel iteration.
///
/// Each evaluation sums an eigenvalue series over a whole time axis, so the
/// crossover is far lower than for element-wise arithmetic.
const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Runtime-configurable parallel-execution threshold.
///
/// Read via [`parallel_threshold()`], written via [`set_parallel_threshold()`].
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// Batch operations run sequentially when they have fewer items than this
/// value, and switch to Rayon when they have more, but only when the crate
/// is compiled with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use migration_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.
///
/// # Example
///
/// ```rust
/// use migration_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(64);
/// assert_eq!(parallel_threshold(), 64);
///
/// // Restore so other tests are not affected.
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that saves the current threshold on construction and restores
/// it on drop.
///
/// Only compiled in test builds.
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    /// Set the threshold to `new_value` and return a guard that will
    /// restore the previous value on drop.
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        // Bypass the public setter so that restoring never panics.
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{
    LinearSolverKind,
    SimulationResult,
    Solver,
    SolverConfiguration,
    TimeDiscretization,
};

pub use scenario::{Scenario, layer_ranges};
pub use grid::{build_grid, build_initial_concentration};
pub use crank_nicolson::{CoefficientMatrices, CrankNicolsonAssembler};
pub use tridiagonal::TridiagonalMatrix;
pub use stepper::{CrankNicolsonSolver, run_simulation, solve_timestep};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{MigrationError, MigrationResult};
use nalgebra::DVector;

/// Validate a concentration profile for numerical issues
///
/// NaN or Inf in the state means the linear solve broke down; the run is
/// aborted with `MigrationError::Solver` reporting `step`.
pub(crate) fn validate_state(state: &DVector<f64>, step: usize) -> MigrationResult<()> {
    if let Some(i) = state.iter().position(|c| c.is_nan()) {
        return Err(MigrationError::Solver {
            step,
            message: format!("NaN concentration at grid point {i}"),
        });
    }
    if let Some(i) = state.iter().position(|c| c.is_infinite()) {
        return Err(MigrationError::Solver {
            step,
            message: format!("infinite concentration at grid point {i}; check the time step"),
        });
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_value() {
        assert_eq!(DEFAULT_PARALLEL_THRESHOLD, 16);
    }

    #[test]
    fn test_get_and_set_threshold() {
        let _guard = ThresholdGuard::save(500);
        assert_eq!(parallel_threshold(), 500);
    }

    #[test]
    #[should_panic(expected = "parallel threshold must be at least 1")]
    fn test_zero_threshold_panics() {
        set_parallel_threshold(0);
    }

    #[test]
    fn test_threshold_guard_restores_previous_value() {
        let before = parallel_threshold();
        {
            let _guard = ThresholdGuard::save(42);
            assert_eq!(parallel_threshold(), 42);
        }
        assert_eq!(parallel_threshold(), before);
    }

    #[test]
    fn test_validate_state() {
        let ok = DVector::from_vec(vec![0.0, 1.0, 2.0]);
        assert!(validate_state(&ok, 1).is_ok());

        let nan = DVector::from_vec(vec![0.0, f64::NAN]);
        let err = validate_state(&nan, 3).unwrap_err();
        assert!(matches!(err, MigrationError::Solver { step: 3, .. }));

        let inf = DVector::from_vec(vec![f64::INFINITY]);
        assert!(validate_state(&inf, 1).is_err());
    }
}
