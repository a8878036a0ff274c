//! Numerical solver traits and types
//!
//! # Design Philosophy
//!
//! - [`TimeDiscretization`] is the single time-axis convention shared by the
//!   multilayer solver and the closed-form series
//! - [`SolverConfiguration`] carries the numerical choices (HOW to solve)
//! - [`SimulationResult`] holds the concentration history and its bookkeeping
//!
//! # Time axis
//!
//! `steps() = floor(t_max / dt)`, evaluated with a relative tolerance of
//! `1e-9` so that ratios such as `28 d / 100 s` are not lost to rounding.
//! Times are always computed as `k·dt`, never accumulated.

use crate::error::{MigrationResult, ensure_positive};
use crate::physics::Layer;
use crate::solver::scenario::Scenario;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const STEP_TOLERANCE: f64 = 1e-9;

// =================================================================================================
// Time discretization
// =================================================================================================

/// Total simulated time and fixed step size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDiscretization {
    /// Simulated time `t_max` [s]
    pub total_time: f64,

    /// Step size `dt` [s]
    pub time_step: f64,
}

impl TimeDiscretization {
    /// Validated time axis
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when either value is not finite and strictly
    /// positive. `dt > t_max` is valid and gives zero steps.
    pub fn new(total_time: f64, time_step: f64) -> MigrationResult<Self> {
        let time = Self {
            total_time,
            time_step,
        };
        time.validate()?;
        Ok(time)
    }

    pub fn validate(&self) -> MigrationResult<()> {
        ensure_positive("total_time", self.total_time)?;
        ensure_positive("time_step", self.time_step)?;
        Ok(())
    }

    /// Number of time steps, `floor(t_max / dt)`
    pub fn steps(&self) -> usize {
        self.sample_index(self.total_time)
    }

    /// Index of the last sample at or before `time`, `floor(time / dt)`
    pub fn sample_index(&self, time: f64) -> usize {
        let ratio = time / self.time_step;
        let nearest = ratio.round();
        if (ratio - nearest).abs() <= STEP_TOLERANCE * nearest.max(1.0) {
            nearest as usize
        } else {
            ratio.floor() as usize
        }
    }

    /// Time reached after each step: `(k+1)·dt` for `k = 0..steps`
    pub fn step_times(&self) -> Vec<f64> {
        (1..=self.steps())
            .map(|k| k as f64 * self.time_step)
            .collect()
    }

    /// Sample times including the start: `k·dt` for `k = 0..=steps`
    pub fn sample_times(&self) -> Vec<f64> {
        (0..=self.steps())
            .map(|k| k as f64 * self.time_step)
            .collect()
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Linear solver used for `A·C_next = B·C` in every time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    /// Dense LU decomposition of `A`, factorised once per run
    #[default]
    DenseLu,

    /// Thomas algorithm on the three bands of `A`
    Tridiagonal,
}

impl LinearSolverKind {
    pub fn name(&self) -> &'static str {
        match self {
            LinearSolverKind::DenseLu => "dense LU",
            LinearSolverKind::Tridiagonal => "tridiagonal",
        }
    }
}

/// Configuration for the numerical solver
///
/// # Example
///
/// ```rust
/// use migration_rs::solver::{LinearSolverKind, SolverConfiguration};
///
/// let config = SolverConfiguration::crank_nicolson(10.0 * 86_400.0, 1000.0)
///     .unwrap()
///     .with_linear_solver(LinearSolverKind::Tridiagonal);
/// assert_eq!(config.time.steps(), 864);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfiguration {
    pub time: TimeDiscretization,

    #[serde(default)]
    pub linear_solver: LinearSolverKind,
}

impl SolverConfiguration {
    pub fn new(time: TimeDiscretization) -> Self {
        Self {
            time,
            linear_solver: LinearSolverKind::default(),
        }
    }

    /// Crank-Nicolson run over `total_time` with steps of `time_step`
    pub fn crank_nicolson(total_time: f64, time_step: f64) -> MigrationResult<Self> {
        Ok(Self::new(TimeDiscretization::new(total_time, time_step)?))
    }

    pub fn with_linear_solver(mut self, linear_solver: LinearSolverKind) -> Self {
        self.linear_solver = linear_solver;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> MigrationResult<()> {
        self.time.validate()
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// Numerical method for a multilayer [`Scenario`]
pub trait Solver {
    /// Run the full time loop
    ///
    /// The run either completes or fails; no partial history is returned.
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> MigrationResult<SimulationResult>;

    fn name(&self) -> &str;
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Concentration history of one multilayer run
///
/// Row `k` of [`snapshots`](Self::snapshots) is the state at
/// `time_points[k] = (k+1)·dt`; the `t = 0` state is kept separately in
/// [`initial_concentration`](Self::initial_concentration).
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Resolved layers, source first
    pub layers: Vec<Layer>,

    /// Grid coordinates `x` [cm]
    pub grid: Array1<f64>,

    /// `C_init` [mg/kg]
    pub initial_concentration: Array1<f64>,

    /// Concentrations after each step, shape `(steps, grid points)`
    pub snapshots: Array2<f64>,

    /// Time of each snapshot [s]
    pub time_points: Vec<f64>,

    /// Trapezoidal integral of every snapshot over the whole grid
    pub total_masses: Vec<f64>,

    /// Interface diagnostics, shape `(interfaces, steps)`; see
    /// [`check_partitioning`](crate::analysis::check_partitioning)
    pub partitioning: Array2<f64>,

    /// Step size [s]
    pub time_step: f64,

    /// Free-form run information (solver name, step count, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.snapshots.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot `k`, i.e. the state at `(k+1)·dt`
    pub fn snapshot(&self, k: usize) -> Option<ArrayView1<'_, f64>> {
        (k < self.len()).then(|| self.snapshots.row(k))
    }

    /// State at the end of the run
    pub fn final_state(&self) -> Option<ArrayView1<'_, f64>> {
        self.len().checked_sub(1).and_then(|k| self.snapshot(k))
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
