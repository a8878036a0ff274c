//! Diffusion coefficients from measured migration curves
//!
//! [`CurveFittingEngine`] runs a brute-force grid search: for every candidate
//! `D_P` the closed-form single-layer model is evaluated over the measurement
//! period, sampled at the measurement times and compared by the sum of squared
//! residuals. The candidate with the smallest error wins; ties go to the
//! first candidate.
//!
//! # Forward model
//!
//! - time axis `k·dt`, `k = 0..=floor(t_last/dt)`, with `t_last` the latest
//!   measurement
//! - baseline corrected: the value at `t = 0` is subtracted
//! - sample index of a measurement at `t` is `floor(t/dt)`; times that do not
//!   lie on the grid are floored and logged
//!
//! # Example
//!
//! ```rust
//! use migration_rs::fitting::{CurveFittingEngine, MeasurementPoint};
//! use migration_rs::models::ContactGeometry;
//!
//! let geometry = ContactGeometry::from_volumes(0.2827, 10.6384, 28.27).unwrap();
//! let engine = CurveFittingEngine::new(0.9045, 1.0, geometry, 3600.0).unwrap();
//!
//! let point = MeasurementPoint::from_fluid_concentrations(
//!     "Toluene", 20.0, 500.0,
//!     &[1.0, 3.0, 7.0], &[2.0, 4.5, 8.0],
//!     &geometry, 0.9,
//! ).unwrap();
//!
//! let fit = engine.find_optimized_diffusion(&point).unwrap();
//! assert!(fit.diffusion_coefficient >= 1e-12 && fit.diffusion_coefficient <= 1e-6);
//! assert_eq!(fit.errors.len(), 100);
//! ```

use crate::error::{MigrationError, MigrationResult, ensure_non_negative, ensure_positive};
use crate::models::{AnalyticalMigrationSolver, ContactGeometry, SingleLayerParameters};
use crate::solver::TimeDiscretization;
use log::{debug, trace, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default number of log-spaced candidates
pub const DEFAULT_CANDIDATE_COUNT: usize = 100;

/// Default candidate range, `log10(D_P)` [cm²/s]
pub const DEFAULT_CANDIDATE_EXPONENTS: (f64, f64) = (-12.0, -6.0);

// =================================================================================================
// Measurements
// =================================================================================================

/// Measured migration curve of one surrogate at one temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub surrogate: String,
    /// [°C]
    pub temperature: f64,
    /// `c_P0` [mg/kg]
    pub initial_concentration: f64,
    /// [s]
    pub times: Vec<f64>,
    /// Migrated mass [mg/dm²]
    pub values: Vec<f64>,
}

impl MeasurementPoint {
    pub fn new(
        surrogate: impl Into<String>,
        temperature: f64,
        initial_concentration: f64,
        times: Vec<f64>,
        values: Vec<f64>,
    ) -> MigrationResult<Self> {
        let point = Self {
            surrogate: surrogate.into(),
            temperature,
            initial_concentration,
            times,
            values,
        };
        point.validate()?;
        Ok(point)
    }

    /// Measurement from fluid concentrations `c_F` [mg/kg] taken on `days`
    ///
    /// The fluid mass is `m_F = V_F · rho_F · 1e-3` kg and the migrated mass
    /// `c_F / A_PF · m_F` [mg/dm²].
    pub fn from_fluid_concentrations(
        surrogate: impl Into<String>,
        temperature: f64,
        initial_concentration: f64,
        days: &[f64],
        fluid_concentrations: &[f64],
        geometry: &ContactGeometry,
        fluid_density: f64,
    ) -> MigrationResult<Self> {
        geometry.validate()?;
        ensure_positive("fluid_density", fluid_density)?;

        let fluid_mass = geometry.fluid_volume * fluid_density * 1e-3;
        Self::new(
            surrogate,
            temperature,
            initial_concentration,
            days.iter().map(|d| d * SECONDS_PER_DAY).collect(),
            fluid_concentrations
                .iter()
                .map(|c| c / geometry.area * fluid_mass)
                .collect(),
        )
    }

    pub fn validate(&self) -> MigrationResult<()> {
        ensure_non_negative("initial_concentration", self.initial_concentration)?;
        if self.times.is_empty() || self.times.len() != self.values.len() {
            return Err(MigrationError::invalid(
                "measurement",
                format!(
                    "needs matching, non-empty times and values (got {} and {})",
                    self.times.len(),
                    self.values.len()
                ),
            ));
        }
        for &t in &self.times {
            ensure_non_negative("measurement time", t)?;
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(MigrationError::invalid("measurement", "values must be finite"));
        }
        ensure_positive("last measurement time", self.last_time())
    }

    /// Latest measurement time [s]
    pub fn last_time(&self) -> f64 {
        self.times.iter().copied().fold(0.0, f64::max)
    }
}

// =================================================================================================
// Engine
// =================================================================================================

/// Result of a grid search
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Best candidate [cm²/s]
    pub diffusion_coefficient: f64,
    /// Its sum of squared residuals
    pub sse: f64,
    /// Sum of squared residuals of every candidate, in candidate order
    pub errors: Vec<f64>,
}

/// Grid search for `D_P` against the closed-form single-layer model
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFittingEngine {
    polymer_density: f64,
    partition_coefficient: f64,
    geometry: ContactGeometry,
    time_step: f64,
    candidates: Vec<f64>,
}

impl CurveFittingEngine {
    /// Engine with the default candidate grid
    pub fn new(
        polymer_density: f64,
        partition_coefficient: f64,
        geometry: ContactGeometry,
        time_step: f64,
    ) -> MigrationResult<Self> {
        ensure_positive("polymer_density", polymer_density)?;
        ensure_positive("partition_coefficient", partition_coefficient)?;
        ensure_positive("time_step", time_step)?;
        geometry.validate()?;

        Ok(Self {
            polymer_density,
            partition_coefficient,
            geometry,
            time_step,
            candidates: Self::default_candidates().to_vec(),
        })
    }

    /// 100 log-spaced values from `1e-12` to `1e-6` cm²/s
    pub fn default_candidates() -> Array1<f64> {
        let (low, high) = DEFAULT_CANDIDATE_EXPONENTS;
        Array1::logspace(10.0, low, high, DEFAULT_CANDIDATE_COUNT)
    }

    pub fn with_candidates(mut self, candidates: Vec<f64>) -> MigrationResult<Self> {
        if candidates.is_empty() {
            return Err(MigrationError::invalid("candidates", "at least one candidate is required"));
        }
        for &d in &candidates {
            ensure_positive("candidate diffusion coefficient", d)?;
        }
        self.candidates = candidates;
        Ok(self)
    }

    pub fn candidates(&self) -> &[f64] {
        &self.candidates
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    fn model(&self, point: &MeasurementPoint) -> MigrationResult<(AnalyticalMigrationSolver, TimeDiscretization)> {
        let parameters = SingleLayerParameters::new(
            point.initial_concentration,
            self.polymer_density,
            self.partition_coefficient,
            self.geometry,
        );
        let solver = AnalyticalMigrationSolver::new(parameters)?;
        let time = TimeDiscretization::new(point.last_time(), self.time_step)?;
        Ok((solver, time))
    }

    /// Baseline-corrected simulated curve on `k·dt`, `k = 0..=floor(t_last/dt)` [mg/dm²]
    pub fn simulate(&self, d_p: f64, point: &MeasurementPoint) -> MigrationResult<Vec<f64>> {
        point.validate()?;
        let (solver, time) = self.model(point)?;
        baseline_corrected(solver.migrated_mass_series(d_p, &time)?)
    }

    /// Curve indices of the measurement times
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when a measurement lies beyond the simulated curve.
    pub fn sample_indices(&self, point: &MeasurementPoint, time: &TimeDiscretization) -> MigrationResult<Vec<usize>> {
        let steps = time.steps();
        point
            .times
            .iter()
            .map(|&t| {
                let index = time.sample_index(t);
                if index > steps {
                    return Err(MigrationError::invalid(
                        "measurement time",
                        format!("{t} s lies beyond the simulated {} s", time.total_time),
                    ));
                }
                let on_grid = index as f64 * self.time_step;
                if (on_grid - t).abs() > 1e-9 * t.max(1.0) {
                    warn!(
                        "Measurement at {} s of {} is not on the {} s grid, compared at {} s",
                        t, point.surrogate, self.time_step, on_grid
                    );
                }
                Ok(index)
            })
            .collect()
    }

    /// Sum of squared residuals of candidate `d_p`
    pub fn sum_squared_error(&self, d_p: f64, point: &MeasurementPoint) -> MigrationResult<f64> {
        point.validate()?;
        let (solver, time) = self.model(point)?;
        let indices = self.sample_indices(point, &time)?;
        squared_error(&solver, &time, &indices, d_p, point)
    }

    /// Best candidate for `point`
    pub fn find_optimized_diffusion(&self, point: &MeasurementPoint) -> MigrationResult<FitOutcome> {
        point.validate()?;
        let (solver, time) = self.model(point)?;
        let indices = self.sample_indices(point, &time)?;

        let evaluate = |d_p: &f64| squared_error(&solver, &time, &indices, *d_p, point);
        let errors: Vec<f64> = if self.candidates.len() > crate::solver::parallel_threshold() {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                self.candidates
                    .par_iter()
                    .map(evaluate)
                    .collect::<MigrationResult<_>>()?
            }
            #[cfg(not(feature = "parallel"))]
            {
                self.candidates.iter().map(evaluate).collect::<MigrationResult<_>>()?
            }
        } else {
            self.candidates.iter().map(evaluate).collect::<MigrationResult<_>>()?
        };

        for (d_p, sse) in self.candidates.iter().zip(&errors) {
            trace!("D_P = {:e} cm²/s: SSE = {:e}", d_p, sse);
        }

        // First minimum wins
        let mut best = 0;
        for (i, sse) in errors.iter().enumerate() {
            if *sse < errors[best] {
                best = i;
            }
        }

        debug!(
            "Fitted {} at {} °C: D_P = {:e} cm²/s (SSE {:e}, {} candidates)",
            point.surrogate,
            point.temperature,
            self.candidates[best],
            errors[best],
            errors.len()
        );

        Ok(FitOutcome {
            diffusion_coefficient: self.candidates[best],
            sse: errors[best],
            errors,
        })
    }
}

fn baseline_corrected(mut series: Vec<f64>) -> MigrationResult<Vec<f64>> {
    let Some(&baseline) = series.first() else {
        return Err(MigrationError::invalid("time", "empty simulated curve"));
    };
    series.iter_mut().for_each(|m| *m -= baseline);
    Ok(series)
}

fn squared_error(
    solver: &AnalyticalMigrationSolver,
    time: &TimeDiscretization,
    indices: &[usize],
    d_p: f64,
    point: &MeasurementPoint,
) -> MigrationResult<f64> {
    let curve = baseline_corrected(solver.migrated_mass_series(d_p, time)?)?;
    Ok(indices
        .iter()
        .zip(&point.values)
        .map(|(&i, measured)| (curve[i] - measured).powi(2))
        .sum())
}

// =================================================================================================
// Registry
// =================================================================================================

/// Fitted diffusion coefficient of one measurement point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedDiffusion {
    pub surrogate: String,
    /// [°C]
    pub temperature: f64,
    /// `c_P0` [mg/kg]
    pub initial_concentration: f64,
    /// `D_calc` [cm²/s]
    pub diffusion_coefficient: f64,
}

impl FittedDiffusion {
    pub fn from_fit(point: &MeasurementPoint, outcome: &FitOutcome) -> Self {
        Self {
            surrogate: point.surrogate.clone(),
            temperature: point.temperature,
            initial_concentration: point.initial_concentration,
            diffusion_coefficient: outcome.diffusion_coefficient,
        }
    }
}

/// Append-only table of fitted coefficients, unique per (surrogate, temperature)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffusionRegistry {
    entries: Vec<FittedDiffusion>,
}

impl DiffusionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` unless its (surrogate, temperature) is already present
    ///
    /// Returns whether the entry was added.
    pub fn insert(&mut self, entry: FittedDiffusion) -> bool {
        if self.get(&entry.surrogate, entry.temperature).is_some() {
            debug!(
                "{} at {} °C already registered, entry skipped",
                entry.surrogate, entry.temperature
            );
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn get(&self, surrogate: &str, temperature: f64) -> Option<&FittedDiffusion> {
        self.entries
            .iter()
            .find(|e| e.surrogate == surrogate && e.temperature == temperature)
    }

    pub fn entries(&self) -> &[FittedDiffusion] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
