//! Analytical single-layer migration
//!
//! Closed-form migrated mass for one polymer layer with a uniform initial
//! concentration `c_P0` in contact with a well-mixed fluid:
//!
//! ```text
//! m_F(t) = c_P0 · rho_P · d_P · f(alpha, D_P·t/d_P²) / 10        [mg/dm²]
//! ```
//!
//! with `f` the released fraction of [`EigenSeries`]. The factor `1/10`
//! converts `mg/kg · g/cm³ · cm` into mg/dm².
//!
//! # Geometry
//!
//! `alpha` is either `(1/K_PF)·(V_F/V_P)` or `(1/K_PF)·(d_F/d_P)`, see
//! [`AlphaDefinition`]. Both agree when `V = A·d` holds; [`ContactGeometry`]
//! builds consistent pairs from either volumes or thicknesses.
//!
//! # Example
//!
//! ```rust
//! use migration_rs::models::{AnalyticalMigrationSolver, ContactGeometry, SingleLayerParameters};
//! use migration_rs::solver::TimeDiscretization;
//!
//! let geometry = ContactGeometry::from_volumes(0.2827, 10.6384, 28.27).unwrap();
//! let params = SingleLayerParameters::new(661.0, 1.0, 1.0, geometry);
//! let solver = AnalyticalMigrationSolver::new(params).unwrap();
//!
//! let time = TimeDiscretization::new(10.0 * 86_400.0, 86_400.0).unwrap();
//! let series = solver.migrated_mass_series(1e-9, &time).unwrap();
//! assert_eq!(series.len(), 11);
//! assert!(series[10] > series[1]);
//! ```

use crate::error::{MigrationError, MigrationResult, ensure_non_negative, ensure_positive};
use crate::models::series::EigenSeries;
use crate::physics::Migrant;
use crate::solver::TimeDiscretization;
use log::debug;
use serde::{Deserialize, Serialize};

/// Unit conversion of `mg/kg · g/cm³ · cm` to mg/dm²
pub const MG_PER_DM2: f64 = 0.1;

/// cm² per dm²
const CM2_PER_DM2: f64 = 100.0;

// =================================================================================================
// Geometry
// =================================================================================================

/// Which ratio defines the capacity ratio `alpha`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaDefinition {
    /// `(1/K_PF)·(V_F/V_P)`
    #[default]
    VolumeRatio,
    /// `(1/K_PF)·(d_F/d_P)`
    ThicknessRatio,
}

/// Contact area, volumes and thicknesses of a polymer/fluid pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactGeometry {
    /// Contact area `A_PF` [dm²]
    pub area: f64,
    /// `V_P` [cm³]
    pub polymer_volume: f64,
    /// `V_F` [cm³]
    pub fluid_volume: f64,
    /// `d_P` [cm]
    pub polymer_thickness: f64,
    /// `d_F` [cm]
    pub fluid_thickness: f64,
}

impl ContactGeometry {
    /// Geometry with all five values given explicitly
    pub fn new(
        area: f64,
        polymer_volume: f64,
        fluid_volume: f64,
        polymer_thickness: f64,
        fluid_thickness: f64,
    ) -> MigrationResult<Self> {
        let geometry = Self {
            area,
            polymer_volume,
            fluid_volume,
            polymer_thickness,
            fluid_thickness,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Thicknesses derived as `d = V / (A·100)`
    pub fn from_volumes(area: f64, polymer_volume: f64, fluid_volume: f64) -> MigrationResult<Self> {
        ensure_positive("area", area)?;
        Self::new(
            area,
            polymer_volume,
            fluid_volume,
            polymer_volume / (area * CM2_PER_DM2),
            fluid_volume / (area * CM2_PER_DM2),
        )
    }

    /// Volumes derived as `V = d·A·100`
    pub fn from_thicknesses(area: f64, polymer_thickness: f64, fluid_thickness: f64) -> MigrationResult<Self> {
        ensure_positive("area", area)?;
        Self::new(
            area,
            polymer_thickness * area * CM2_PER_DM2,
            fluid_thickness * area * CM2_PER_DM2,
            polymer_thickness,
            fluid_thickness,
        )
    }

    pub fn validate(&self) -> MigrationResult<()> {
        ensure_positive("area", self.area)?;
        ensure_positive("polymer_volume", self.polymer_volume)?;
        ensure_positive("fluid_volume", self.fluid_volume)?;
        ensure_positive("polymer_thickness", self.polymer_thickness)?;
        ensure_positive("fluid_thickness", self.fluid_thickness)
    }

    /// Capacity ratio `alpha` for partition coefficient `k_pf`
    pub fn alpha(&self, k_pf: f64, definition: AlphaDefinition) -> f64 {
        let ratio = match definition {
            AlphaDefinition::VolumeRatio => self.fluid_volume / self.polymer_volume,
            AlphaDefinition::ThicknessRatio => self.fluid_thickness / self.polymer_thickness,
        };
        ratio / k_pf
    }
}

// =================================================================================================
// Parameters
// =================================================================================================

/// Inputs of the closed-form solution, except the diffusion coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleLayerParameters {
    /// `c_P0` [mg/kg]
    pub initial_concentration: f64,
    /// `rho_P` [g/cm³]
    pub polymer_density: f64,
    /// `K_PF`
    pub partition_coefficient: f64,
    pub geometry: ContactGeometry,
    #[serde(default)]
    pub alpha_definition: AlphaDefinition,
}

impl SingleLayerParameters {
    pub fn new(
        initial_concentration: f64,
        polymer_density: f64,
        partition_coefficient: f64,
        geometry: ContactGeometry,
    ) -> Self {
        Self {
            initial_concentration,
            polymer_density,
            partition_coefficient,
            geometry,
            alpha_definition: AlphaDefinition::default(),
        }
    }

    pub fn with_alpha_definition(mut self, definition: AlphaDefinition) -> Self {
        self.alpha_definition = definition;
        self
    }

    pub fn with_initial_concentration(mut self, initial_concentration: f64) -> Self {
        self.initial_concentration = initial_concentration;
        self
    }

    pub fn validate(&self) -> MigrationResult<()> {
        ensure_non_negative("initial_concentration", self.initial_concentration)?;
        ensure_positive("polymer_density", self.polymer_density)?;
        ensure_positive("partition_coefficient", self.partition_coefficient)?;
        self.geometry.validate()
    }

    pub fn alpha(&self) -> f64 {
        self.geometry.alpha(self.partition_coefficient, self.alpha_definition)
    }

    /// Total migrant load of the polymer per contact area [mg/dm²]
    pub fn available_mass(&self) -> f64 {
        self.initial_concentration * self.polymer_density * self.geometry.polymer_thickness * MG_PER_DM2
    }
}

// =================================================================================================
// Temperature profile
// =================================================================================================

/// Constant temperature between `start` and `end` [s]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSegment {
    pub start: f64,
    pub end: f64,
    /// [°C]
    pub temperature: f64,
}

/// Piecewise-constant storage temperature
///
/// Segments are contiguous and start at `t = 0`; the last one extends to the
/// end of any simulation. Serialized as the plain segment list and validated
/// on deserialization, so a profile is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TemperatureSegment>", into = "Vec<TemperatureSegment>")]
pub struct TemperatureProfile {
    segments: Vec<TemperatureSegment>,
}

impl TryFrom<Vec<TemperatureSegment>> for TemperatureProfile {
    type Error = MigrationError;

    fn try_from(segments: Vec<TemperatureSegment>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<TemperatureProfile> for Vec<TemperatureSegment> {
    fn from(profile: TemperatureProfile) -> Self {
        profile.segments
    }
}

impl TemperatureProfile {
    pub fn new(segments: Vec<TemperatureSegment>) -> MigrationResult<Self> {
        let profile = Self { segments };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> MigrationResult<()> {
        let Some(first) = self.segments.first() else {
            return Err(MigrationError::invalid("temperature_profile", "needs at least one segment"));
        };
        if first.start != 0.0 {
            return Err(MigrationError::invalid("temperature_profile", "first segment must start at t = 0"));
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if !(segment.end > segment.start) || !segment.temperature.is_finite() {
                return Err(MigrationError::invalid(
                    "temperature_profile",
                    format!("segment {i} is empty or has no finite temperature"),
                ));
            }
            if i > 0 && segment.start != self.segments[i - 1].end {
                return Err(MigrationError::invalid(
                    "temperature_profile",
                    format!("segment {i} does not start where segment {} ends", i - 1),
                ));
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[TemperatureSegment] {
        &self.segments
    }

    /// Index of the segment active at `time`
    pub fn segment_index(&self, time: f64) -> usize {
        self.segments
            .iter()
            .position(|segment| time < segment.end)
            .unwrap_or(self.segments.len() - 1)
    }

    /// Temperature at `time` [°C]
    pub fn temperature_at(&self, time: f64) -> f64 {
        self.segments[self.segment_index(time)].temperature
    }
}

// =================================================================================================
// Solver
// =================================================================================================

/// Closed-form single-layer solver
///
/// Holds the validated parameters; the diffusion coefficient is an argument
/// of every evaluation so that one solver serves whole candidate sweeps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticalMigrationSolver {
    parameters: SingleLayerParameters,
    series: EigenSeries,
}

impl AnalyticalMigrationSolver {
    pub fn new(parameters: SingleLayerParameters) -> MigrationResult<Self> {
        parameters.validate()?;
        let series = EigenSeries::new(parameters.alpha())?;
        Ok(Self { parameters, series })
    }

    pub fn parameters(&self) -> &SingleLayerParameters {
        &self.parameters
    }

    pub fn series(&self) -> &EigenSeries {
        &self.series
    }

    /// Migrated mass at `time` [mg/dm²] for diffusion coefficient `d_p` [cm²/s]
    pub fn mass_at(&self, d_p: f64, time: f64) -> MigrationResult<f64> {
        ensure_positive("diffusion_coefficient", d_p)?;
        ensure_non_negative("time", time)?;
        let d = self.parameters.geometry.polymer_thickness;
        let fraction = self.series.released_fraction(d_p * time / (d * d))?;
        Ok(self.parameters.available_mass() * fraction)
    }

    /// Migrated mass at `k·dt` for `k = 0..=steps` [mg/dm²]
    pub fn migrated_mass_series(&self, d_p: f64, time: &TimeDiscretization) -> MigrationResult<Vec<f64>> {
        time.validate()?;
        time.sample_times()
            .into_iter()
            .map(|t| self.mass_at(d_p, t))
            .collect()
    }

    /// Migrated mass under a piecewise-constant temperature
    ///
    /// Every sample uses the diffusion coefficient of the segment active at
    /// its time, estimated for `material` with the mass, case and activation
    /// convention of `migrant` (its own temperature is ignored).
    pub fn migrated_mass_series_with_profile(
        &self,
        time: &TimeDiscretization,
        profile: &TemperatureProfile,
        material: &str,
        migrant: &Migrant,
    ) -> MigrationResult<Vec<f64>> {
        time.validate()?;
        profile.validate()?;

        let diffusion: Vec<f64> = profile
            .segments()
            .iter()
            .map(|segment| {
                Migrant {
                    temperature: segment.temperature,
                    ..*migrant
                }
                .diffusion_in(material)
            })
            .collect::<MigrationResult<_>>()?;

        time.sample_times()
            .into_iter()
            .map(|t| self.mass_at(diffusion[profile.segment_index(t)], t))
            .collect()
    }

    /// Largest `c_P0` whose peak migrated mass equals `specific_migration_limit` [mg/dm²]
    ///
    /// Multiplicative fixed-point iteration from 1 mg/kg, stopping when the
    /// peak is within `1e-6` mg/dm² of the limit.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` when nothing migrates within `time`
    /// - `NonConvergence` after 300 iterations
    pub fn max_initial_concentration(
        &self,
        d_p: f64,
        specific_migration_limit: f64,
        time: &TimeDiscretization,
    ) -> MigrationResult<f64> {
        const TOLERANCE: f64 = 1e-6;
        const MAX_ITERATIONS: usize = 300;

        ensure_positive("specific_migration_limit", specific_migration_limit)?;

        let mut guess = 1.0;
        let mut deviation = f64::INFINITY;
        for iteration in 0..MAX_ITERATIONS {
            let trial = Self::new(self.parameters.with_initial_concentration(guess))?;
            let peak = trial
                .migrated_mass_series(d_p, time)?
                .into_iter()
                .fold(0.0, f64::max);
            if peak <= 0.0 {
                return Err(MigrationError::invalid(
                    "time",
                    "no migration within the simulated time, the limit cannot be reached",
                ));
            }

            deviation = (peak - specific_migration_limit).abs();
            if deviation < TOLERANCE {
                debug!(
                    "Maximum c_P0 = {} mg/kg for SML {} mg/dm² after {} iterations",
                    guess,
                    specific_migration_limit,
                    iteration + 1
                );
                return Ok(guess);
            }
            guess *= specific_migration_limit / peak;
        }

        Err(MigrationError::NonConvergence {
            terms: MAX_ITERATIONS,
            last_increment: deviation,
        })
    }
}
