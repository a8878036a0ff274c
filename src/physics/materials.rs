//! Piringer material coefficients
//!
//! Static lookup of the polymer-specific Piringer parameters `A_Pt` and
//! `tau` for the two simulation cases. The tables are read-only constants,
//! so concurrent lookups need no synchronisation.

use crate::error::{MigrationError, MigrationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conventional material name of the well-mixed fluid layer
pub const CONTACT_PHASE: &str = "Kontaktphase";

/// Diffusion coefficient assigned to the contact phase [cm²/s]
///
/// Large enough to keep the fluid well mixed on every practical time scale.
pub const CONTACT_PHASE_DIFFUSION: f64 = 1e-2;

// =================================================================================================
// Simulation case
// =================================================================================================

/// Which parameter set of the Piringer model to use
///
/// - **Worst**: upper-bound diffusion (regulatory default)
/// - **Best**: realistic diffusion, used by the EFSA recycling assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationCase {
    #[default]
    Worst,
    Best,
}

impl SimulationCase {
    pub fn name(&self) -> &'static str {
        match self {
            SimulationCase::Worst => "worst",
            SimulationCase::Best => "best",
        }
    }
}

impl fmt::Display for SimulationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimulationCase {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worst" => Ok(SimulationCase::Worst),
            "best" => Ok(SimulationCase::Best),
            other => Err(MigrationError::invalid(
                "simulation_case",
                format!("expected 'worst' or 'best', got '{other}'"),
            )),
        }
    }
}

// =================================================================================================
// Coefficients
// =================================================================================================

/// Piringer coefficients of one polymer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiringerCoefficients {
    /// Polymer-specific conductance term `A_Pt` (dimensionless)
    pub a_pt: f64,

    /// Activation-energy correction `tau` [K]
    pub tau: f64,
}

impl PiringerCoefficients {
    pub const fn new(a_pt: f64, tau: f64) -> Self {
        Self { a_pt, tau }
    }
}

const WORST_CASE: &[(&str, PiringerCoefficients)] = &[
    ("LDPE", PiringerCoefficients::new(11.7, 0.0)),
    ("HDPE", PiringerCoefficients::new(13.2, 1577.0)),
    ("LLDPE", PiringerCoefficients::new(9.8, 0.0)),
    ("PP", PiringerCoefficients::new(12.4, 1577.0)),
    ("PET", PiringerCoefficients::new(6.35, 1577.0)),
    ("PS", PiringerCoefficients::new(-0.7, 0.0)),
    ("PEN", PiringerCoefficients::new(3.7, 1577.0)),
    ("HIPS", PiringerCoefficients::new(0.1, 0.0)),
];

const BEST_CASE: &[(&str, PiringerCoefficients)] = &[
    ("LDPE", PiringerCoefficients::new(10.0, 0.0)),
    ("HDPE", PiringerCoefficients::new(10.0, 1577.0)),
    ("PP", PiringerCoefficients::new(9.4, 1577.0)),
    ("PET", PiringerCoefficients::new(3.1, 1577.0)),
    ("PS", PiringerCoefficients::new(-2.8, 0.0)),
    ("PEN", PiringerCoefficients::new(-0.34, 1577.0)),
    ("HIPS", PiringerCoefficients::new(-2.7, 0.0)),
];

// =================================================================================================
// Database
// =================================================================================================

/// Read-only material lookup
///
/// # Example
///
/// ```rust
/// use migration_rs::physics::{MaterialDatabase, SimulationCase};
///
/// let ldpe = MaterialDatabase::lookup("LDPE", SimulationCase::Worst).unwrap();
/// assert_eq!(ldpe.a_pt, 11.7);
/// assert!(MaterialDatabase::lookup("LLDPE", SimulationCase::Best).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialDatabase;

impl MaterialDatabase {
    fn table(case: SimulationCase) -> &'static [(&'static str, PiringerCoefficients)] {
        match case {
            SimulationCase::Worst => WORST_CASE,
            SimulationCase::Best => BEST_CASE,
        }
    }

    /// Coefficients of `material` for `case`
    ///
    /// Names are matched exactly. A missing entry is an error, never a default.
    pub fn lookup(material: &str, case: SimulationCase) -> MigrationResult<PiringerCoefficients> {
        Self::table(case)
            .iter()
            .find(|(name, _)| *name == material)
            .map(|(_, coefficients)| *coefficients)
            .ok_or_else(|| MigrationError::UnknownMaterial {
                material: material.to_string(),
                case,
            })
    }

    /// Whether `material` has coefficients for `case`
    pub fn contains(material: &str, case: SimulationCase) -> bool {
        Self::table(case).iter().any(|(name, _)| *name == material)
    }

    /// Material names available for `case`, in table order
    pub fn materials(case: SimulationCase) -> impl Iterator<Item = &'static str> {
        Self::table(case).iter().map(|(name, _)| *name)
    }
}
