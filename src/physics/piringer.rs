//! Piringer diffusion-coefficient correlation
//!
//! Estimates the diffusion coefficient of a migrant in a polymer from its
//! relative molecular mass and the temperature:
//!
//! ```text
//! T   = 273.15 + T_C
//! A_P = A_Pt - tau / T
//! D_P = D_0 · exp(A_P - 0.1351·M_r^(2/3) + 0.003·M_r - E_A / (R·T))
//! ```
//!
//! with `D_0 = 1e4 cm²/s` and `R = 8.3145 J/(mol·K)`. The correlation is only
//! valid up to `M_r = 4000 Da` (inclusive).
//!
//! # Activation energy
//!
//! Two conventions for `E_A` are in use, see [`ActivationEnergy`]. Both share
//! the polymer-specific `A_P`.

use crate::error::{MigrationError, MigrationResult, ensure_positive};
use crate::physics::materials::{MaterialDatabase, PiringerCoefficients, SimulationCase};
use serde::{Deserialize, Serialize};

/// Upper validity limit of the correlation [Da]
pub const MAX_MOLECULAR_MASS: f64 = 4000.0;

/// Gas constant used by the correlation [J/(mol·K)]
pub const GAS_CONSTANT: f64 = 8.3145;

/// Pre-exponential factor [cm²/s]
pub const D_0: f64 = 1e4;

/// Reference activation temperature term `E_A / R` without the polymer shift [K]
pub const REFERENCE_ACTIVATION: f64 = 10454.0;

const ZERO_CELSIUS: f64 = 273.15;

/// Convention for the activation energy term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationEnergy {
    /// `E_A = (10454 + tau)·R`
    #[default]
    TauShifted,

    /// `E_A = 10454·R`, used by the EFSA recycling assessment
    Reference,
}

impl ActivationEnergy {
    /// `E_A` in J/mol for a polymer with activation correction `tau`
    pub fn energy(&self, tau: f64) -> f64 {
        match self {
            ActivationEnergy::TauShifted => (REFERENCE_ACTIVATION + tau) * GAS_CONSTANT,
            ActivationEnergy::Reference => REFERENCE_ACTIVATION * GAS_CONSTANT,
        }
    }
}

fn validate_molecular_mass(molecular_mass: f64) -> MigrationResult<()> {
    ensure_positive("molecular_mass", molecular_mass)?;
    if molecular_mass > MAX_MOLECULAR_MASS {
        return Err(MigrationError::InvalidMolecularMass {
            molecular_mass,
            limit: MAX_MOLECULAR_MASS,
        });
    }
    Ok(())
}

/// Absolute temperature [K] from degrees Celsius
pub fn kelvin(temperature_celsius: f64) -> MigrationResult<f64> {
    let t = ZERO_CELSIUS + temperature_celsius;
    if !t.is_finite() || t <= 0.0 {
        return Err(MigrationError::invalid(
            "temperature",
            format!("{temperature_celsius} °C is below absolute zero or not finite"),
        ));
    }
    Ok(t)
}

/// Raw correlation for explicit coefficients
///
/// # Errors
///
/// - `InvalidMolecularMass` when `molecular_mass > 4000`
/// - `InvalidParameter` for a non-positive mass or a temperature at or below 0 K
pub fn piringer_diffusion(
    molecular_mass: f64,
    temperature_celsius: f64,
    coefficients: PiringerCoefficients,
    activation: ActivationEnergy,
) -> MigrationResult<f64> {
    validate_molecular_mass(molecular_mass)?;
    let t = kelvin(temperature_celsius)?;

    let a_p = coefficients.a_pt - coefficients.tau / t;
    let e_a = activation.energy(coefficients.tau);
    let exponent = a_p - 0.1351 * molecular_mass.powf(2.0 / 3.0) + 0.003 * molecular_mass
        - e_a / (GAS_CONSTANT * t);

    Ok(D_0 * exponent.exp())
}

/// Diffusion coefficient of `material` for `case` with the default activation convention
///
/// Shorthand for [`DiffusionCoefficientEstimator::estimate`].
pub fn estimate(
    molecular_mass: f64,
    temperature_celsius: f64,
    material: &str,
    case: SimulationCase,
) -> MigrationResult<f64> {
    DiffusionCoefficientEstimator::new(case).estimate(molecular_mass, temperature_celsius, material)
}

// =================================================================================================
// Estimator
// =================================================================================================

/// Material-aware Piringer estimator
///
/// Stateless apart from its two settings; a single instance can be shared
/// across threads.
///
/// # Example
///
/// ```rust
/// use migration_rs::physics::{DiffusionCoefficientEstimator, SimulationCase};
///
/// let estimator = DiffusionCoefficientEstimator::new(SimulationCase::Worst);
/// let d = estimator.estimate(136.0, 25.0, "LDPE").unwrap();
/// assert!(d > 1e-9 && d < 1e-7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffusionCoefficientEstimator {
    pub case: SimulationCase,
    pub activation: ActivationEnergy,
}

impl DiffusionCoefficientEstimator {
    pub fn new(case: SimulationCase) -> Self {
        Self {
            case,
            activation: ActivationEnergy::default(),
        }
    }

    pub fn with_activation(mut self, activation: ActivationEnergy) -> Self {
        self.activation = activation;
        self
    }

    /// `D_P` [cm²/s] of `molecular_mass` in `material` at `temperature_celsius`
    ///
    /// # Errors
    ///
    /// - `UnknownMaterial` when `material` has no entry for the configured case
    /// - `InvalidMolecularMass` when `molecular_mass > 4000`
    pub fn estimate(
        &self,
        molecular_mass: f64,
        temperature_celsius: f64,
        material: &str,
    ) -> MigrationResult<f64> {
        let coefficients = MaterialDatabase::lookup(material, self.case)?;
        piringer_diffusion(molecular_mass, temperature_celsius, coefficients, self.activation)
    }
}
