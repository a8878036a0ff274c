//! Layer definitions for multilayer stacks
//!
//! A stack is described in two stages:
//!
//! 1. [`LayerSpec`] is the user-facing record. The partition coefficient and the
//!    diffusion coefficient may be left unset.
//! 2. [`Layer`] is the resolved, immutable value the solver works with. Its
//!    diffusion coefficient is always known.
//!
//! Resolution happens once, before any solve, through [`LayerSpec::resolve`]
//! with the [`Migrant`] of the run:
//!
//! - an explicit diffusion coefficient is kept as is
//! - the contact phase gets [`CONTACT_PHASE_DIFFUSION`]
//! - every other material is estimated with the Piringer correlation
//!
//! # Example
//!
//! ```rust
//! use migration_rs::physics::{LayerSpec, Migrant, CONTACT_PHASE};
//!
//! let migrant = Migrant::new(136.0, 25.0);
//! let polymer = LayerSpec::new("LDPE", 0.2, 10, 100.0)
//!     .resolve(&migrant)
//!     .unwrap();
//! let fluid = LayerSpec::new(CONTACT_PHASE, 2.0, 100, 0.0)
//!     .with_density(0.9)
//!     .resolve(&migrant)
//!     .unwrap();
//!
//! assert!(polymer.diffusion_coefficient() < fluid.diffusion_coefficient());
//! assert!(fluid.is_contact_phase());
//! ```

use crate::error::{MigrationError, MigrationResult, ensure_non_negative, ensure_positive};
use crate::physics::materials::{CONTACT_PHASE, CONTACT_PHASE_DIFFUSION, SimulationCase};
use crate::physics::piringer::{ActivationEnergy, DiffusionCoefficientEstimator};
use serde::{Deserialize, Serialize};

fn default_density() -> f64 {
    1.0
}

// =================================================================================================
// Migrant
// =================================================================================================

/// Substance and conditions of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Migrant {
    /// Relative molecular mass `M_r` [Da]
    pub molecular_mass: f64,

    /// Temperature [°C]
    pub temperature: f64,

    #[serde(default)]
    pub case: SimulationCase,

    #[serde(default)]
    pub activation: ActivationEnergy,
}

impl Migrant {
    pub fn new(molecular_mass: f64, temperature: f64) -> Self {
        Self {
            molecular_mass,
            temperature,
            case: SimulationCase::default(),
            activation: ActivationEnergy::default(),
        }
    }

    pub fn with_case(mut self, case: SimulationCase) -> Self {
        self.case = case;
        self
    }

    pub fn with_activation(mut self, activation: ActivationEnergy) -> Self {
        self.activation = activation;
        self
    }

    /// Piringer estimator configured for this migrant's case and convention
    pub fn estimator(&self) -> DiffusionCoefficientEstimator {
        DiffusionCoefficientEstimator::new(self.case).with_activation(self.activation)
    }

    /// Diffusion coefficient of this migrant in `material` [cm²/s]
    pub fn diffusion_in(&self, material: &str) -> MigrationResult<f64> {
        self.estimator()
            .estimate(self.molecular_mass, self.temperature, material)
    }
}

// =================================================================================================
// Layer specification
// =================================================================================================

/// Unresolved layer description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Material name, looked up in the material database when needed
    pub material: String,

    /// Thickness `d` [cm]
    pub thickness: f64,

    /// Number of grid points `nx` (both layer faces included)
    pub grid_points: usize,

    /// Partition coefficient towards the next layer, `None` means 1.0
    #[serde(default)]
    pub partition_coefficient: Option<f64>,

    /// Initial concentration [mg/kg]
    #[serde(default)]
    pub initial_concentration: f64,

    /// Density [g/cm³]
    #[serde(default = "default_density")]
    pub density: f64,

    /// Diffusion coefficient [cm²/s], estimated from the migrant when `None`
    #[serde(default)]
    pub diffusion_coefficient: Option<f64>,
}

impl LayerSpec {
    pub fn new(
        material: impl Into<String>,
        thickness: f64,
        grid_points: usize,
        initial_concentration: f64,
    ) -> Self {
        Self {
            material: material.into(),
            thickness,
            grid_points,
            partition_coefficient: None,
            initial_concentration,
            density: default_density(),
            diffusion_coefficient: None,
        }
    }

    pub fn with_partition_coefficient(mut self, k: f64) -> Self {
        self.partition_coefficient = Some(k);
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_diffusion_coefficient(mut self, d: f64) -> Self {
        self.diffusion_coefficient = Some(d);
        self
    }

    pub fn is_contact_phase(&self) -> bool {
        self.material == CONTACT_PHASE
    }

    /// Check the geometric and physical fields
    pub fn validate(&self) -> MigrationResult<()> {
        ensure_positive("thickness", self.thickness)?;
        if self.grid_points < 2 {
            return Err(MigrationError::invalid(
                "grid_points",
                format!("layer '{}' needs at least 2 grid points, got {}", self.material, self.grid_points),
            ));
        }
        if let Some(k) = self.partition_coefficient {
            ensure_positive("partition_coefficient", k)?;
        }
        ensure_non_negative("initial_concentration", self.initial_concentration)?;
        ensure_positive("density", self.density)?;
        if let Some(d) = self.diffusion_coefficient {
            ensure_positive("diffusion_coefficient", d)?;
        }
        Ok(())
    }

    /// Resolve the diffusion coefficient for `migrant` and freeze the layer
    ///
    /// # Errors
    ///
    /// Errors of [`LayerSpec::validate`], plus any estimator error
    /// (`UnknownMaterial`, `InvalidMolecularMass`).
    pub fn resolve(&self, migrant: &Migrant) -> MigrationResult<Layer> {
        self.validate()?;
        let diffusion = match self.diffusion_coefficient {
            Some(d) => d,
            None if self.is_contact_phase() => CONTACT_PHASE_DIFFUSION,
            None => migrant.diffusion_in(&self.material)?,
        };
        Ok(self.freeze(diffusion))
    }

    /// Freeze a layer whose diffusion coefficient does not depend on a migrant
    ///
    /// Works for an explicit diffusion coefficient or for the contact phase.
    pub fn build(&self) -> MigrationResult<Layer> {
        self.validate()?;
        let diffusion = match self.diffusion_coefficient {
            Some(d) => d,
            None if self.is_contact_phase() => CONTACT_PHASE_DIFFUSION,
            None => {
                return Err(MigrationError::invalid(
                    "diffusion_coefficient",
                    format!("layer '{}' has no diffusion coefficient; resolve it with a migrant", self.material),
                ));
            }
        };
        Ok(self.freeze(diffusion))
    }

    fn freeze(&self, diffusion_coefficient: f64) -> Layer {
        Layer {
            material: self.material.clone(),
            thickness: self.thickness,
            grid_points: self.grid_points,
            partition_coefficient: self.partition_coefficient,
            initial_concentration: self.initial_concentration,
            density: self.density,
            diffusion_coefficient,
        }
    }
}

/// Resolve a whole stack against one migrant
pub fn resolve_stack(specs: &[LayerSpec], migrant: &Migrant) -> MigrationResult<Vec<Layer>> {
    specs.iter().map(|spec| spec.resolve(migrant)).collect()
}

// =================================================================================================
// Resolved layer
// =================================================================================================

/// Immutable layer with a known diffusion coefficient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    material: String,
    thickness: f64,
    grid_points: usize,
    partition_coefficient: Option<f64>,
    initial_concentration: f64,
    density: f64,
    diffusion_coefficient: f64,
}

impl Layer {
    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn grid_points(&self) -> usize {
        self.grid_points
    }

    pub fn partition_coefficient(&self) -> Option<f64> {
        self.partition_coefficient
    }

    /// Partition coefficient applied at the interface to the next layer
    pub fn interface_partition(&self) -> f64 {
        self.partition_coefficient.unwrap_or(1.0)
    }

    pub fn initial_concentration(&self) -> f64 {
        self.initial_concentration
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn diffusion_coefficient(&self) -> f64 {
        self.diffusion_coefficient
    }

    /// Grid spacing `d / (nx - 1)` [cm]
    pub fn dx(&self) -> f64 {
        self.thickness / (self.grid_points - 1) as f64
    }

    pub fn is_contact_phase(&self) -> bool {
        self.material == CONTACT_PHASE
    }
}
