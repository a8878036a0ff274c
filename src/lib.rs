//! migration-rs: Migration Modelling for Food Contact Materials
//!
//! Estimates how much of a substance migrates from packaging polymers into
//! food or food simulants.
//!
//! # Architecture
//!
//! migration-rs is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - Material data, diffusion coefficients and layers describe the system (what to solve)
//!    - The closed-form series and the Crank-Nicolson solver provide methods (how to solve)
//!
//! 2. **Validated values, typed errors**
//!    - Every input record is validated once at the boundary
//!    - Failures are returned as [`MigrationError`] variants, never panics
//!
//! # Quick Start
//!
//! ```rust
//! use migration_rs::prelude::*;
//!
//! # fn main() -> Result<(), MigrationError> {
//! // 1. Describe the stack: LDPE film in contact with a fluid
//! let migrant = Migrant::new(136.0, 20.0);
//! let scenario = Scenario::from_specs(
//!     &[
//!         LayerSpec::new("LDPE", 0.02, 11, 661.0),
//!         LayerSpec::new(CONTACT_PHASE, 1.0, 21, 0.0).with_density(0.9),
//!     ],
//!     &migrant,
//! )?;
//!
//! // 2. Configure the solver: one day in hourly steps
//! let config = SolverConfiguration::crank_nicolson(86_400.0, 3600.0)?;
//!
//! // 3. Run and post-process
//! let result = CrankNicolsonSolver::new().solve(&scenario, &config)?;
//! let migrated = migrated_mass_over_time(&result, 1)?;
//! assert_eq!(migrated.masses.len(), 24);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: material database, Piringer diffusion coefficients, layers
//! - [`models`]: closed-form single-layer solution and the EFSA calculator
//! - [`solver`]: multilayer Crank-Nicolson solver
//! - [`analysis`]: migrated mass and diagnostics of multilayer runs
//! - [`fitting`]: diffusion coefficients from measured curves
//! - [`error`]: crate-wide error type

// Core modules
pub mod error;
pub mod physics;

pub mod models;
pub mod solver;

pub mod analysis;
pub mod fitting;

pub use error::{MigrationError, MigrationResult};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use migration_rs::prelude::*;
    //! ```
    pub use crate::error::{MigrationError, MigrationResult};
    pub use crate::physics::{CONTACT_PHASE,
                             Layer,
                             LayerSpec,
                             Migrant,
                             SimulationCase};
    pub use crate::models::{AnalyticalMigrationSolver,
                            ContactGeometry,
                            EfsaCalculator,
                            EfsaScenario,
                            SingleLayerParameters};
    pub use crate::solver::{CrankNicolsonSolver,
                            LinearSolverKind,
                            Scenario,
                            SimulationResult,
                            Solver,
                            SolverConfiguration,
                            TimeDiscretization};
    pub use crate::analysis::{migrated_mass_over_time, migrated_mass_per_layer};
    pub use crate::fitting::{CurveFittingEngine, MeasurementPoint};
}
