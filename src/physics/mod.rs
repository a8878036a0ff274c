//! Material physics
//!
//! Everything that describes *what* migrates through *what*, independent of
//! how the transport equations are solved:
//!
//! - **Materials**: Piringer coefficients per polymer and simulation case
//! - **Piringer**: the diffusion-coefficient correlation `D_P(M_r, T)`
//! - **Layers**: slabs of a multilayer stack, resolved against a migrant
//!
//! # Architecture
//!
//! Physics is kept **separate from the numerics**:
//! - `physics` provides parameters (diffusion coefficients, partitioning, densities)
//! - [`solver`](crate::solver) provides the Crank-Nicolson method
//! - [`models`](crate::models) provides closed-form solutions
//!
//! # Example
//!
//! ```rust
//! use migration_rs::physics::{estimate, SimulationCase};
//!
//! let d_p = estimate(136.0, 25.0, "LDPE", SimulationCase::Worst).unwrap();
//! assert!(d_p > 0.0);
//! ```

// module declaration
pub mod materials;
pub mod piringer;
pub mod layer;

// re-export commonly used types for convenience
pub use materials::{
    CONTACT_PHASE,
    CONTACT_PHASE_DIFFUSION,
    MaterialDatabase,
    PiringerCoefficients,
    SimulationCase,
};
pub use piringer::{
    ActivationEnergy,
    DiffusionCoefficientEstimator,
    MAX_MOLECULAR_MASS,
    estimate,
    piringer_diffusion,
};
pub use layer::{Layer, LayerSpec, Migrant, resolve_stack};
