//! Closed-form migration models
//!
//! Everything in this module evaluates the same eigenvalue series of a single
//! polymer slab in contact with a well-mixed fluid; the callers differ only in
//! how they scale the released fraction.
//!
//! # Available Models
//!
//! ## [`EigenSeries`]: the shared series
//!
//! Regime selection ([`AlphaRegime`]), term-by-term summation with an
//! iteration cap, and the released fraction `m_F(t)/m_P,0`.
//!
//! ## [`AnalyticalMigrationSolver`]: migrated mass over time
//!
//! Migrated mass in mg/dm² for a polymer layer, at constant temperature or
//! under a piecewise-constant [`TemperatureProfile`], plus the largest initial
//! concentration that keeps migration below a specific migration limit.
//!
//! ## [`EfsaCalculator`]: recycling assessment
//!
//! `C_mod` and `eta_min` according to the EFSA 2024 approach for PET
//! recycling processes.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod series;
pub mod single_layer;
pub mod efsa;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use series::{AlphaRegime, EigenSeries, MAX_SERIES_TERMS, SERIES_TOLERANCE};
pub use single_layer::{
    AlphaDefinition,
    AnalyticalMigrationSolver,
    ContactGeometry,
    SingleLayerParameters,
    TemperatureProfile,
    TemperatureSegment,
};
pub use efsa::{
    EfsaCalculator,
    EfsaCurves,
    EfsaParameters,
    EfsaScenario,
    LiteratureComparison,
    SURROGATES,
    Surrogate,
};
