//! Error types shared by every module of the crate
//!
//! All fallible operations return [`MigrationResult`]. Errors are returned to
//! the immediate caller and never logged or swallowed inside the library.

use crate::physics::SimulationCase;
use thiserror::Error;

/// Errors raised by the migration models and solvers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// Material name (or material/case combination) missing from the database
    #[error("unknown material '{material}' for the {case} case")]
    UnknownMaterial {
        material: String,
        case: SimulationCase,
    },

    /// Piringer correlation is not valid above this molecular mass
    #[error("molecular mass {molecular_mass} Da exceeds the Piringer validity limit of {limit} Da")]
    InvalidMolecularMass { molecular_mass: f64, limit: f64 },

    /// Non-physical or geometrically inconsistent input
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Linear solve failed inside the time loop
    #[error("solver failure at step {step}: {message}")]
    Solver { step: usize, message: String },

    /// Eigenvalue series did not reach the convergence threshold
    #[error("eigenvalue series did not converge after {terms} terms (last increment {last_increment:e})")]
    NonConvergence { terms: usize, last_increment: f64 },
}

impl MigrationError {
    /// Shorthand for [`MigrationError::InvalidParameter`]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Fails unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> MigrationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MigrationError::invalid(
            name,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}

/// Fails unless `value` is finite and not negative.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> MigrationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MigrationError::invalid(
            name,
            format!("must be finite and >= 0, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = MigrationError::invalid("thickness", "must be > 0");
        assert_eq!(err.to_string(), "invalid parameter `thickness`: must be > 0");
    }

    #[test]
    fn test_unknown_material_message_names_case() {
        let err = MigrationError::UnknownMaterial {
            material: "PVC".to_string(),
            case: SimulationCase::Best,
        };
        assert_eq!(err.to_string(), "unknown material 'PVC' for the best case");
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("x", 1e-12).is_ok());
        assert!(ensure_positive("x", 0.0).is_err());
        assert!(ensure_positive("x", -1.0).is_err());
        assert!(ensure_positive("x", f64::NAN).is_err());
        assert!(ensure_positive("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_ensure_non_negative() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -0.1).is_err());
    }
}
