//! Eigenvalue series of the single-layer migration solution
//!
//! The closed-form solution for a polymer slab of thickness `d_P` in contact
//! with a well-mixed fluid reads
//!
//! ```text
//! m_F(t) / m_F(∞) = 1 - Σ_{n≥1} c_n · exp(-q_n² · F)        F = D_P·t / d_P²
//! ```
//!
//! where the eigenvalues `q_n` and the weights `c_n` depend on the
//! fluid/polymer capacity ratio `alpha = (1/K_PF)·(V_F/V_P)`. Instead of the
//! exact transcendental roots, three asymptotic regimes are used:
//!
//! | Regime | Range              | `q_n`                         | `c_n`                                  |
//! |--------|--------------------|-------------------------------|----------------------------------------|
//! | Low    | `alpha < 0.1`      | `n·π / (1 + alpha)`           | `2α(1+α) / (1 + α + α²q_n²)`           |
//! | Mid    | `0.1 ≤ alpha ≤ 10` | `(n - α / (2(1+α)))·π`        | `2α(1+α) / (1 + α + α²q_n²)`           |
//! | High   | `alpha > 10`       | `(2n - 1)·π / 2`              | `2 / q_n²`                             |
//!
//! Every caller (analytical solver, curve fitting, EFSA) goes through
//! [`EigenSeries`]; unit conventions are applied by the callers.

use crate::error::{MigrationError, MigrationResult, ensure_non_negative, ensure_positive};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lower regime threshold for `alpha`
pub const LOW_ALPHA: f64 = 0.1;

/// Upper regime threshold for `alpha`
pub const HIGH_ALPHA: f64 = 10.0;

/// Summation stops once a term adds less than this
pub const SERIES_TOLERANCE: f64 = 1e-6;

/// Hard cap on the number of summed terms
pub const MAX_SERIES_TERMS: usize = 1_000_000;

// =================================================================================================
// Regimes
// =================================================================================================

/// Asymptotic regime of the capacity ratio `alpha`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlphaRegime {
    /// `alpha < 0.1`: small fluid capacity, the fluid saturates
    Low,
    /// `0.1 <= alpha <= 10`
    Mid,
    /// `alpha > 10`: fluid acts as an infinite sink
    High,
}

impl AlphaRegime {
    pub fn classify(alpha: f64) -> Self {
        if alpha < LOW_ALPHA {
            AlphaRegime::Low
        } else if alpha > HIGH_ALPHA {
            AlphaRegime::High
        } else {
            AlphaRegime::Mid
        }
    }

    /// `q_n` for `n >= 1`
    pub fn eigenvalue(&self, n: usize, alpha: f64) -> f64 {
        let n = n as f64;
        match self {
            AlphaRegime::Low => n * PI / (1.0 + alpha),
            AlphaRegime::Mid => (n - alpha / (2.0 * (1.0 + alpha))) * PI,
            AlphaRegime::High => (2.0 * n - 1.0) * PI / 2.0,
        }
    }

    /// Series weight `c_n` belonging to eigenvalue `q`
    pub fn coefficient(&self, q: f64, alpha: f64) -> f64 {
        match self {
            AlphaRegime::High => 2.0 / (q * q),
            AlphaRegime::Low | AlphaRegime::Mid => {
                2.0 * alpha * (1.0 + alpha) / (1.0 + alpha + alpha * alpha * q * q)
            }
        }
    }

    /// Fraction of the initial polymer load found in the fluid at equilibrium
    pub fn equilibrium_fraction(&self, alpha: f64) -> f64 {
        match self {
            AlphaRegime::High => 1.0,
            AlphaRegime::Low | AlphaRegime::Mid => alpha / (1.0 + alpha),
        }
    }
}

// =================================================================================================
// Series evaluator
// =================================================================================================

/// Eigenvalue series for one fixed `alpha`
///
/// # Example
///
/// ```rust
/// use migration_rs::models::{AlphaRegime, EigenSeries};
///
/// let series = EigenSeries::new(2.5).unwrap();
/// assert_eq!(series.regime(), AlphaRegime::Mid);
///
/// let early = series.released_fraction(0.01).unwrap();
/// // Long times approach the equilibrium share alpha/(1+alpha)
/// let late = series.released_fraction(50.0).unwrap();
/// assert!(early < late);
/// assert!((late - 2.5 / 3.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenSeries {
    alpha: f64,
    regime: AlphaRegime,
}

impl EigenSeries {
    pub fn new(alpha: f64) -> MigrationResult<Self> {
        ensure_positive("alpha", alpha)?;
        Ok(Self {
            alpha,
            regime: AlphaRegime::classify(alpha),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn regime(&self) -> AlphaRegime {
        self.regime
    }

    /// `Σ c_n·exp(-q_n²·F)` for the Fourier number `F = D·t/d²`
    ///
    /// Terms are added until one contributes less than [`SERIES_TOLERANCE`]
    /// (that last term included).
    ///
    /// # Errors
    ///
    /// `NonConvergence` after [`MAX_SERIES_TERMS`] terms.
    pub fn sum(&self, fourier: f64) -> MigrationResult<f64> {
        ensure_non_negative("fourier", fourier)?;

        let mut total = 0.0;
        let mut increment = f64::INFINITY;
        for n in 1..=MAX_SERIES_TERMS {
            let q = self.regime.eigenvalue(n, self.alpha);
            increment = self.regime.coefficient(q, self.alpha) * (-q * q * fourier).exp();
            total += increment;
            if increment.abs() < SERIES_TOLERANCE {
                return Ok(total);
            }
        }

        Err(MigrationError::NonConvergence {
            terms: MAX_SERIES_TERMS,
            last_increment: increment,
        })
    }

    /// Released share of the initial polymer load, never negative
    ///
    /// Truncating the series can push `1 - Σ` slightly below zero at very
    /// short times; such values are clamped to zero.
    pub fn released_fraction(&self, fourier: f64) -> MigrationResult<f64> {
        let remaining = 1.0 - self.sum(fourier)?;
        Ok((self.regime.equilibrium_fraction(self.alpha) * remaining).max(0.0))
    }
}
