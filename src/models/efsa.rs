//! EFSA modelled concentration and minimum decontamination efficiency
//!
//! For a recycled-PET input stream the EFSA 2024 approach back-solves the
//! polymer concentration `C_mod` that makes one year of migration at 25 °C
//! just reach a migration criterion, then derives the decontamination
//! efficiency a recycling process needs:
//!
//! ```text
//! C_mod   = (M_crit · m_food/A) / (rho_P · d_P · f(alpha, D_P·t/d_P²))     [mg/kg]
//! eta_min = clamp(1 - C_mod / c_ref, 0, 1) · 100                           [%]
//! ```
//!
//! `f` is the released fraction of [`EigenSeries`] with
//! `alpha = (1/K_PF)·(d_F/d_P)`. All defaults live in [`EfsaParameters`].

use crate::error::{MigrationError, MigrationResult, ensure_non_negative, ensure_positive};
use crate::models::series::EigenSeries;
use crate::physics::{ActivationEnergy, DiffusionCoefficientEstimator, SimulationCase};
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =================================================================================================
// Scenario and migration criterion
// =================================================================================================

/// EFSA exposure scenario (Table 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EfsaScenario {
    A,
    B,
    C,
}

impl EfsaScenario {
    pub const ALL: [EfsaScenario; 3] = [EfsaScenario::A, EfsaScenario::B, EfsaScenario::C];

    /// Migration criterion [µg/kg food] for both mass brackets
    fn criteria(&self) -> (f64, f64) {
        match self {
            EfsaScenario::A => (0.0481, 0.0962),
            EfsaScenario::B => (0.156, 0.312),
            EfsaScenario::C => (0.625, 1.250),
        }
    }

    /// Criterion for a migrant of mass `molecular_mass` [µg/kg food]
    ///
    /// Masses up to and including `bracket` use the lower value.
    pub fn migration_criterion(&self, molecular_mass: f64, bracket: f64) -> f64 {
        let (small, large) = self.criteria();
        if molecular_mass <= bracket { small } else { large }
    }
}

impl fmt::Display for EfsaScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EfsaScenario::A => "A",
            EfsaScenario::B => "B",
            EfsaScenario::C => "C",
        };
        f.write_str(name)
    }
}

impl FromStr for EfsaScenario {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(EfsaScenario::A),
            "B" => Ok(EfsaScenario::B),
            "C" => Ok(EfsaScenario::C),
            other => Err(MigrationError::invalid(
                "scenario",
                format!("expected A, B or C, got '{other}'"),
            )),
        }
    }
}

// =================================================================================================
// Surrogates
// =================================================================================================

/// Surrogate contaminant with its literature `C_mod` values (EFSA 2024, Table D.1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surrogate {
    pub name: &'static str,
    /// [Da]
    pub molecular_mass: f64,
    /// `C_mod` for scenarios A, B, C [mg/kg]
    pub literature_cmod: [f64; 3],
}

impl Surrogate {
    pub fn literature(&self, scenario: EfsaScenario) -> f64 {
        match scenario {
            EfsaScenario::A => self.literature_cmod[0],
            EfsaScenario::B => self.literature_cmod[1],
            EfsaScenario::C => self.literature_cmod[2],
        }
    }
}

pub const SURROGATES: [Surrogate; 8] = [
    Surrogate { name: "Toluene", molecular_mass: 92.1, literature_cmod: [0.04, 0.13, 0.51] },
    Surrogate { name: "Chlorobenzene", molecular_mass: 112.6, literature_cmod: [0.05, 0.15, 0.60] },
    Surrogate { name: "Chloroform", molecular_mass: 119.4, literature_cmod: [0.05, 0.16, 0.63] },
    Surrogate { name: "Methyl salicylate", molecular_mass: 152.2, literature_cmod: [0.12, 0.40, 1.60] },
    Surrogate { name: "Phenylcyclohexane", molecular_mass: 160.3, literature_cmod: [0.13, 0.42, 1.69] },
    Surrogate { name: "Benzophenone", molecular_mass: 182.2, literature_cmod: [0.15, 0.49, 1.96] },
    Surrogate { name: "Lindane", molecular_mass: 290.8, literature_cmod: [0.28, 0.92, 3.67] },
    Surrogate { name: "Methyl stearate", molecular_mass: 298.5, literature_cmod: [0.29, 0.95, 3.82] },
];

// =================================================================================================
// Parameters
// =================================================================================================

/// EFSA default exposure conditions (Appendix D)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfsaParameters {
    /// [°C]
    pub temperature: f64,
    pub partition_coefficient: f64,
    /// [s]
    pub contact_time: f64,
    /// [g/cm³]
    pub polymer_density: f64,
    /// [cm]
    pub polymer_thickness: f64,
    /// [cm], 1 kg food on 6 dm²
    pub food_thickness: f64,
    pub material: String,
    pub case: SimulationCase,
    pub activation: ActivationEnergy,
    /// [kg/cm²]
    pub food_mass_per_area: f64,
    /// Upper bound of the low-mass criterion bracket [Da]
    pub mass_bracket: f64,
    /// Reference input concentration `c_ref` [mg/kg]
    pub reference_concentration: f64,
}

impl Default for EfsaParameters {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            partition_coefficient: 1.0,
            contact_time: 365.0 * 24.0 * 3600.0,
            polymer_density: 1.375,
            polymer_thickness: 300e-4,
            food_thickness: 16666.7e-4,
            material: "PET".to_string(),
            case: SimulationCase::Best,
            activation: ActivationEnergy::Reference,
            food_mass_per_area: 1.0 / 600.0,
            mass_bracket: 150.0,
            reference_concentration: 3.0,
        }
    }
}

impl EfsaParameters {
    pub fn validate(&self) -> MigrationResult<()> {
        ensure_positive("partition_coefficient", self.partition_coefficient)?;
        ensure_positive("contact_time", self.contact_time)?;
        ensure_positive("polymer_density", self.polymer_density)?;
        ensure_positive("polymer_thickness", self.polymer_thickness)?;
        ensure_positive("food_thickness", self.food_thickness)?;
        ensure_positive("food_mass_per_area", self.food_mass_per_area)?;
        ensure_positive("reference_concentration", self.reference_concentration)?;
        if self.material.trim().is_empty() {
            return Err(MigrationError::invalid("material", "must not be empty"));
        }
        Ok(())
    }

    /// `(1/K_PF)·(d_F/d_P)`
    pub fn alpha(&self) -> f64 {
        self.food_thickness / self.polymer_thickness / self.partition_coefficient
    }
}

// =================================================================================================
// Calculator
// =================================================================================================

/// `C_mod` and `eta_min` over a molecular-mass range
#[derive(Debug, Clone, PartialEq)]
pub struct EfsaCurves {
    pub scenario: EfsaScenario,
    /// [Da]
    pub molecular_masses: Array1<f64>,
    /// [mg/kg]
    pub cmod: Vec<f64>,
    /// [%]
    pub eta_min: Vec<f64>,
}

/// One row of [`EfsaCalculator::compare_to_literature`]
#[derive(Debug, Clone, PartialEq)]
pub struct LiteratureComparison {
    pub surrogate: &'static str,
    pub molecular_mass: f64,
    pub scenario: EfsaScenario,
    pub calculated: f64,
    pub literature: f64,
    /// `(calculated - literature) / literature · 100` [%]
    pub relative_error: f64,
}

/// Evaluates the EFSA back-calculation for one parameter set
#[derive(Debug, Clone)]
pub struct EfsaCalculator {
    parameters: EfsaParameters,
    series: EigenSeries,
    estimator: DiffusionCoefficientEstimator,
}

impl EfsaCalculator {
    pub fn new(parameters: EfsaParameters) -> MigrationResult<Self> {
        parameters.validate()?;
        let series = EigenSeries::new(parameters.alpha())?;
        let estimator = DiffusionCoefficientEstimator::new(parameters.case).with_activation(parameters.activation);
        Ok(Self {
            parameters,
            series,
            estimator,
        })
    }

    pub fn parameters(&self) -> &EfsaParameters {
        &self.parameters
    }

    /// Piringer diffusion coefficient of the configured material [cm²/s]
    pub fn diffusion_coefficient(&self, molecular_mass: f64) -> MigrationResult<f64> {
        self.estimator
            .estimate(molecular_mass, self.parameters.temperature, &self.parameters.material)
    }

    /// `rho_P · d_P · f` after the contact time [g/cm²]
    pub fn sum_term(&self, molecular_mass: f64) -> MigrationResult<f64> {
        let d_p = self.diffusion_coefficient(molecular_mass)?;
        let d = self.parameters.polymer_thickness;
        let fraction = self
            .series
            .released_fraction(d_p * self.parameters.contact_time / (d * d))?;
        Ok(self.parameters.polymer_density * d * fraction)
    }

    /// Modelled input concentration `C_mod` [mg/kg]
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when nothing migrates within the contact time.
    pub fn compute_cmod(&self, molecular_mass: f64, scenario: EfsaScenario) -> MigrationResult<f64> {
        let criterion = scenario.migration_criterion(molecular_mass, self.parameters.mass_bracket) / 1000.0;
        let numerator = criterion * self.parameters.food_mass_per_area;
        let denominator = self.sum_term(molecular_mass)? / 1000.0;
        if denominator <= 0.0 {
            return Err(MigrationError::invalid(
                "contact_time",
                format!("no migration of M_r = {molecular_mass} Da within the contact time"),
            ));
        }
        Ok(numerator / denominator)
    }

    /// Minimum decontamination efficiency for `c_ref` [%]
    pub fn compute_eta_min(&self, molecular_mass: f64, scenario: EfsaScenario, c_ref: f64) -> MigrationResult<f64> {
        ensure_positive("c_ref", c_ref)?;
        let cmod = self.compute_cmod(molecular_mass, scenario)?;
        Ok(eta_from_cmod(cmod, c_ref))
    }

    /// Concentration left in the polymer after decontamination with `efficiency` in `[0, 1]`
    pub fn residual_concentration(&self, efficiency: f64) -> MigrationResult<f64> {
        ensure_non_negative("efficiency", efficiency)?;
        if efficiency > 1.0 {
            return Err(MigrationError::invalid("efficiency", format!("must be <= 1, got {efficiency}")));
        }
        Ok(self.parameters.reference_concentration * (1.0 - efficiency))
    }

    /// `C_mod` and `eta_min` on `points` evenly spaced masses in `[mr_min, mr_max]`
    ///
    /// Fewer than two points are raised to two.
    pub fn generate_curves(
        &self,
        mr_min: f64,
        mr_max: f64,
        points: usize,
        scenario: EfsaScenario,
        c_ref: f64,
    ) -> MigrationResult<EfsaCurves> {
        ensure_positive("mr_min", mr_min)?;
        ensure_positive("c_ref", c_ref)?;
        if mr_max < mr_min {
            return Err(MigrationError::invalid(
                "mr_max",
                format!("must not be below mr_min ({mr_max} < {mr_min})"),
            ));
        }
        let points = points.max(2);
        let molecular_masses = Array1::linspace(mr_min, mr_max, points);

        debug!(
            "EFSA curves: scenario {}, {} masses in [{}, {}] Da, material {}",
            scenario, points, mr_min, mr_max, self.parameters.material
        );

        let evaluate = |m: &f64| self.compute_cmod(*m, scenario);
        let cmod: Vec<f64> = if points > crate::solver::parallel_threshold() {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                molecular_masses
                    .to_vec()
                    .par_iter()
                    .map(evaluate)
                    .collect::<MigrationResult<_>>()?
            }
            #[cfg(not(feature = "parallel"))]
            {
                molecular_masses.iter().map(evaluate).collect::<MigrationResult<_>>()?
            }
        } else {
            molecular_masses.iter().map(evaluate).collect::<MigrationResult<_>>()?
        };

        let eta_min = cmod.iter().map(|c| eta_from_cmod(*c, c_ref)).collect();

        Ok(EfsaCurves {
            scenario,
            molecular_masses,
            cmod,
            eta_min,
        })
    }

    /// Calculated `C_mod` against Table D.1 for every surrogate and scenario
    pub fn compare_to_literature(&self) -> MigrationResult<Vec<LiteratureComparison>> {
        let mut rows = Vec::with_capacity(SURROGATES.len() * EfsaScenario::ALL.len());
        for surrogate in &SURROGATES {
            for scenario in EfsaScenario::ALL {
                let calculated = self.compute_cmod(surrogate.molecular_mass, scenario)?;
                let literature = surrogate.literature(scenario);
                rows.push(LiteratureComparison {
                    surrogate: surrogate.name,
                    molecular_mass: surrogate.molecular_mass,
                    scenario,
                    calculated,
                    literature,
                    relative_error: (calculated - literature) / literature * 100.0,
                });
            }
        }
        Ok(rows)
    }
}

fn eta_from_cmod(cmod: f64, c_ref: f64) -> f64 {
    (1.0 - cmod / c_ref).clamp(0.0, 1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::series::AlphaRegime;
    use approx::assert_relative_eq;

    fn defaults() -> EfsaCalculator {
        EfsaCalculator::new(EfsaParameters::default()).unwrap()
    }

    #[test]
    fn test_migration_criterion_bracket() {
        assert_eq!(EfsaScenario::A.migration_criterion(150.0, 150.0), 0.0481);
        assert_eq!(EfsaScenario::A.migration_criterion(150.1, 150.0), 0.0962);
        assert_eq!(EfsaScenario::C.migration_criterion(92.1, 150.0), 0.625);
    }

    #[test]
    fn test_scenario_from_str() {
        assert_eq!(" b ".parse::<EfsaScenario>().unwrap(), EfsaScenario::B);
        assert!("D".parse::<EfsaScenario>().is_err());
        assert_eq!(EfsaScenario::C.to_string(), "C");
    }

    #[test]
    fn test_default_geometry_is_high_alpha() {
        let calc = defaults();
        assert_eq!(calc.series.regime(), AlphaRegime::High);
        assert_relative_eq!(calc.parameters().alpha(), 16666.7 / 300.0, max_relative = 1e-12);
    }

    #[test]
    fn test_cmod_matches_manual_formula() {
        let calc = defaults();
        let m = 182.2;
        let sum_term = calc.sum_term(m).unwrap();
        let expected = (0.0962 / 1000.0 / 600.0) / (sum_term / 1000.0);
        assert_relative_eq!(calc.compute_cmod(m, EfsaScenario::A).unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_cmod_scales_with_criterion() {
        let calc = defaults();
        let a = calc.compute_cmod(200.0, EfsaScenario::A).unwrap();
        let c = calc.compute_cmod(200.0, EfsaScenario::C).unwrap();
        assert_relative_eq!(c / a, 1.250 / 0.0962, max_relative = 1e-12);
    }

    #[test]
    fn test_eta_min_is_clamped() {
        assert_eq!(eta_from_cmod(6.0, 3.0), 0.0);
        assert_eq!(eta_from_cmod(0.0, 3.0), 100.0);
        assert_relative_eq!(eta_from_cmod(0.3, 3.0), 90.0);
    }

    #[test]
    fn test_residual_concentration() {
        let calc = defaults();
        assert_relative_eq!(calc.residual_concentration(0.985).unwrap(), 0.045, max_relative = 1e-12);
        assert!(calc.residual_concentration(1.5).is_err());
    }

    #[test]
    fn test_generate_curves_enforces_two_points() {
        let calc = defaults();
        let curves = calc.generate_curves(100.0, 300.0, 1, EfsaScenario::B, 3.0).unwrap();
        assert_eq!(curves.molecular_masses.len(), 2);
        assert_eq!(curves.cmod.len(), 2);
        assert_eq!(curves.eta_min.len(), 2);
        assert_eq!(curves.molecular_masses[1], 300.0);
    }

    #[test]
    fn test_generate_curves_same_above_parallel_threshold() {
        let calc = defaults();
        let sequential = calc.generate_curves(80.0, 500.0, 8, EfsaScenario::A, 3.0).unwrap();
        let _guard = crate::solver::ThresholdGuard::save(2);
        let fanned_out = calc.generate_curves(80.0, 500.0, 8, EfsaScenario::A, 3.0).unwrap();
        assert_eq!(sequential, fanned_out);
        assert_eq!(fanned_out.cmod.len(), fanned_out.molecular_masses.len());
        assert_eq!(fanned_out.eta_min.len(), 8);
    }

    #[test]
    fn test_unknown_material_propagates() {
        let params = EfsaParameters {
            material: "Unobtainium".to_string(),
            ..EfsaParameters::default()
        };
        let calc = EfsaCalculator::new(params).unwrap();
        assert!(matches!(
            calc.compute_cmod(100.0, EfsaScenario::A),
            Err(MigrationError::UnknownMaterial { .. })
        ));
    }

    #[test]
    fn test_parameters_from_partial_json() {
        let params: EfsaParameters = serde_json::from_str(r#"{"temperature": 40.0}"#).unwrap();
        assert_eq!(params.temperature, 40.0);
        assert_eq!(params.material, "PET");
        assert!(EfsaCalculator::new(params).is_ok());
    }
}
