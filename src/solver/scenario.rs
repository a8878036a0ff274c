//! Simulation scenario definition
//!
//! A scenario is the ordered layer stack of one run: the migrant source
//! first, the contact phase (if any) last.
use crate::error::{MigrationError, MigrationResult};
use crate::physics::{Layer, LayerSpec, Migrant, resolve_stack};
use log::warn;
use std::ops::Range;

/// Multilayer simulation scenario
///
/// # Design
///
/// The same scenario can be solved with different linear solvers or time
/// steps. This is the "WHAT to solve" (not "HOW to solve").
///
/// # Examples
///
/// ```rust
/// use migration_rs::physics::{LayerSpec, Migrant, CONTACT_PHASE};
/// use migration_rs::solver::Scenario;
///
/// let specs = vec![
///     LayerSpec::new("LDPE", 0.2, 10, 100.0).with_partition_coefficient(1.0),
///     LayerSpec::new(CONTACT_PHASE, 2.0, 100, 0.0).with_density(0.9),
/// ];
/// let scenario = Scenario::from_specs(&specs, &Migrant::new(136.0, 25.0)).unwrap();
/// assert_eq!(scenario.total_points(), 110);
/// assert_eq!(scenario.interface_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    layers: Vec<Layer>,
}

impl Scenario {
    /// Create a scenario from resolved layers
    pub fn new(layers: Vec<Layer>) -> MigrationResult<Self> {
        let scenario = Self { layers };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Resolve `specs` against `migrant` and create the scenario
    pub fn from_specs(specs: &[LayerSpec], migrant: &Migrant) -> MigrationResult<Self> {
        Self::new(resolve_stack(specs, migrant)?)
    }

    /// Verifying scenario content
    ///
    /// A contact phase anywhere but last only triggers a warning: the
    /// post-processing always treats the last layer as the receiving phase.
    pub fn validate(&self) -> MigrationResult<()> {
        if self.layers.is_empty() {
            return Err(MigrationError::invalid("layers", "a scenario needs at least one layer"));
        }

        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.is_contact_phase() && i != last {
                warn!(
                    "contact phase found at position {} of {}; migrated mass is evaluated on the last layer '{}'",
                    i,
                    self.layers.len(),
                    self.layers[last].material()
                );
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Sum of all `nx`
    pub fn total_points(&self) -> usize {
        self.layers.iter().map(Layer::grid_points).sum()
    }

    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(Layer::thickness).sum()
    }

    pub fn interface_count(&self) -> usize {
        self.layers.len() - 1
    }

    /// Grid index range of every layer
    pub fn layer_ranges(&self) -> Vec<Range<usize>> {
        layer_ranges(&self.layers)
    }
}

/// Grid index range of every layer in `layers`
pub fn layer_ranges(layers: &[Layer]) -> Vec<Range<usize>> {
    let mut start = 0;
    layers
        .iter()
        .map(|layer| {
            let range = start..start + layer.grid_points();
            start = range.end;
            range
        })
        .collect()
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::CONTACT_PHASE;

    fn layer(material: &str, thickness: f64, nx: usize) -> Layer {
        LayerSpec::new(material, thickness, nx, 0.0)
            .with_diffusion_coefficient(1e-8)
            .build()
            .unwrap()
    }

    #[test]
    fn test_scenario_creation() {
        let scenario = Scenario::new(vec![layer("LDPE", 0.1, 5), layer(CONTACT_PHASE, 1.0, 7)]).unwrap();
        assert_eq!(scenario.total_points(), 12);
        assert_eq!(scenario.interface_count(), 1);
        assert!((scenario.total_thickness() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scenario_rejected() {
        assert!(Scenario::new(Vec::new()).is_err());
    }

    #[test]
    fn test_misplaced_contact_phase_is_not_an_error() {
        let scenario = Scenario::new(vec![layer(CONTACT_PHASE, 1.0, 4), layer("LDPE", 0.1, 5)]);
        assert!(scenario.is_ok());
    }

    #[test]
    fn test_layer_ranges() {
        let scenario = Scenario::new(vec![
            layer("LDPE", 0.1, 3),
            layer("PP", 0.1, 4),
            layer(CONTACT_PHASE, 1.0, 2),
        ])
        .unwrap();
        assert_eq!(scenario.layer_ranges(), vec![0..3, 3..7, 7..9]);
    }

    #[test]
    fn test_unknown_material_in_specs() {
        let specs = vec![LayerSpec::new("PVC", 0.1, 5, 10.0)];
        assert!(Scenario::from_specs(&specs, &Migrant::new(100.0, 25.0)).is_err());
    }
}
