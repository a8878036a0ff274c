//! Reference set-ups with known behaviour
//!
//! The LDPE case is the classic single-layer check: 0.2 cm film with
//! 661 mg/kg of a 136 Da migrant, in contact with 28.27 cm³ of simulant over
//! 0.2827 dm².

use migration_rs::models::{AnalyticalMigrationSolver, ContactGeometry, SingleLayerParameters};
use migration_rs::physics::{Layer, LayerSpec};

/// Polymer layer with a fixed diffusion coefficient
pub fn polymer_layer(thickness: f64, nx: usize, c0: f64, d: f64, k: Option<f64>) -> Layer {
    let mut spec = LayerSpec::new("LDPE", thickness, nx, c0).with_diffusion_coefficient(d);
    spec.partition_coefficient = k;
    spec.build().unwrap()
}

/// 0.1 cm source with 100 mg/kg next to an empty 0.1 cm layer, 11 points each
pub fn two_layer_stack(k: f64, d_source: f64, d_receiver: f64) -> Vec<Layer> {
    vec![
        polymer_layer(0.1, 11, 100.0, d_source, Some(k)),
        polymer_layer(0.1, 11, 0.0, d_receiver, None),
    ]
}

/// Single LDPE layer of the reference case
pub fn ldpe_reference_solver() -> AnalyticalMigrationSolver {
    let geometry = ContactGeometry::new(0.2827, 10.6384, 28.27, 0.2, 1.0).unwrap();
    AnalyticalMigrationSolver::new(SingleLayerParameters::new(661.0, 1.0, 1.0, geometry)).unwrap()
}

/// Total migrant load of the reference case per contact area [mg/dm²]
pub fn ldpe_reference_available_mass() -> f64 {
    661.0 * 1.0 * 10.6384 / 1000.0 / 0.2827
}
