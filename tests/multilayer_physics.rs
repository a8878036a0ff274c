//! Integration tests: layers + Crank-Nicolson solver + post-processing
//!
//! These tests check the physical behaviour of complete multilayer runs
//! rather than individual matrix entries.

use approx::assert_relative_eq;
use migration_rs::analysis::{mass_conservation_deviation, migrated_mass_over_time};
use migration_rs::physics::{CONTACT_PHASE, LayerSpec, Migrant};
use migration_rs::solver::{
    CrankNicolsonSolver, LinearSolverKind, Scenario, Solver, SolverConfiguration, run_simulation,
};

mod common;
use common::{assert_non_decreasing, max_abs, polymer_layer, receiving_mass, relative_error, two_layer_stack};

const DAY: f64 = 86_400.0;

// =================================================================================================
// Interface partitioning
// =================================================================================================

#[test]
fn test_partition_ratio_reaches_k_for_equal_diffusivity() {
    let result = run_simulation(&two_layer_stack(2.0, 1e-7, 1e-7), 200.0 * DAY, 12.0 * 3600.0).unwrap();

    let last = result.len() - 1;
    let c = result.snapshot(last).unwrap();
    assert!(relative_error(c[10] / c[11], 2.0) < 1e-3, "ratio {}", c[10] / c[11]);
    assert!((result.partitioning[(0, last)] - 1.0).abs() < 1e-3);
}

#[test]
fn test_partition_ratio_reaches_k_for_different_diffusivities() {
    let result = run_simulation(&two_layer_stack(3.0, 2e-7, 1e-7), 200.0 * DAY, 12.0 * 3600.0).unwrap();

    let last = result.len() - 1;
    let c = result.snapshot(last).unwrap();
    assert!(relative_error(c[10] / c[11], 3.0) < 1e-2, "ratio {}", c[10] / c[11]);
}

#[test]
fn test_partition_diagnostic_far_from_equilibrium_early() {
    // Almost nothing has crossed into the receiver after one short step
    let result = run_simulation(&two_layer_stack(1.0, 1e-12, 1e-12), 2.0, 1.0).unwrap();
    assert_eq!(result.partitioning.dim(), (1, 2));
    assert!(result.partitioning[(0, 0)] > 1.0);
}

// =================================================================================================
// Mass balance
// =================================================================================================

#[test]
fn test_mass_is_conserved_for_unit_partitioning() {
    let result = run_simulation(&two_layer_stack(1.0, 1e-7, 1e-7), 10.0 * DAY, 600.0).unwrap();

    let drift = mass_conservation_deviation(&result).unwrap();
    assert_eq!(drift.len(), result.len());
    assert!(max_abs(&drift) < 1.0, "max drift {} %", max_abs(&drift));
}

#[test]
fn test_migrated_mass_grows_into_receiver() {
    let layers = vec![
        polymer_layer(0.1, 11, 100.0, 1e-7, Some(1.0)),
        polymer_layer(0.2, 21, 0.0, 1e-8, None),
    ];
    let result = run_simulation(&layers, 10.0 * DAY, 1000.0).unwrap();

    let migrated = migrated_mass_over_time(&result, 10).unwrap();
    assert_eq!(migrated.time_points[0], 1000.0);
    assert!(migrated.masses[0] > 0.0);
    assert_non_decreasing(&migrated.masses, 1e-9, "receiver mass");

    // Never more than the source contained: 100 mg/kg · 0.1 cm / 10
    assert!(*migrated.masses.last().unwrap() < 1.0);
}

// =================================================================================================
// Layer split reduction
// =================================================================================================

#[test]
fn test_split_receiver_matches_single_receiver() {
    // A 0.2 cm receiver against the same receiver split into two 0.1 cm
    // layers with K = 1 and equal D. The duplicated interface points make the
    // difference first order in dx.
    let d = 1e-7;
    let mut errors = Vec::new();
    for n in [11, 21, 41] {
        let whole = vec![
            polymer_layer(0.1, n, 100.0, d, Some(1.0)),
            polymer_layer(0.2, 2 * n - 1, 0.0, d, None),
        ];
        let split = vec![
            polymer_layer(0.1, n, 100.0, d, Some(1.0)),
            polymer_layer(0.1, n, 0.0, d, Some(1.0)),
            polymer_layer(0.1, n, 0.0, d, None),
        ];

        let a = run_simulation(&whole, 2.0 * DAY, 1200.0).unwrap();
        let b = run_simulation(&split, 2.0 * DAY, 1200.0).unwrap();
        errors.push(relative_error(receiving_mass(&b, 1), receiving_mass(&a, 1)));
    }

    assert!(errors[2] < 0.02, "split error {} at n = 41", errors[2]);
    assert!(errors[0] > errors[1] && errors[1] > errors[2], "errors {errors:?}");
}

// =================================================================================================
// Solver options and scenarios
// =================================================================================================

#[test]
fn test_tridiagonal_matches_dense_for_three_layers() {
    let scenario = Scenario::new(vec![
        polymer_layer(0.02, 6, 100.0, 1e-9, Some(1.0)),
        polymer_layer(0.05, 11, 0.0, 1e-8, Some(1.0)),
        polymer_layer(1.0, 21, 0.0, 1e-2, None),
    ])
    .unwrap();
    let dense = SolverConfiguration::crank_nicolson(DAY, 1000.0).unwrap();
    let banded = dense.with_linear_solver(LinearSolverKind::Tridiagonal);

    let solver = CrankNicolsonSolver::new();
    let a = solver.solve(&scenario, &dense).unwrap();
    let b = solver.solve(&scenario, &banded).unwrap();

    assert_eq!(a.metadata("linear solver"), Some("dense LU"));
    assert_eq!(b.metadata("linear solver"), Some("tridiagonal"));
    for (x, y) in a.snapshots.iter().zip(b.snapshots.iter()) {
        assert!((x - y).abs() < 1e-8 * x.abs().max(1.0));
    }
}

#[test]
fn test_piringer_stack_with_contact_phase() {
    let migrant = Migrant::new(136.0, 40.0);
    let scenario = Scenario::from_specs(
        &[
            LayerSpec::new("LDPE", 0.02, 11, 661.0).with_partition_coefficient(1.0),
            LayerSpec::new(CONTACT_PHASE, 1.0, 21, 0.0).with_density(0.9),
        ],
        &migrant,
    )
    .unwrap();
    assert_eq!(scenario.layers()[1].diffusion_coefficient(), 1e-2);

    let config = SolverConfiguration::crank_nicolson(5.0 * DAY, 3600.0).unwrap();
    let result = CrankNicolsonSolver::new().solve(&scenario, &config).unwrap();
    assert_eq!(result.len(), 120);

    let migrated = migrated_mass_over_time(&result, 1).unwrap();
    assert_eq!(migrated.masses.len(), 120);
    for m in &migrated.masses {
        assert!(*m > 0.0 && *m < 661.0 * 0.02 / 10.0, "migrated mass {m}");
    }
}

/// Piringer with `E_A = (10454 + tau)·R`, written out
fn piringer(m: f64, t_c: f64, a_pt: f64, tau: f64) -> f64 {
    let t = 273.15 + t_c;
    let r = 8.3145;
    let a_p = a_pt - tau / t;
    1e4 * (a_p - 0.1351 * m.powf(2.0 / 3.0) + 0.003 * m - (10454.0 + tau) * r / (r * t)).exp()
}

#[test]
fn test_pet_and_lldpe_layers_use_multilayer_coefficients() {
    let migrant = Migrant::new(136.0, 40.0);
    for (material, a_pt, tau, expected) in [("PET", 6.35, 1577.0, 3.2429e-14), ("LLDPE", 9.8, 0.0, 2.4177e-8)] {
        let scenario = Scenario::from_specs(
            &[
                LayerSpec::new(material, 0.03, 11, 100.0).with_partition_coefficient(1.0),
                LayerSpec::new(CONTACT_PHASE, 1.0, 21, 0.0),
            ],
            &migrant,
        )
        .unwrap();

        let d = scenario.layers()[0].diffusion_coefficient();
        assert_relative_eq!(d, piringer(136.0, 40.0, a_pt, tau), max_relative = 1e-12);
        assert_relative_eq!(d, expected, max_relative = 1e-4);
    }
}

#[test]
fn test_unknown_material_is_reported_before_solving() {
    let migrant = Migrant::new(136.0, 40.0);
    let result = Scenario::from_specs(&[LayerSpec::new("Unobtainium", 0.02, 11, 661.0)], &migrant);
    assert!(matches!(
        result,
        Err(migration_rs::MigrationError::UnknownMaterial { .. })
    ));
}
