//! Performance benchmarks for the migration solvers
//!
//! # What We're Measuring
//!
//! 1. **Multilayer Crank-Nicolson**: dense LU against the Thomas algorithm
//!    on the same stack, for growing grids. The dense factorisation is
//!    `O(n³)` once plus `O(n²)` per step, the banded solve `O(n)` per step.
//!
//! 2. **Eigenvalue series**: one closed-form curve per regime. Short times
//!    need many terms, so the early part of a curve dominates.
//!
//! 3. **Curve fitting**: the full 100-candidate sweep over one measured
//!    curve, which is what `--features parallel` speeds up.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench solver_performance
//! cargo bench --bench solver_performance multilayer
//! cargo bench --features parallel --bench solver_performance fitting
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use migration_rs::fitting::{CurveFittingEngine, MeasurementPoint};
use migration_rs::models::{AnalyticalMigrationSolver, ContactGeometry, SingleLayerParameters};
use migration_rs::physics::LayerSpec;
use migration_rs::solver::{
    CrankNicolsonSolver, LinearSolverKind, Scenario, Solver, SolverConfiguration, TimeDiscretization,
};
use std::hint::black_box;

const DAY: f64 = 86_400.0;

// =================================================================================================
// Fixtures
// =================================================================================================

/// Film, tie layer and receiver with `points` grid points per layer
fn three_layer_scenario(points: usize) -> Scenario {
    let specs = [
        LayerSpec::new("LDPE", 0.02, points, 661.0)
            .with_diffusion_coefficient(1e-9)
            .with_partition_coefficient(1.0),
        LayerSpec::new("PET", 0.05, points, 0.0)
            .with_diffusion_coefficient(1e-11)
            .with_partition_coefficient(2.0),
        LayerSpec::new("LDPE", 0.1, points, 0.0).with_diffusion_coefficient(1e-9),
    ];
    let layers = specs.iter().map(|spec| spec.build().unwrap()).collect();
    Scenario::new(layers).unwrap()
}

fn reference_geometry() -> ContactGeometry {
    ContactGeometry::new(0.2827, 10.6384, 28.27, 0.2, 1.0).unwrap()
}

fn analytical_solver(fluid_volume: f64) -> AnalyticalMigrationSolver {
    let geometry = ContactGeometry::from_volumes(0.2827, 10.6384, fluid_volume).unwrap();
    AnalyticalMigrationSolver::new(SingleLayerParameters::new(661.0, 1.0, 1.0, geometry)).unwrap()
}

// =================================================================================================
// Multilayer
// =================================================================================================

/// Dense LU against the banded solver, one day in 10 minute steps
fn benchmark_multilayer(c: &mut Criterion) {
    let mut group = c.benchmark_group("multilayer");
    group.sample_size(10);

    for points in [11, 51, 201] {
        let scenario = three_layer_scenario(points);
        let dense = SolverConfiguration::crank_nicolson(DAY, 600.0).unwrap();
        let banded = dense.with_linear_solver(LinearSolverKind::Tridiagonal);
        let solver = CrankNicolsonSolver::new();

        group.bench_with_input(BenchmarkId::new("dense", points), &points, |b, _| {
            b.iter(|| solver.solve(black_box(&scenario), black_box(&dense)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("tridiagonal", points), &points, |b, _| {
            b.iter(|| solver.solve(black_box(&scenario), black_box(&banded)).unwrap())
        });
    }

    group.finish();
}

// =================================================================================================
// Analytical series
// =================================================================================================

/// 28 days in hourly samples, one fluid volume per regime
fn benchmark_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("series");
    let time = TimeDiscretization::new(28.0 * DAY, 3600.0).unwrap();

    // alpha ≈ 0.027, 2.66 and 266
    for (label, fluid_volume) in [("low", 0.28), ("mid", 28.27), ("high", 2827.0)] {
        let solver = analytical_solver(fluid_volume);
        group.bench_function(label, |b| {
            b.iter(|| solver.migrated_mass_series(black_box(1e-10), &time).unwrap())
        });
    }

    group.finish();
}

// =================================================================================================
// Curve fitting
// =================================================================================================

fn benchmark_fitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitting");
    group.sample_size(10);

    let engine = CurveFittingEngine::new(1.0, 1.0, reference_geometry(), 3600.0).unwrap();
    let truth = engine.candidates()[40];
    let days = [1.0, 3.0, 7.0, 14.0, 28.0];
    let times: Vec<f64> = days.iter().map(|d| d * DAY).collect();

    let blank = MeasurementPoint::new("Toluene", 20.0, 661.0, times.clone(), vec![0.0; days.len()]).unwrap();
    let curve = engine.simulate(truth, &blank).unwrap();
    let indices = engine
        .sample_indices(&blank, &TimeDiscretization::new(blank.last_time(), 3600.0).unwrap())
        .unwrap();
    let values = indices.iter().map(|&i| curve[i]).collect();
    let point = MeasurementPoint::new("Toluene", 20.0, 661.0, times, values).unwrap();

    group.bench_function("sweep_100_candidates", |b| {
        b.iter(|| engine.find_optimized_diffusion(black_box(&point)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, benchmark_multilayer, benchmark_series, benchmark_fitting);
criterion_main!(benches);
