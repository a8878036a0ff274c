//! Helper functions for integration tests

use migration_rs::analysis::migrated_mass_per_layer;
use migration_rs::solver::SimulationResult;

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Largest absolute value of a series
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// Assert that a series never decreases by more than `tolerance`
pub fn assert_non_decreasing(values: &[f64], tolerance: f64, message: &str) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[1] >= pair[0] - tolerance,
            "{}: value {} ({}) drops below value {} ({})",
            message, i + 1, pair[1], i, pair[0]
        );
    }
}

/// Mass in all layers from `first_layer` on, final snapshot [mg/dm²]
pub fn receiving_mass(result: &SimulationResult, first_layer: usize) -> f64 {
    let per_layer = migrated_mass_per_layer(result, 1).unwrap();
    per_layer.masses[first_layer..]
        .iter()
        .map(|series| series[series.len() - 1])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }
}
