//! Post-processing of multilayer runs
//!
//! All quantities are derived from the stored snapshots of a
//! [`SimulationResult`]:
//!
//! - migrated mass in the receiving (last) layer over time [mg/dm²]
//! - the same integral for every layer
//! - total-mass drift in percent, a QA diagnostic
//! - interface partition ratios, a solver diagnostic
//! - the first time a migrated mass becomes detectable
//!
//! Integrals use the trapezoidal rule on the solver grid. A concentration
//! integral in mg/kg·cm times a density in g/cm³ is µg/cm², which the factor
//! `1/10` turns into mg/dm².

use crate::error::{MigrationError, MigrationResult};
use crate::physics::Layer;
use crate::solver::{SimulationResult, layer_ranges};
use ndarray::{Array2, ArrayView1, s};
use std::ops::Range;

/// Default limit of detection for [`detection_time`] [mg/dm²]
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 1e-5;

/// Trapezoidal integral of `y` over `x`
pub fn trapezoid(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

/// Ratio of the observed to the nominal interface jump
///
/// `+inf` when the right-hand concentration is zero.
pub fn partition_ratio(c_left: f64, c_right: f64, nominal: f64) -> f64 {
    if c_right == 0.0 {
        f64::INFINITY
    } else {
        c_left / c_right / nominal
    }
}

/// Interface diagnostics for every snapshot
///
/// Entry `(i, k)` is `(C_left / C_right) / K_i` at interface `i` (between
/// layers `i` and `i+1`) in snapshot `k`, where `K_i` is the partition
/// coefficient of layer `i` (1.0 when unset). Values near 1 indicate that the
/// solver honours the partitioning condition.
pub fn check_partitioning(layers: &[Layer], snapshots: &Array2<f64>) -> Array2<f64> {
    let interfaces = layers.len().saturating_sub(1);
    let ranges = layer_ranges(layers);

    Array2::from_shape_fn((interfaces, snapshots.nrows()), |(i, k)| {
        let right = ranges[i + 1].start;
        partition_ratio(
            snapshots[(k, right - 1)],
            snapshots[(k, right)],
            layers[i].interface_partition(),
        )
    })
}

// =================================================================================================
// Migrated mass
// =================================================================================================

/// Migrated-mass series with its time axis
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedMass {
    /// [mg/dm²]
    pub masses: Vec<f64>,
    /// [s]
    pub time_points: Vec<f64>,
}

/// Migrated mass per layer with one shared time axis
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMasses {
    /// `masses[layer][sample]` [mg/dm²]
    pub masses: Vec<Vec<f64>>,
    /// [s]
    pub time_points: Vec<f64>,
}

fn sampled_snapshots(result: &SimulationResult, calc_interval: usize) -> MigrationResult<Vec<usize>> {
    if calc_interval == 0 {
        return Err(MigrationError::invalid("calc_interval", "must be at least 1"));
    }
    Ok((0..result.len()).step_by(calc_interval).collect())
}

fn layer_mass(result: &SimulationResult, snapshot: usize, range: &Range<usize>, density: f64) -> f64 {
    let x = result.grid.slice(s![range.clone()]);
    let c = result.snapshots.slice(s![snapshot, range.clone()]);
    trapezoid(x, c) * density / 10.0
}

/// Mass in the last layer for every `calc_interval`-th snapshot
///
/// Snapshot `i` lies at `(i+1)·dt`.
///
/// # Errors
///
/// `InvalidParameter` for `calc_interval == 0`.
pub fn migrated_mass_over_time(result: &SimulationResult, calc_interval: usize) -> MigrationResult<MigratedMass> {
    let indices = sampled_snapshots(result, calc_interval)?;
    let (last, layer) = match result.layers.last() {
        Some(layer) => (result.layers.len() - 1, layer),
        None => return Err(MigrationError::invalid("layers", "result has no layers")),
    };
    let ranges = layer_ranges(&result.layers);
    let range = &ranges[last];

    Ok(MigratedMass {
        masses: indices
            .iter()
            .map(|&i| layer_mass(result, i, range, layer.density()))
            .collect(),
        time_points: indices.iter().map(|&i| result.time_points[i]).collect(),
    })
}

/// Mass in every layer for every `calc_interval`-th snapshot
pub fn migrated_mass_per_layer(result: &SimulationResult, calc_interval: usize) -> MigrationResult<LayerMasses> {
    let indices = sampled_snapshots(result, calc_interval)?;
    let ranges = layer_ranges(&result.layers);

    let masses = result
        .layers
        .iter()
        .zip(&ranges)
        .map(|(layer, range)| {
            indices
                .iter()
                .map(|&i| layer_mass(result, i, range, layer.density()))
                .collect()
        })
        .collect();

    Ok(LayerMasses {
        masses,
        time_points: indices.iter().map(|&i| result.time_points[i]).collect(),
    })
}

/// Relative drift of the total mass against `t = 0`, in percent
///
/// # Errors
///
/// `InvalidParameter` when the initial profile carries no mass.
pub fn mass_conservation_deviation(result: &SimulationResult) -> MigrationResult<Vec<f64>> {
    let initial = trapezoid(result.grid.view(), result.initial_concentration.view());
    if initial == 0.0 {
        return Err(MigrationError::invalid(
            "initial_concentration",
            "initial total mass is zero, relative drift is undefined",
        ));
    }
    Ok(result
        .total_masses
        .iter()
        .map(|m| (m - initial) / initial * 100.0)
        .collect())
}

/// First time at which `masses` exceeds `threshold`
pub fn detection_time(masses: &[f64], time_points: &[f64], threshold: f64) -> Option<f64> {
    masses
        .iter()
        .zip(time_points)
        .find(|(m, _)| **m > threshold)
        .map(|(_, t)| *t)
}
