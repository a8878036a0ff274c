//! Spatial grid and initial profile
//!
//! Every layer contributes exactly `nx` evenly spaced points from its left
//! face to its right face. Points on a shared face appear twice, once per
//! layer, so index ranges line up with [`layer_ranges`](super::layer_ranges).

use crate::physics::Layer;
use ndarray::{Array1, s};

/// Concatenated per-layer coordinates [cm]
///
/// # Example
///
/// ```rust
/// use migration_rs::physics::LayerSpec;
/// use migration_rs::solver::build_grid;
///
/// let layers = vec![
///     LayerSpec::new("A", 0.1, 3, 1.0).with_diffusion_coefficient(1e-8).build().unwrap(),
///     LayerSpec::new("B", 0.2, 3, 0.0).with_diffusion_coefficient(1e-8).build().unwrap(),
/// ];
/// let x = build_grid(&layers);
/// assert_eq!(x.len(), 6);
/// assert_eq!(x[2], x[3]);
/// ```
pub fn build_grid(layers: &[Layer]) -> Array1<f64> {
    let total: usize = layers.iter().map(Layer::grid_points).sum();
    let mut x = Array1::zeros(total);

    let mut start = 0;
    let mut left = 0.0;
    for layer in layers {
        let right = left + layer.thickness();
        let n = layer.grid_points();
        x.slice_mut(s![start..start + n])
            .assign(&Array1::linspace(left, right, n));
        start += n;
        left = right;
    }
    x
}

/// `(C, C_init)`: the working copy and the `t = 0` reference, identical on return
pub fn build_initial_concentration(layers: &[Layer]) -> (Array1<f64>, Array1<f64>) {
    let total: usize = layers.iter().map(Layer::grid_points).sum();
    let mut initial = Array1::zeros(total);

    let mut start = 0;
    for layer in layers {
        let n = layer.grid_points();
        initial
            .slice_mut(s![start..start + n])
            .fill(layer.initial_concentration());
        start += n;
    }
    (initial.clone(), initial)
}
