//! Crank-Nicolson coefficient matrices
//!
//! For layer `i` with `alpha_i = D_i·dt / (2·dx_i²)` the scheme reads
//! `A·C^{n+1} = B·C^n` with:
//!
//! # Interior rows
//!
//! ```text
//! A[j,j] = 1 + 2α      A[j,j±1] = -α
//! B[j,j] = 1 - 2α      B[j,j±1] =  α
//! ```
//!
//! # Outer faces (no flux)
//!
//! A ghost point mirrored across the face doubles the inward coupling:
//! `A[0,1] = -2α₀`, `B[0,1] = 2α₀`, and the same on the last row.
//!
//! # Interfaces
//!
//! With `θ = D_l / (D_l + D_r)`, `φ = D_r / (D_l + D_r)` and the partition
//! coefficient `K` of the left layer, the last point of the left layer
//! (`idx-1`) and the first point of the right layer (`idx`) satisfy
//!
//! ```text
//! A[idx-1,idx-2] = -α_l   A[idx-1,idx-1] = 1 + 2α_l - θα_l + φα_l   A[idx-1,idx] = -2α_l·φ·K
//! A[idx,idx-1] = -2α_r·θ/K   A[idx,idx] = 1 + 2α_r - φα_r + θα_r    A[idx,idx+1] = -α_r
//! ```
//!
//! `B` carries the same entries with the `α` terms sign-flipped. For `K = 1`
//! and equal diffusivities both interface rows collapse to the interior stencil.
//!
//! Every row couples only `j-1`, `j`, `j+1`, so both matrices are tridiagonal.

use crate::error::{MigrationError, MigrationResult, ensure_positive};
use crate::physics::Layer;
use nalgebra::DMatrix;

/// Implicit (`A`) and explicit (`B`) operators of one run
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientMatrices {
    pub implicit: DMatrix<f64>,
    pub explicit: DMatrix<f64>,
}

impl CoefficientMatrices {
    /// Matrix size, the total number of grid points
    pub fn size(&self) -> usize {
        self.implicit.nrows()
    }
}

/// Builds [`CoefficientMatrices`] for a layer stack and a time step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrankNicolsonAssembler {
    time_step: f64,
}

impl CrankNicolsonAssembler {
    pub fn new(time_step: f64) -> MigrationResult<Self> {
        ensure_positive("time_step", time_step)?;
        Ok(Self { time_step })
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Per-layer `alpha_i = D_i·dt / (2·dx_i²)`
    pub fn alphas(&self, layers: &[Layer]) -> Vec<f64> {
        layers
            .iter()
            .map(|layer| layer.diffusion_coefficient() * self.time_step / (2.0 * layer.dx().powi(2)))
            .collect()
    }

    /// Assemble `A` and `B` for `layers`, source first
    pub fn assemble(&self, layers: &[Layer]) -> MigrationResult<CoefficientMatrices> {
        if layers.is_empty() {
            return Err(MigrationError::invalid("layers", "cannot assemble an empty stack"));
        }

        let n: usize = layers.iter().map(Layer::grid_points).sum();
        let alphas = self.alphas(layers);
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DMatrix::<f64>::zeros(n, n);

        // ====== Interior rows ======

        let mut start = 0;
        for (layer, &alpha) in layers.iter().zip(&alphas) {
            let end = start + layer.grid_points();
            for j in start + 1..end - 1 {
                a[(j, j)] = 1.0 + 2.0 * alpha;
                a[(j, j - 1)] = -alpha;
                a[(j, j + 1)] = -alpha;
                b[(j, j)] = 1.0 - 2.0 * alpha;
                b[(j, j - 1)] = alpha;
                b[(j, j + 1)] = alpha;
            }
            start = end;
        }

        // ====== Outer faces (no flux) ======

        let first = alphas[0];
        a[(0, 0)] = 1.0 + 2.0 * first;
        a[(0, 1)] = -2.0 * first;
        b[(0, 0)] = 1.0 - 2.0 * first;
        b[(0, 1)] = 2.0 * first;

        let last = alphas[alphas.len() - 1];
        a[(n - 1, n - 1)] = 1.0 + 2.0 * last;
        a[(n - 1, n - 2)] = -2.0 * last;
        b[(n - 1, n - 1)] = 1.0 - 2.0 * last;
        b[(n - 1, n - 2)] = 2.0 * last;

        // ====== Interfaces ======

        let mut idx = 0;
        for i in 1..layers.len() {
            idx += layers[i - 1].grid_points();

            let d_left = layers[i - 1].diffusion_coefficient();
            let d_right = layers[i].diffusion_coefficient();
            let (alpha_l, alpha_r) = (alphas[i - 1], alphas[i]);
            let k = layers[i - 1].interface_partition();

            let theta = d_left / (d_left + d_right);
            let phi = d_right / (d_left + d_right);

            a[(idx - 1, idx - 2)] = -alpha_l;
            a[(idx - 1, idx - 1)] = 1.0 + 2.0 * alpha_l - theta * alpha_l + phi * alpha_l;
            a[(idx - 1, idx)] = -2.0 * alpha_l * phi * k;

            b[(idx - 1, idx - 2)] = alpha_l;
            b[(idx - 1, idx - 1)] = 1.0 - 2.0 * alpha_l + theta * alpha_l - phi * alpha_l;
            b[(idx - 1, idx)] = 2.0 * alpha_l * phi * k;

            a[(idx, idx - 1)] = -2.0 * alpha_r * theta / k;
            a[(idx, idx)] = 1.0 + 2.0 * alpha_r - phi * alpha_r + theta * alpha_r;
            a[(idx, idx + 1)] = -alpha_r;

            b[(idx, idx - 1)] = 2.0 * alpha_r * theta / k;
            b[(idx, idx)] = 1.0 - 2.0 * alpha_r + phi * alpha_r - theta * alpha_r;
            b[(idx, idx + 1)] = alpha_r;
        }

        Ok(CoefficientMatrices {
            implicit: a,
            explicit: b,
        })
    }
}
