//! Banded storage and Thomas algorithm for the Crank-Nicolson operators

use crate::error::{MigrationError, MigrationResult};
use nalgebra::{DMatrix, DVector};

/// Tridiagonal matrix stored as three bands
///
/// - `lower[i]` couples row `i` to `i-1` (`lower[0]` unused)
/// - `diagonal[i]`
/// - `upper[i]` couples row `i` to `i+1` (`upper[n-1]` unused)
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalMatrix {
    lower: Vec<f64>,
    diagonal: Vec<f64>,
    upper: Vec<f64>,
}

impl TridiagonalMatrix {
    /// Extract the bands of a dense square matrix
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `matrix` is not square or has an entry outside
    /// the three bands.
    pub fn from_dense(matrix: &DMatrix<f64>) -> MigrationResult<Self> {
        let n = matrix.nrows();
        if n == 0 || matrix.ncols() != n {
            return Err(MigrationError::invalid(
                "matrix",
                format!("expected a non-empty square matrix, got {}x{}", n, matrix.ncols()),
            ));
        }

        let mut lower = vec![0.0; n];
        let mut diagonal = vec![0.0; n];
        let mut upper = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                let value = matrix[(i, j)];
                match i as isize - j as isize {
                    1 => lower[i] = value,
                    0 => diagonal[i] = value,
                    -1 => upper[i] = value,
                    _ if value != 0.0 => {
                        return Err(MigrationError::invalid(
                            "matrix",
                            format!("entry ({i}, {j}) lies outside the tridiagonal band"),
                        ));
                    }
                    _ => {}
                }
            }
        }
        Ok(Self { lower, diagonal, upper })
    }

    pub fn size(&self) -> usize {
        self.diagonal.len()
    }

    fn check_length(&self, vector: &DVector<f64>, step: usize) -> MigrationResult<()> {
        if vector.len() == self.size() {
            Ok(())
        } else {
            Err(MigrationError::Solver {
                step,
                message: format!(
                    "dimension mismatch: matrix is {n}x{n}, vector has {} entries",
                    vector.len(),
                    n = self.size()
                ),
            })
        }
    }

    /// `self · x`
    ///
    /// # Errors
    ///
    /// `Solver` (reported at `step`) when `x` does not match the matrix size.
    pub fn mul_vec(&self, x: &DVector<f64>, step: usize) -> MigrationResult<DVector<f64>> {
        self.check_length(x, step)?;
        let n = self.size();
        Ok(DVector::from_fn(n, |i, _| {
            let mut value = self.diagonal[i] * x[i];
            if i > 0 {
                value += self.lower[i] * x[i - 1];
            }
            if i + 1 < n {
                value += self.upper[i] * x[i + 1];
            }
            value
        }))
    }

    /// Solve `self · x = rhs` with the Thomas algorithm
    ///
    /// # Errors
    ///
    /// `Solver` (reported at `step`) when a pivot vanishes or `rhs` does not
    /// match the matrix size.
    pub fn solve(&self, rhs: &DVector<f64>, step: usize) -> MigrationResult<DVector<f64>> {
        self.check_length(rhs, step)?;
        let n = self.size();
        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];

        // Forward sweep
        let mut pivot = self.diagonal[0];
        for i in 0..n {
            if i > 0 {
                pivot = self.diagonal[i] - self.lower[i] * c_prime[i - 1];
            }
            if pivot == 0.0 || !pivot.is_finite() {
                return Err(MigrationError::Solver {
                    step,
                    message: format!("zero pivot in row {i} of the tridiagonal system"),
                });
            }
            c_prime[i] = if i + 1 < n { self.upper[i] / pivot } else { 0.0 };
            let previous = if i > 0 { self.lower[i] * d_prime[i - 1] } else { 0.0 };
            d_prime[i] = (rhs[i] - previous) / pivot;
        }

        // Back substitution
        let mut x = DVector::zeros(n);
        x[n - 1] = d_prime[n - 1];
        for i in (0..n - 1).rev() {
            x[i] = d_prime[i] - c_prime[i] * x[i + 1];
        }
        Ok(x)
    }
}
