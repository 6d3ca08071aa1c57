//! Gaussian kernel implementation
//!
//! The Gaussian kernel is defined as: K(x, y) = exp(-||x - y||² / (2σ²))
//! where σ (sigma) is the bandwidth.

use crate::kernel::Kernel;
use nalgebra::{DMatrix, DVector};

/// Gaussian kernel: K(x, y) = exp(-||x - y||² / (2σ²))
///
/// The bandwidth controls how quickly affinity decays with distance:
/// - Small sigma: only very close points are similar (fragmented graph)
/// - Large sigma: distant points stay similar (everything merges)
///
/// Values always lie in (0, 1], so every degree is strictly positive.
#[derive(Debug, Clone, Copy)]
pub struct GaussianKernel {
    sigma: f64,
}

impl GaussianKernel {
    /// Create a new Gaussian kernel with the given bandwidth
    ///
    /// # Panics
    /// Panics if sigma is not positive
    pub fn new(sigma: f64) -> Self {
        assert!(sigma > 0.0, "Sigma must be positive, got: {}", sigma);
        Self { sigma }
    }

    /// Gaussian kernel with unit bandwidth
    pub fn unit_sigma() -> Self {
        Self::new(1.0)
    }

    /// Get the bandwidth
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self::unit_sigma()
    }
}

impl Kernel for GaussianKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        let squared_distance = squared_euclidean_distance(x, y);
        (-squared_distance / (2.0 * self.sigma * self.sigma)).exp()
    }

    fn gradient_operator(
        &self,
        input: &DMatrix<f64>,
        _projected: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        kernel_matrix: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        // Σᵢⱼ Ψᵢⱼ (xᵢ - xⱼ)(xᵢ - xⱼ)ᵀ = 2 Xᵀ (Diag(Ψ 1) - Ψ) X
        let psi = gamma.component_mul(kernel_matrix);
        let row_sums = DVector::from_iterator(psi.nrows(), psi.row_iter().map(|row| row.sum()));
        let laplacian = DMatrix::from_diagonal(&row_sums) - psi;

        let scale = -2.0 / (self.sigma * self.sigma);
        input.transpose() * laplacian * input * scale
    }
}

/// Squared Euclidean distance between two dense vectors
fn squared_euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum()
}
