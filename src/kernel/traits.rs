//! Kernel trait definition

use nalgebra::DMatrix;

/// Kernel function trait
///
/// A kernel function K(x, y) over projected samples. Besides point
/// evaluation, each kernel knows how its kernel matrix responds to a change
/// of the projection W, which is what the projection update needs.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Gradient operator of the weighted kernel sum
    ///
    /// For J(W) = Σᵢⱼ γᵢⱼ K(Wᵀxᵢ, Wᵀxⱼ) with symmetric γ, returns the d x d
    /// symmetric matrix Φ such that ∂J/∂W = Φ W.
    ///
    /// # Arguments
    /// * `input` - Unprojected data X (n x d)
    /// * `projected` - Projected data X W (n x q)
    /// * `gamma` - Symmetric weight matrix γ (n x n)
    /// * `kernel_matrix` - K evaluated on `projected` (n x n)
    fn gradient_operator(
        &self,
        input: &DMatrix<f64>,
        projected: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        kernel_matrix: &DMatrix<f64>,
    ) -> DMatrix<f64>;
}
