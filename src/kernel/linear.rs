//! Linear kernel implementation

use crate::kernel::Kernel;
use nalgebra::DMatrix;

/// Linear kernel: K(x, y) = x^T * y + offset
///
/// This is the simplest kernel function, computing the dot product between
/// two vectors shifted by a constant offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel {
    offset: f64,
}

impl LinearKernel {
    /// Create a new linear kernel with the given offset
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    /// Get the offset
    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y).map(|(a, b)| a * b).sum::<f64>() + self.offset
    }

    fn gradient_operator(
        &self,
        input: &DMatrix<f64>,
        _projected: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        _kernel_matrix: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        // Σᵢⱼ γᵢⱼ (xᵢxⱼᵀ + xⱼxᵢᵀ) = 2 Xᵀ γ X
        input.transpose() * gamma * input * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_kernel_basic() {
        let kernel = LinearKernel::default();
        assert_eq!(kernel.compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 14.0);
        assert_eq!(kernel.compute(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_linear_kernel_offset() {
        let kernel = LinearKernel::new(0.5);
        assert_eq!(kernel.offset(), 0.5);
        assert_eq!(kernel.compute(&[2.0], &[3.0]), 6.5);
    }

    #[test]
    fn test_gradient_operator_is_symmetric() {
        let kernel = LinearKernel::new(1.0);
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 0.0, 1.0, -1.0, 0.5]);
        let gamma = DMatrix::from_row_slice(3, 3, &[1.0, 0.2, 0.1, 0.2, 1.0, 0.3, 0.1, 0.3, 1.0]);
        let projected = x.clone();
        let k = &x * x.transpose();

        let phi = kernel.gradient_operator(&x, &projected, &gamma, &k);
        assert_eq!(phi.shape(), (2, 2));
        assert!((phi[(0, 1)] - phi[(1, 0)]).abs() < 1e-12);
    }
}
