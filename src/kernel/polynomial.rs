//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (<x, y> + 1)^p
//!
//! Where p (order) is a positive integer. With the unit constant the
//! kernel is positive semi-definite for every order.

use crate::kernel::traits::Kernel;
use nalgebra::DMatrix;

/// Polynomial kernel with configurable order
#[derive(Debug, Clone, Copy)]
pub struct PolynomialKernel {
    /// Order of the polynomial
    pub order: u32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel of the given order
    ///
    /// # Examples
    /// ```
    /// use kdac::kernel::PolynomialKernel;
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let kernel = PolynomialKernel::new(2);
    /// assert_eq!(kernel.order, 2);
    /// ```
    pub fn new(order: u32) -> Self {
        assert!(order > 0, "Polynomial order must be positive");
        Self { order }
    }

    /// Creates a quadratic kernel: (<x,y> + 1)²
    pub fn quadratic() -> Self {
        Self::new(2)
    }

    /// Creates a cubic kernel: (<x,y> + 1)³
    pub fn cubic() -> Self {
        Self::new(3)
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (dot_product(x, y) + 1.0).powi(self.order as i32)
    }

    fn gradient_operator(
        &self,
        input: &DMatrix<f64>,
        projected: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        _kernel_matrix: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        // ∂K/∂W = p (s + 1)^(p-1) (xᵢxⱼᵀ + xⱼxᵢᵀ) W with s = xᵢᵀWWᵀxⱼ
        let p = self.order as i32;
        let gram = projected * projected.transpose();
        let derivative = gram.map(|s| f64::from(self.order) * (s + 1.0).powi(p - 1));
        let weights = gamma.component_mul(&derivative);

        input.transpose() * weights * input * 2.0
    }
}

/// Dense dot product
fn dot_product(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}
