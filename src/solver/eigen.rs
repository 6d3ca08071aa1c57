//! Symmetric eigendecomposition backend

use crate::core::{Decomposition, KdacError, Result, SpectralSolver};
use crate::solver::{canonicalize_signs, check_request, descending_order};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Spectral solver based on nalgebra's symmetric eigendecomposition
///
/// Components are ordered by decreasing (signed) eigenvalue, ties broken by
/// the index nalgebra reports. Each eigenvector is sign-normalized so that
/// its largest-magnitude entry is positive, which makes repeated calls on the
/// same input return identical output.
#[derive(Debug, Clone, Copy)]
pub struct EigenSolver {
    /// Convergence threshold of the implicit QR iterations
    pub eps: f64,
    /// Iteration cap, 0 means unlimited
    pub max_iterations: usize,
}

impl Default for EigenSolver {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            max_iterations: 0,
        }
    }
}

impl EigenSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectralSolver for EigenSolver {
    fn decompose(&self, matrix: &DMatrix<f64>, n_components: usize) -> Result<Decomposition> {
        check_request(matrix, n_components)?;

        let eigen = SymmetricEigen::try_new(matrix.clone(), self.eps, self.max_iterations)
            .ok_or_else(|| {
                KdacError::Solver("symmetric eigendecomposition did not converge".to_string())
            })?;

        let order = descending_order(&eigen.eigenvalues);
        let n = matrix.nrows();
        let mut vectors = DMatrix::from_fn(n, n_components, |i, j| {
            eigen.eigenvectors[(i, order[j])]
        });
        canonicalize_signs(&mut vectors);
        let values = DVector::from_iterator(
            n_components,
            order.iter().take(n_components).map(|&i| eigen.eigenvalues[i]),
        );

        if vectors.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(KdacError::Solver(
                "eigendecomposition produced non-finite values".to_string(),
            ));
        }

        Ok(Decomposition {
            right_vectors: vectors.clone(),
            left_vectors: vectors,
            values,
        })
    }

    fn name(&self) -> &'static str {
        "eigen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eigen_orders_descending() {
        let m = DMatrix::from_diagonal(&DVector::from_vec(vec![0.5, 3.0, -1.0, 2.0]));
        let result = EigenSolver::new().decompose(&m, 3).unwrap();

        assert_eq!(result.left_vectors.shape(), (4, 3));
        assert_relative_eq!(result.values[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(result.values[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.values[2], 0.5, epsilon = 1e-12);

        // Leading eigenvector is e_1 with a positive sign
        assert_relative_eq!(result.left_vectors[(1, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigen_vectors_orthonormal() {
        let m = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0]);
        let result = EigenSolver::new().decompose(&m, 3).unwrap();
        let gram = result.left_vectors.transpose() * &result.left_vectors;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[(i, j)], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_eigen_rejects_bad_requests() {
        let m = DMatrix::<f64>::identity(3, 3);
        assert!(EigenSolver::new().decompose(&m, 4).is_err());
        assert!(EigenSolver::new().decompose(&m, 0).is_err());
        let rect = DMatrix::<f64>::zeros(3, 2);
        assert!(EigenSolver::new().decompose(&rect, 1).is_err());
    }
}
