//! Singular value decomposition backend

use crate::core::{Decomposition, KdacError, Result, SpectralSolver};
use crate::solver::{canonicalize_signs, check_request, descending_order};
use nalgebra::{DMatrix, DVector};

/// Spectral solver based on nalgebra's SVD
///
/// Returns the left singular vectors of the largest singular values. For a
/// positive semi-definite input these coincide with the dominant
/// eigenvectors.
#[derive(Debug, Clone, Copy)]
pub struct SvdSolver {
    /// Convergence threshold of the bidiagonal iterations
    pub eps: f64,
    /// Iteration cap, 0 means unlimited
    pub max_iterations: usize,
}

impl Default for SvdSolver {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            max_iterations: 0,
        }
    }
}

impl SvdSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectralSolver for SvdSolver {
    fn decompose(&self, matrix: &DMatrix<f64>, n_components: usize) -> Result<Decomposition> {
        check_request(matrix, n_components)?;

        let svd = matrix
            .clone()
            .try_svd(true, true, self.eps, self.max_iterations)
            .ok_or_else(|| KdacError::Solver("SVD did not converge".to_string()))?;
        let (u, v_t) = match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => {
                return Err(KdacError::Solver(
                    "SVD did not produce singular vectors".to_string(),
                ))
            }
        };

        let order = descending_order(&svd.singular_values);
        let n = matrix.nrows();
        let mut left = DMatrix::from_fn(n, n_components, |i, j| u[(i, order[j])]);
        let mut right = DMatrix::from_fn(n, n_components, |i, j| v_t[(order[j], i)]);
        let flipped = canonicalize_signs(&mut left);
        for (j, &was_flipped) in flipped.iter().enumerate() {
            if was_flipped {
                right.column_mut(j).neg_mut();
            }
        }
        let values = DVector::from_iterator(
            n_components,
            order
                .iter()
                .take(n_components)
                .map(|&i| svd.singular_values[i]),
        );

        if left.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(KdacError::Solver(
                "SVD produced non-finite values".to_string(),
            ));
        }

        Ok(Decomposition {
            left_vectors: left,
            values,
            right_vectors: right,
        })
    }

    fn name(&self) -> &'static str {
        "svd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::EigenSolver;
    use approx::assert_relative_eq;

    #[test]
    fn test_svd_matches_eigen_on_psd_matrix() {
        let m = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 1.0]);
        let svd = SvdSolver::new().decompose(&m, 2).unwrap();
        let eigen = EigenSolver::new().decompose(&m, 2).unwrap();

        for j in 0..2 {
            assert_relative_eq!(svd.values[j], eigen.values[j], epsilon = 1e-10);
        }
        let p_svd = &svd.left_vectors * svd.left_vectors.transpose();
        let p_eigen = &eigen.left_vectors * eigen.left_vectors.transpose();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(p_svd[(i, j)], p_eigen[(i, j)], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_svd_values_non_negative_descending() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let result = SvdSolver::new().decompose(&m, 2).unwrap();
        assert_relative_eq!(result.values[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(result.values[1], 1.0, epsilon = 1e-10);
    }
}
