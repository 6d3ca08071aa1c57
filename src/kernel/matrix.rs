//! Kernel, degree and normalization matrices
//!
//! Dense n x n building blocks of the embedding step. Diagonal matrices are
//! returned as full matrices so callers can snapshot them as-is.

use crate::core::{KdacError, Result};
use crate::kernel::Kernel;
use nalgebra::{DMatrix, DVector};

/// Build the symmetric kernel matrix over the rows of `data`
pub fn generate_kernel_matrix(data: &DMatrix<f64>, kernel: &dyn Kernel) -> DMatrix<f64> {
    let n = data.nrows();
    let rows: Vec<Vec<f64>> = data
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();

    let mut kernel_matrix = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let value = kernel.compute(&rows[i], &rows[j]);
            kernel_matrix[(i, j)] = value;
            kernel_matrix[(j, i)] = value;
        }
    }
    kernel_matrix
}

/// Build the degree matrix D and D^(-1/2) from a kernel matrix
///
/// D is diagonal with Dᵢᵢ = Σⱼ Kᵢⱼ. Every degree must be strictly positive
/// and finite, otherwise the inverse square root does not exist.
pub fn generate_degree_matrix(kernel_matrix: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    if kernel_matrix.nrows() != kernel_matrix.ncols() {
        return Err(KdacError::DimensionMismatch {
            expected: kernel_matrix.nrows(),
            actual: kernel_matrix.ncols(),
        });
    }

    let degrees = DVector::from_iterator(
        kernel_matrix.nrows(),
        kernel_matrix.row_iter().map(|row| row.sum()),
    );

    if let Some((i, &degree)) = degrees
        .iter()
        .enumerate()
        .find(|(_, d)| !(d.is_finite() && **d > 0.0))
    {
        return Err(KdacError::Numerical(format!(
            "Degree of sample {i} is {degree}; the kernel must have positive row sums"
        )));
    }

    let inv_sqrt = degrees.map(|d| 1.0 / d.sqrt());
    Ok((
        DMatrix::from_diagonal(&degrees),
        DMatrix::from_diagonal(&inv_sqrt),
    ))
}

/// Compute L = D^(-1/2) K D^(-1/2)
///
/// Exploits the diagonal structure: Lᵢⱼ = dᵢ Kᵢⱼ dⱼ.
pub fn normalized_affinity(
    kernel_matrix: &DMatrix<f64>,
    d_to_the_minus_half: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = kernel_matrix.nrows();
    if d_to_the_minus_half.nrows() != n || d_to_the_minus_half.ncols() != n {
        return Err(KdacError::DimensionMismatch {
            expected: n,
            actual: d_to_the_minus_half.nrows(),
        });
    }

    let scale = d_to_the_minus_half.diagonal();
    Ok(DMatrix::from_fn(n, n, |i, j| {
        scale[i] * kernel_matrix[(i, j)] * scale[j]
    }))
}

/// Scale every row to unit L2 norm
///
/// Rows with zero norm are left as zero.
pub fn row_normalize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let mut normalized = matrix.clone();
    for mut row in normalized.row_iter_mut() {
        let norm = row.norm();
        if norm > 0.0 {
            row /= norm;
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{GaussianKernel, LinearKernel};
    use approx::assert_relative_eq;

    fn sample_kernel() -> DMatrix<f64> {
        let data = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 0.5, 0.2, 3.0, 3.0, 3.2, 2.9]);
        generate_kernel_matrix(&data, &GaussianKernel::new(1.0))
    }

    #[test]
    fn test_kernel_matrix_symmetric_unit_diagonal() {
        let k = sample_kernel();
        assert_eq!(k.shape(), (4, 4));
        for i in 0..4 {
            assert_relative_eq!(k[(i, i)], 1.0, epsilon = 1e-12);
            for j in 0..4 {
                assert_eq!(k[(i, j)], k[(j, i)]);
            }
        }
    }

    #[test]
    fn test_degree_matrix_inverse_square_root() {
        let k = sample_kernel();
        let (d, d_inv_sqrt) = generate_degree_matrix(&k).unwrap();

        let identity = &d_inv_sqrt * &d * &d_inv_sqrt;
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_degree_matrix_rejects_non_positive_degree() {
        let data = DMatrix::from_row_slice(2, 1, &[1.0, -1.0]);
        let k = generate_kernel_matrix(&data, &LinearKernel::new(0.0));
        // Row sums: 1 - 1 = 0
        assert!(matches!(
            generate_degree_matrix(&k),
            Err(KdacError::Numerical(_))
        ));
    }

    #[test]
    fn test_degree_matrix_rejects_non_square() {
        let k = DMatrix::from_element(2, 3, 1.0);
        assert!(matches!(
            generate_degree_matrix(&k),
            Err(KdacError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_normalized_affinity_symmetric_bounded_spectrum() {
        let k = sample_kernel();
        let (_, d_inv_sqrt) = generate_degree_matrix(&k).unwrap();
        let l = normalized_affinity(&k, &d_inv_sqrt).unwrap();

        let reference = &d_inv_sqrt * &k * &d_inv_sqrt;
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(l[(i, j)], l[(j, i)], epsilon = 1e-12);
                assert_relative_eq!(l[(i, j)], reference[(i, j)], epsilon = 1e-12);
            }
        }

        let eigen = nalgebra::SymmetricEigen::new(l);
        for &value in eigen.eigenvalues.iter() {
            assert!(value <= 1.0 + 1e-9 && value >= -1.0 - 1e-9);
        }
    }

    #[test]
    fn test_row_normalize_keeps_zero_rows() {
        let m = DMatrix::from_row_slice(3, 2, &[3.0, 4.0, 0.0, 0.0, -1.0, 0.0]);
        let normalized = row_normalize(&m);

        assert_relative_eq!(normalized[(0, 0)], 0.6, epsilon = 1e-12);
        assert_relative_eq!(normalized[(0, 1)], 0.8, epsilon = 1e-12);
        assert_eq!(normalized[(1, 0)], 0.0);
        assert_eq!(normalized[(1, 1)], 0.0);
        assert_relative_eq!(normalized.row(2).norm(), 1.0, epsilon = 1e-12);
    }
}
