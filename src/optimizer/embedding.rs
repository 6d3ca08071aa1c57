//! Embedding update (U-step)
//!
//! Projects the data, builds the kernel matrix, normalizes it by the degree
//! matrix and extracts the dominant eigenvectors of the normalized affinity.

use crate::core::{Result, SpectralSolver};
use crate::kernel::{
    generate_degree_matrix, generate_kernel_matrix, normalized_affinity, row_normalize, Kernel,
};
use nalgebra::DMatrix;

/// Matrices produced by one EMBED phase, all consistent with one W
#[derive(Debug, Clone)]
pub struct Embedding {
    /// Kernel matrix K (n x n)
    pub k: DMatrix<f64>,
    /// Degree matrix D (n x n, diagonal)
    pub d: DMatrix<f64>,
    /// D^(-1/2) (n x n, diagonal)
    pub d_to_the_minus_half: DMatrix<f64>,
    /// D^(-1/2) K D^(-1/2) (n x n)
    pub l: DMatrix<f64>,
    /// Dominant eigenvectors of L (n x c)
    pub u: DMatrix<f64>,
    /// U with unit-norm rows
    pub u_normalized: DMatrix<f64>,
}

/// Run the U-step for projection `w`
pub fn embed(
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
    kernel: &dyn Kernel,
    solver: &dyn SpectralSolver,
    n_clusters: usize,
) -> Result<Embedding> {
    let projected = x * w;
    let k = generate_kernel_matrix(&projected, kernel);
    let (d, d_to_the_minus_half) = generate_degree_matrix(&k)?;
    let l = normalized_affinity(&k, &d_to_the_minus_half)?;

    let u = solver.decompose(&l, n_clusters)?.left_vectors;
    let u_normalized = row_normalize(&u);

    Ok(Embedding {
        k,
        d,
        d_to_the_minus_half,
        l,
        u,
        u_normalized,
    })
}

/// Distance between the column spaces of two orthonormal bases
///
/// ‖U₁U₁ᵀ - U₂U₂ᵀ‖_F / √c, invariant to column signs and rotations within
/// the subspace; 0 for identical subspaces.
pub fn subspace_distance(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    let c = a.ncols().max(1) as f64;
    let overlap = a.transpose() * b;
    let squared = (2.0 * c - 2.0 * overlap.norm_squared()).max(0.0);
    squared.sqrt() / c.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::GaussianKernel;
    use crate::solver::EigenSolver;
    use approx::assert_relative_eq;

    fn two_pairs() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 0.3, 0.1, 5.0, 5.0, 5.2, 4.8])
    }

    #[test]
    fn test_embed_shapes() {
        let x = two_pairs();
        let w = DMatrix::identity(2, 2);
        let embedding = embed(&x, &w, &GaussianKernel::new(1.0), &EigenSolver::new(), 2).unwrap();

        assert_eq!(embedding.k.shape(), (4, 4));
        assert_eq!(embedding.d.shape(), (4, 4));
        assert_eq!(embedding.l.shape(), (4, 4));
        assert_eq!(embedding.u.shape(), (4, 2));
        for row in embedding.u_normalized.row_iter() {
            assert_relative_eq!(row.norm(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_embed_separates_pairs() {
        let x = two_pairs();
        let w = DMatrix::identity(2, 2);
        let embedding = embed(&x, &w, &GaussianKernel::new(1.0), &EigenSolver::new(), 2).unwrap();
        let u = &embedding.u_normalized;

        let dist = |i: usize, j: usize| (u.row(i) - u.row(j)).norm();
        for (i, j) in [(0, 1), (2, 3)] {
            for other in [(i + 2) % 4, (j + 2) % 4] {
                assert!(dist(i, j) < dist(i, other));
                assert!(dist(i, j) < dist(j, other));
            }
        }
    }

    #[test]
    fn test_subspace_distance() {
        let a = DMatrix::from_row_slice(3, 1, &[1.0, 0.0, 0.0]);
        let flipped = DMatrix::from_row_slice(3, 1, &[-1.0, 0.0, 0.0]);
        let orthogonal = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 0.0]);

        assert_relative_eq!(subspace_distance(&a, &a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(subspace_distance(&a, &flipped), 0.0, epsilon = 1e-12);
        assert_relative_eq!(subspace_distance(&a, &orthogonal), 2.0_f64.sqrt(), epsilon = 1e-12);
    }
}
