//! Spectral decomposition backends

pub mod eigen;
pub mod fallback;
pub mod svd;

pub use self::eigen::EigenSolver;
pub use self::fallback::FallbackSolver;
pub use self::svd::SvdSolver;

use crate::core::{KdacError, Result, SolverBackend, SpectralSolver};
use nalgebra::{DMatrix, DVector};
use std::cmp::Ordering;

/// Instantiate the configured backend, wrapped with its fallback if any
pub fn build_solver(
    backend: SolverBackend,
    fallback: Option<SolverBackend>,
) -> Box<dyn SpectralSolver> {
    let primary = backend_solver(backend);
    match fallback {
        Some(fallback) if fallback != backend => {
            Box::new(FallbackSolver::new(primary, backend_solver(fallback)))
        }
        _ => primary,
    }
}

fn backend_solver(backend: SolverBackend) -> Box<dyn SpectralSolver> {
    match backend {
        SolverBackend::Eigen => Box::new(EigenSolver::new()),
        SolverBackend::Svd => Box::new(SvdSolver::new()),
    }
}

/// Validate a decomposition request
pub(crate) fn check_request(matrix: &DMatrix<f64>, n_components: usize) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(KdacError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    if n_components == 0 || n_components > matrix.nrows() {
        return Err(KdacError::Solver(format!(
            "cannot extract {n_components} components from a {0}x{0} matrix",
            matrix.nrows()
        )));
    }
    Ok(())
}

/// Indices sorted by decreasing value; equal values keep index order
pub(crate) fn descending_order(values: &DVector<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
    order
}

/// Flip columns so that each one's largest-magnitude entry is positive
///
/// Returns which columns were flipped.
pub(crate) fn canonicalize_signs(vectors: &mut DMatrix<f64>) -> Vec<bool> {
    let mut flipped = Vec::with_capacity(vectors.ncols());
    for mut column in vectors.column_iter_mut() {
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
        let flip = pivot < 0.0;
        if flip {
            column.neg_mut();
        }
        flipped.push(flip);
    }
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_order_is_stable() {
        let values = DVector::from_vec(vec![1.0, 3.0, 1.0, 2.0]);
        assert_eq!(descending_order(&values), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_canonicalize_signs() {
        let mut m = DMatrix::from_row_slice(2, 2, &[0.2, 0.6, -0.9, 0.1]);
        let flipped = canonicalize_signs(&mut m);
        assert_eq!(flipped, vec![true, false]);
        assert_eq!(m[(1, 0)], 0.9);
        assert_eq!(m[(0, 1)], 0.6);
    }

    #[test]
    fn test_build_solver_names() {
        assert_eq!(build_solver(SolverBackend::Eigen, None).name(), "eigen");
        assert_eq!(build_solver(SolverBackend::Svd, None).name(), "svd");
        assert_eq!(
            build_solver(SolverBackend::Eigen, Some(SolverBackend::Svd)).name(),
            "eigen"
        );
    }
}
