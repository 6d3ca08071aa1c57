//! Core traits for the KDAC collaborators

use crate::core::{Decomposition, Result};
use nalgebra::DMatrix;

/// Dense dataset abstraction
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Copy the samples into an n x d matrix, one sample per row
    fn to_matrix(&self) -> DMatrix<f64>;

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spectral decomposition service for symmetric matrices
///
/// Implementations return the `n_components` dominant components ordered by
/// decreasing eigen/singular value. Each call is blocking and independent.
pub trait SpectralSolver: Send + Sync {
    /// Decompose `matrix` and keep the leading `n_components` components
    fn decompose(&self, matrix: &DMatrix<f64>, n_components: usize) -> Result<Decomposition>;

    /// Short backend name used in log messages
    fn name(&self) -> &'static str;
}

/// Partition-based clustering of matrix rows
pub trait PartitionClusterer: Send + Sync {
    /// Assign every row of `rows` to one of `n_clusters` clusters
    fn partition(&self, rows: &DMatrix<f64>, n_clusters: usize) -> Result<Vec<usize>>;
}
