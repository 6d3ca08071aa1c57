//! Core type definitions for KDAC

use crate::core::{KdacError, Result};
use crate::kernel::KernelType;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spectral decomposition backend selected at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SolverBackend {
    /// Symmetric eigendecomposition (eigenvalues sorted descending)
    #[default]
    Eigen,
    /// Singular value decomposition, as used by the reference algorithm
    Svd,
}

/// Configuration for the KDAC engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdacConfig {
    /// Number of clusters (c in the paper)
    pub n_clusters: usize,
    /// Reduced dimension of the projection W (q in the paper, q <= c)
    pub reduced_dim: usize,
    /// Kernel used to build K from the projected data
    pub kernel: KernelType,
    /// Maximum number of EMBED/PROJECT rounds
    pub max_rounds: usize,
    /// Convergence tolerance shared by the outer and inner loops
    pub tolerance: f64,
    /// Weight of the dissimilarity (HSIC) term against prior clusterings
    pub lambda: f64,
    /// Maximum number of gradient steps per PROJECT phase
    pub max_w_iterations: usize,
    /// Initial step length along the normalized Stiefel gradient
    pub step_size: f64,
    /// Maximum number of step halvings per gradient step
    pub max_backtracks: usize,
    /// Number of k-means restarts; the lowest inertia wins
    pub kmeans_restarts: usize,
    /// Maximum Lloyd iterations per k-means restart
    pub kmeans_max_iterations: usize,
    /// Seed for the k-means RNG
    pub seed: u64,
    /// Primary spectral decomposition backend
    pub solver: SolverBackend,
    /// Backend used when the primary one fails
    pub fallback_solver: Option<SolverBackend>,
}

impl Default for KdacConfig {
    fn default() -> Self {
        Self {
            n_clusters: 2,
            reduced_dim: 2,
            kernel: KernelType::Gaussian { sigma: 1.0 },
            max_rounds: 20,
            tolerance: 1e-4,
            lambda: 10.0,
            max_w_iterations: 50,
            step_size: 1.0,
            max_backtracks: 20,
            kmeans_restarts: 8,
            kmeans_max_iterations: 300,
            seed: 42,
            solver: SolverBackend::Eigen,
            fallback_solver: Some(SolverBackend::Svd),
        }
    }
}

impl KdacConfig {
    /// Check the cluster/dimension invariant: 1 <= q <= c
    pub fn check_cq(n_clusters: usize, reduced_dim: usize) -> Result<()> {
        if n_clusters == 0 {
            return Err(KdacError::Configuration(
                "Cluster number c must be positive".to_string(),
            ));
        }
        if reduced_dim == 0 {
            return Err(KdacError::Configuration(
                "Reduced dimension q must be positive".to_string(),
            ));
        }
        if reduced_dim > n_clusters {
            return Err(KdacError::Configuration(format!(
                "Reduced dimension q ({reduced_dim}) cannot exceed cluster number c ({n_clusters})"
            )));
        }
        Ok(())
    }

    /// Validate every field
    pub fn validate(&self) -> Result<()> {
        Self::check_cq(self.n_clusters, self.reduced_dim)?;
        self.kernel.validate()?;

        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(KdacError::Configuration(format!(
                "Tolerance must be positive, got: {}",
                self.tolerance
            )));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(KdacError::Configuration(format!(
                "Lambda must be non-negative, got: {}",
                self.lambda
            )));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(KdacError::Configuration(format!(
                "Step size must be positive, got: {}",
                self.step_size
            )));
        }
        if self.max_rounds == 0 {
            return Err(KdacError::Configuration(
                "Round budget must be positive".to_string(),
            ));
        }
        if self.kmeans_restarts == 0 {
            return Err(KdacError::Configuration(
                "At least one k-means restart is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// The two phases of one alternating round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Kernel, degree normalization and spectral embedding (U-step)
    Embed,
    /// Gradient ascent on the projection matrix (W-step)
    Project,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Embed => write!(f, "EMBED"),
            Phase::Project => write!(f, "PROJECT"),
        }
    }
}

/// Output of a spectral decomposition, columns ordered by dominance
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Leading left singular vectors / eigenvectors (n x k)
    pub left_vectors: DMatrix<f64>,
    /// Leading singular values / eigenvalues (k)
    pub values: DVector<f64>,
    /// Leading right singular vectors (n x k); equal to the left ones for eigen solvers
    pub right_vectors: DMatrix<f64>,
}

/// Soft warning raised when the round budget runs out before convergence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceWarning {
    pub rounds: usize,
    pub last_u_change: f64,
    pub last_w_change: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no convergence after {} rounds (U change {:.3e}, W change {:.3e})",
            self.rounds, self.last_u_change, self.last_w_change
        )
    }
}

/// Summary of one completed fit
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    /// Number of EMBED/PROJECT rounds executed
    pub rounds: usize,
    /// Embedding convergence flag
    pub u_converged: bool,
    /// Projection convergence flag
    pub w_converged: bool,
    /// PROJECT phases that stopped at `max_w_iterations` before converging
    pub w_step_limit_rounds: usize,
    /// Objective J(W) after the last PROJECT phase
    pub objective_value: f64,
    /// Objective after every PROJECT phase
    pub objective_history: Vec<f64>,
    /// Number of prior clusterings the fit was made dissimilar to
    pub n_prior_clusterings: usize,
    /// Set when the round budget was exhausted
    pub warning: Option<ConvergenceWarning>,
}

impl FitReport {
    /// Both convergence flags are set
    pub fn converged(&self) -> bool {
        self.u_converged && self.w_converged
    }
}
