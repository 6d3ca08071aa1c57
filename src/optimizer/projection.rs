//! Projection update (W-step)
//!
//! Gradient ascent on the Stiefel manifold for
//! J(W) = Σᵢⱼ γᵢⱼ K(Wᵀxᵢ, Wᵀxⱼ), with U and D frozen from the last EMBED.

use crate::core::{KdacConfig, KdacError, Result};
use crate::kernel::{generate_kernel_matrix, Kernel};
use crate::profiler::KdacProfiler;
use crate::solver::descending_order;
use log::{debug, trace};
use nalgebra::{DMatrix, SymmetricEigen};
use std::time::Instant;

/// Result of one PROJECT phase
#[derive(Debug, Clone)]
pub struct ProjectionOutcome {
    /// Updated projection, orthonormal columns (d x q')
    pub w: DMatrix<f64>,
    /// J at the returned W
    pub objective: f64,
    /// Gradient steps taken
    pub iterations: usize,
    /// The inner loop stopped on a convergence criterion rather than its budget
    pub converged: bool,
}

/// Weight matrix γ of the W-step objective
///
/// γ = D^(-1/2) U Uᵀ D^(-1/2) - λ/(n-1)² · H Y Yᵀ H. The second term is
/// dropped when there are no prior clusterings (Y has no columns).
pub fn gamma_matrix(
    u: &DMatrix<f64>,
    d_to_the_minus_half: &DMatrix<f64>,
    h: &DMatrix<f64>,
    y: &DMatrix<f64>,
    lambda: f64,
) -> DMatrix<f64> {
    let scaled = d_to_the_minus_half * u;
    let mut gamma = &scaled * scaled.transpose();

    if y.ncols() > 0 && lambda > 0.0 {
        let n = y.nrows() as f64;
        let weight = lambda / (n - 1.0).max(1.0).powi(2);
        let centered = h * y;
        gamma -= (&centered * centered.transpose()) * weight;
    }
    gamma
}

/// Evaluate J(W), returning the kernel matrix it was computed from
pub fn objective(
    x: &DMatrix<f64>,
    w: &DMatrix<f64>,
    kernel: &dyn Kernel,
    gamma: &DMatrix<f64>,
) -> Result<(f64, DMatrix<f64>)> {
    let k = generate_kernel_matrix(&(x * w), kernel);
    let value = gamma.component_mul(&k).sum();
    if !value.is_finite() {
        return Err(KdacError::Numerical(format!(
            "Projection objective is not finite: {value}"
        )));
    }
    Ok((value, k))
}

/// QR retraction onto the Stiefel manifold
///
/// Columns are sign-fixed so that diag(R) is non-negative, which makes the
/// map continuous and the identity on matrices that are already orthonormal.
pub fn retract(m: DMatrix<f64>) -> DMatrix<f64> {
    let qr = m.qr();
    let r = qr.r();
    let mut q = qr.q();
    for j in 0..q.ncols() {
        if r[(j, j)] < 0.0 {
            q.column_mut(j).neg_mut();
        }
    }
    q
}

/// Project the Euclidean gradient onto the tangent space at W
///
/// G = ∇ - W sym(Wᵀ∇)
pub fn tangent_gradient(w: &DMatrix<f64>, euclidean: &DMatrix<f64>) -> DMatrix<f64> {
    let inner = w.transpose() * euclidean;
    let sym = (&inner + inner.transpose()) * 0.5;
    euclidean - w * sym
}

/// Gradient ascent driver for one PROJECT phase
pub struct ProjectionStep<'a> {
    kernel: &'a dyn Kernel,
    config: &'a KdacConfig,
}

impl<'a> ProjectionStep<'a> {
    pub fn new(kernel: &'a dyn Kernel, config: &'a KdacConfig) -> Self {
        Self { kernel, config }
    }

    /// Maximize J starting from `w`
    ///
    /// With `warm_start`, the leading eigenvectors of the gradient operator
    /// at `w` are tried as a starting point first.
    pub fn optimize(
        &self,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        warm_start: bool,
        profiler: &mut KdacProfiler,
    ) -> Result<ProjectionOutcome> {
        let mut w = w.clone();
        let (mut value, mut k) = self.timed_objective(x, &w, gamma, profiler)?;

        if warm_start {
            if let Some(seed) = self.spectral_start(x, &w, gamma, &k, profiler) {
                let (seed_value, seed_k) = self.timed_objective(x, &seed, gamma, profiler)?;
                if seed_value - value > self.config.tolerance * value.abs().max(1.0) {
                    debug!("Warm start raised J from {value:.6} to {seed_value:.6}");
                    w = seed;
                    value = seed_value;
                    k = seed_k;
                }
            }
        }

        let tolerance = self.config.tolerance;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_w_iterations {
            iterations += 1;

            let start = Instant::now();
            let phi = self.kernel.gradient_operator(x, &(x * &w), gamma, &k);
            profiler.gen_grad.stop(start);

            let gradient = tangent_gradient(&w, &(&phi * &w));
            let gradient_norm = gradient.norm();
            if !gradient_norm.is_finite() {
                return Err(KdacError::Numerical(
                    "Projection gradient is not finite".to_string(),
                ));
            }
            if gradient_norm <= tolerance * value.abs().max(1.0) {
                trace!("W-step: gradient vanished after {iterations} iterations");
                converged = true;
                break;
            }
            let direction = gradient / gradient_norm;

            // Backtracking line search along the normalized direction
            let mut step = self.config.step_size;
            let mut accepted = None;
            for _ in 0..=self.config.max_backtracks {
                let candidate = retract(&w + &direction * step);
                let (candidate_value, candidate_k) =
                    self.timed_objective(x, &candidate, gamma, profiler)?;
                if candidate_value > value {
                    accepted = Some((candidate, candidate_value, candidate_k));
                    break;
                }
                step *= 0.5;
            }

            let Some((candidate, candidate_value, candidate_k)) = accepted else {
                trace!("W-step: no improving step after {iterations} iterations");
                converged = true;
                break;
            };

            let gain = candidate_value - value;
            w = candidate;
            value = candidate_value;
            k = candidate_k;
            trace!("W-step iteration {iterations}: J = {value:.6}, step = {step:.3e}");

            if gain <= tolerance * value.abs().max(1.0) {
                converged = true;
                break;
            }
        }

        Ok(ProjectionOutcome {
            w,
            objective: value,
            iterations,
            converged,
        })
    }

    fn timed_objective(
        &self,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        profiler: &mut KdacProfiler,
    ) -> Result<(f64, DMatrix<f64>)> {
        let start = Instant::now();
        let result = objective(x, w, self.kernel, gamma);
        profiler.objective.stop(start);
        result
    }

    /// Leading q' eigenvectors of Φ(W)
    fn spectral_start(
        &self,
        x: &DMatrix<f64>,
        w: &DMatrix<f64>,
        gamma: &DMatrix<f64>,
        k: &DMatrix<f64>,
        profiler: &mut KdacProfiler,
    ) -> Option<DMatrix<f64>> {
        let start = Instant::now();
        let phi = self.kernel.gradient_operator(x, &(x * w), gamma, k);
        profiler.gen_grad.stop(start);

        if !phi.iter().all(|v| v.is_finite()) {
            return None;
        }
        let eigen = SymmetricEigen::try_new(phi, f64::EPSILON, 0)?;
        let order = descending_order(&eigen.eigenvalues);
        let columns: Vec<_> = order
            .iter()
            .take(w.ncols())
            .map(|&i| eigen.eigenvectors.column(i).into_owned())
            .collect();
        Some(retract(DMatrix::from_columns(&columns)))
    }
}
