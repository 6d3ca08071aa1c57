//! Alternating KDAC optimization
//!
//! Integrates the kernel, the spectral solver and the two update steps into
//! the EMBED/PROJECT loop. State is built in a [`KdacState`] value and only
//! handed back when the whole fit succeeds.

pub mod embedding;
pub mod projection;

pub use self::embedding::{embed, subspace_distance, Embedding};
pub use self::projection::{gamma_matrix, ProjectionOutcome, ProjectionStep};

use crate::core::{
    ConvergenceWarning, FitReport, KdacConfig, KdacError, Phase, Result, SpectralSolver,
};
use crate::kernel::Kernel;
use crate::profiler::KdacProfiler;
use crate::utils::matrices::{centering_matrix, label_indicator};
use log::{debug, info, warn};
use nalgebra::DMatrix;
use std::time::Instant;

/// Every matrix of a KDAC fit
///
/// The spectral matrices (K, D, L, U) are empty until the first EMBED.
#[derive(Debug, Clone)]
pub struct KdacState {
    /// Input data X (n x d)
    pub x: DMatrix<f64>,
    /// Projection W (d x q'), orthonormal columns
    pub w: DMatrix<f64>,
    /// Centering matrix H (n x n)
    pub h: DMatrix<f64>,
    /// Stacked one-hot indicators of the prior clusterings (n x Σcᵢ)
    pub y: DMatrix<f64>,
    pub k: DMatrix<f64>,
    pub d: DMatrix<f64>,
    pub d_to_the_minus_half: DMatrix<f64>,
    pub l: DMatrix<f64>,
    pub u: DMatrix<f64>,
    pub u_normalized: DMatrix<f64>,
    /// Embedding convergence flag of the last round
    pub u_converged: bool,
    /// Projection convergence flag of the last round
    pub w_converged: bool,
}

impl KdacState {
    /// Fresh state for `x` with W set to the leading identity columns
    pub fn new(x: DMatrix<f64>, reduced_dim: usize, prior_clusterings: &[Vec<usize>]) -> Self {
        let (n, d) = x.shape();
        let q = reduced_dim.min(d);
        let empty = || DMatrix::zeros(0, 0);

        Self {
            w: DMatrix::identity(d, q),
            h: centering_matrix(n),
            y: label_indicator(prior_clusterings, n),
            x,
            k: empty(),
            d: empty(),
            d_to_the_minus_half: empty(),
            l: empty(),
            u: empty(),
            u_normalized: empty(),
            u_converged: false,
            w_converged: false,
        }
    }

    /// True once at least one EMBED has completed
    pub fn is_embedded(&self) -> bool {
        self.u.ncols() > 0
    }

    fn apply(&mut self, embedding: Embedding) {
        self.k = embedding.k;
        self.d = embedding.d;
        self.d_to_the_minus_half = embedding.d_to_the_minus_half;
        self.l = embedding.l;
        self.u = embedding.u;
        self.u_normalized = embedding.u_normalized;
    }
}

/// Drives the alternating loop for one fit
pub struct KdacOptimizer<'a> {
    config: &'a KdacConfig,
    kernel: &'a dyn Kernel,
    solver: &'a dyn SpectralSolver,
}

impl<'a> KdacOptimizer<'a> {
    pub fn new(
        config: &'a KdacConfig,
        kernel: &'a dyn Kernel,
        solver: &'a dyn SpectralSolver,
    ) -> Self {
        Self {
            config,
            kernel,
            solver,
        }
    }

    /// Run EMBED/PROJECT rounds until both phases converge or the round
    /// budget is spent, then refresh the embedding for the final W
    pub fn run(
        &self,
        state: &mut KdacState,
        n_prior_clusterings: usize,
        profiler: &mut KdacProfiler,
    ) -> Result<FitReport> {
        let n_clusters = self.config.n_clusters;
        if state.x.nrows() < n_clusters {
            return Err(KdacError::Input(format!(
                "Need at least {} samples for {} clusters, got {}",
                n_clusters,
                n_clusters,
                state.x.nrows()
            )));
        }

        let projection = ProjectionStep::new(self.kernel, self.config);
        let mut objective_history = Vec::new();
        let mut objective_value = f64::NAN;
        let mut u_change = f64::INFINITY;
        let mut w_change = f64::INFINITY;
        let mut stale_embedding = true;
        let mut rounds = 0;
        let mut w_step_limit_rounds = 0;

        state.u_converged = false;
        state.w_converged = false;

        while rounds < self.config.max_rounds {
            rounds += 1;

            // EMBED
            let start = Instant::now();
            let embedding = embed(&state.x, &state.w, self.kernel, self.solver, n_clusters)?;
            profiler.u.stop(start);

            if state.is_embedded() {
                u_change = subspace_distance(&state.u, &embedding.u);
            }
            state.u_converged = u_change < self.config.tolerance;
            state.apply(embedding);
            stale_embedding = false;

            // PROJECT
            let start = Instant::now();
            let gamma_start = Instant::now();
            let gamma = gamma_matrix(
                &state.u,
                &state.d_to_the_minus_half,
                &state.h,
                &state.y,
                self.config.lambda,
            );
            profiler.gen_gamma.stop(gamma_start);

            let outcome = projection.optimize(&state.x, &state.w, &gamma, rounds == 1, profiler)?;
            profiler.w.stop(start);
            if !outcome.converged {
                w_step_limit_rounds += 1;
            }

            w_change = (&outcome.w - &state.w).norm();
            state.w_converged = w_change < self.config.tolerance;
            if w_change > 0.0 {
                stale_embedding = true;
            }
            state.w = outcome.w;
            objective_value = outcome.objective;
            objective_history.push(objective_value);

            debug!(
                "Round {}: {} change {:.3e}, {} change {:.3e} after {} steps ({}), J = {:.6}",
                rounds,
                Phase::Embed,
                u_change,
                Phase::Project,
                w_change,
                outcome.iterations,
                if outcome.converged { "converged" } else { "step limit" },
                objective_value
            );

            if state.u_converged && state.w_converged {
                break;
            }
        }

        if stale_embedding {
            let start = Instant::now();
            let embedding = embed(&state.x, &state.w, self.kernel, self.solver, n_clusters)?;
            profiler.u.stop(start);
            state.apply(embedding);
        }

        let warning = if state.u_converged && state.w_converged {
            info!("KDAC converged after {rounds} rounds (J = {objective_value:.6})");
            None
        } else {
            let warning = ConvergenceWarning {
                rounds,
                last_u_change: u_change,
                last_w_change: w_change,
            };
            warn!("KDAC {warning}");
            Some(warning)
        };

        Ok(FitReport {
            rounds,
            u_converged: state.u_converged,
            w_converged: state.w_converged,
            w_step_limit_rounds,
            objective_value,
            objective_history,
            n_prior_clusterings,
            warning,
        })
    }
}
