//! High-level API for Kernel Dimension Alternative Clustering
//!
//! [`Kdac`] owns the configuration, the spectral solver and the matrices of
//! the last successful fit.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kdac::api::Kdac;
//! use kdac::kernel::KernelType;
//! use kdac::data::MatrixDataset;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = MatrixDataset::from_csv_file("data.csv")?;
//!
//! let mut kdac = Kdac::new().with_lambda(10.0).with_seed(7);
//! kdac.configure(2, 1, KernelType::Gaussian { sigma: 2.0 })?;
//!
//! // First clustering, then one that is dissimilar to it
//! kdac.fit_dataset(&data)?;
//! let first = kdac.predict()?;
//! kdac.fit_alternative()?;
//! let second = kdac.predict()?;
//! # Ok(())
//! # }
//! ```

use crate::cluster::KMeans;
use crate::core::{
    Dataset, FitReport, KdacConfig, KdacError, PartitionClusterer, Result, SolverBackend,
    SpectralSolver,
};
use crate::data::MatrixDataset;
use crate::kernel::KernelType;
use crate::optimizer::{KdacOptimizer, KdacState};
use crate::profiler::KdacProfiler;
use crate::solver::build_solver;
use crate::utils::validation::{validate_input, validate_labels};
use log::info;
use nalgebra::DMatrix;
use std::path::Path;
use std::time::Instant;

/// Result of a fit committed to the engine
struct Fitted {
    state: KdacState,
    labels: Vec<usize>,
    report: FitReport,
}

/// KDAC engine with builder pattern
pub struct Kdac {
    config: KdacConfig,
    solver: Box<dyn SpectralSolver>,
    clusterer: Option<Box<dyn PartitionClusterer>>,
    prior_clusterings: Vec<Vec<usize>>,
    fitted: Option<Fitted>,
    profiler: KdacProfiler,
}

impl Kdac {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        let config = KdacConfig::default();
        Self {
            solver: build_solver(config.solver, config.fallback_solver),
            config,
            clusterer: None,
            prior_clusterings: Vec::new(),
            fitted: None,
            profiler: KdacProfiler::new(),
        }
    }

    /// Create an engine from a full configuration, validated up front
    pub fn from_config(config: KdacConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            solver: build_solver(config.solver, config.fallback_solver),
            config,
            ..Self::new()
        })
    }

    /// Set cluster number, reduced dimension and kernel at once
    ///
    /// Nothing changes unless all three are valid.
    pub fn configure(&mut self, c: usize, q: usize, kernel: KernelType) -> Result<()> {
        KdacConfig::check_cq(c, q)?;
        kernel.validate()?;
        self.config.n_clusters = c;
        self.config.reduced_dim = q;
        self.config.kernel = kernel;
        Ok(())
    }

    /// Set the number of clusters c
    pub fn set_c(&mut self, c: usize) -> Result<()> {
        KdacConfig::check_cq(c, self.config.reduced_dim)?;
        self.config.n_clusters = c;
        Ok(())
    }

    /// Set the reduced dimension q
    pub fn set_q(&mut self, q: usize) -> Result<()> {
        KdacConfig::check_cq(self.config.n_clusters, q)?;
        self.config.reduced_dim = q;
        Ok(())
    }

    /// Set the kernel
    pub fn set_kernel(&mut self, kernel: KernelType) -> Result<()> {
        kernel.validate()?;
        self.config.kernel = kernel;
        Ok(())
    }

    /// Set the round budget of the alternating loop
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the weight of the dissimilarity term
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.lambda = lambda;
        self
    }

    /// Set the gradient step budget of each PROJECT phase
    pub fn with_max_w_iterations(mut self, max_w_iterations: usize) -> Self {
        self.config.max_w_iterations = max_w_iterations;
        self
    }

    /// Set the initial step length of the W line search
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.config.step_size = step_size;
        self
    }

    /// Set the k-means seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the number of k-means restarts
    pub fn with_kmeans_restarts(mut self, restarts: usize) -> Self {
        self.config.kmeans_restarts = restarts;
        self
    }

    /// Select the spectral backend and its optional fallback
    pub fn with_solver_backend(
        mut self,
        backend: SolverBackend,
        fallback: Option<SolverBackend>,
    ) -> Self {
        self.config.solver = backend;
        self.config.fallback_solver = fallback;
        self.solver = build_solver(backend, fallback);
        self
    }

    /// Use a custom spectral solver
    pub fn with_solver(mut self, solver: Box<dyn SpectralSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Use a custom partition clusterer instead of the configured k-means
    pub fn with_clusterer(mut self, clusterer: Box<dyn PartitionClusterer>) -> Self {
        self.clusterer = Some(clusterer);
        self
    }

    /// Fit the first clustering of `input` (n x d), forgetting any priors
    pub fn fit(&mut self, input: &DMatrix<f64>) -> Result<FitReport> {
        self.run_fit(input.clone(), Vec::new())
    }

    /// Fit the first clustering of a dataset
    pub fn fit_dataset<D: Dataset>(&mut self, dataset: &D) -> Result<FitReport> {
        self.fit(&dataset.to_matrix())
    }

    /// Fit the first clustering of a CSV file
    pub fn fit_from_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<FitReport> {
        let dataset = MatrixDataset::from_csv_file(path)?;
        self.fit_dataset(&dataset)
    }

    /// Find a clustering dissimilar to every clustering found so far
    ///
    /// The current labels are added to the prior clusterings and the loop
    /// is rerun on the same data from a reset projection.
    pub fn fit_alternative(&mut self) -> Result<FitReport> {
        let Some(fitted) = &self.fitted else {
            return Err(KdacError::Precondition(
                "fit must succeed before an alternative clustering can be searched".to_string(),
            ));
        };

        let input = fitted.state.x.clone();
        let mut priors = self.prior_clusterings.clone();
        priors.push(fitted.labels.clone());
        self.run_fit(input, priors)
    }

    /// Fit a clustering of `input` dissimilar to the given one
    pub fn fit_with_labels(&mut self, input: &DMatrix<f64>, labels: &[usize]) -> Result<FitReport> {
        validate_labels(labels, input.nrows())?;
        self.run_fit(input.clone(), vec![labels.to_vec()])
    }

    /// Cluster labels of the last fit, one per sample, in [0, c)
    pub fn predict(&self) -> Result<Vec<usize>> {
        self.fitted
            .as_ref()
            .map(|fitted| fitted.labels.clone())
            .ok_or_else(|| KdacError::Precondition("predict called before fit".to_string()))
    }

    fn run_fit(&mut self, input: DMatrix<f64>, priors: Vec<Vec<usize>>) -> Result<FitReport> {
        let fit_start = Instant::now();
        self.config.validate()?;
        validate_input(&input)?;
        for labels in &priors {
            validate_labels(labels, input.nrows())?;
        }

        let start = Instant::now();
        let kernel = self.config.kernel.build()?;
        let mut state = KdacState::new(input, self.config.reduced_dim, &priors);
        self.profiler.init.stop(start);

        info!(
            "Fitting KDAC: n = {}, d = {}, c = {}, q = {}, kernel = {}, solver = {}, {} prior clusterings",
            state.x.nrows(),
            state.x.ncols(),
            self.config.n_clusters,
            state.w.ncols(),
            self.config.kernel,
            self.solver.name(),
            priors.len()
        );

        let optimizer = KdacOptimizer::new(&self.config, kernel.as_ref(), self.solver.as_ref());
        let report = optimizer.run(&mut state, priors.len(), &mut self.profiler)?;

        let start = Instant::now();
        let labels = self.partition(&state.u_normalized)?;
        self.profiler.kmeans.stop(start);

        self.prior_clusterings = priors;
        self.fitted = Some(Fitted {
            state,
            labels,
            report: report.clone(),
        });
        self.profiler.fit.stop(fit_start);
        Ok(report)
    }

    fn partition(&self, rows: &DMatrix<f64>) -> Result<Vec<usize>> {
        match &self.clusterer {
            Some(clusterer) => clusterer.partition(rows, self.config.n_clusters),
            None => KMeans::new(self.config.seed)
                .with_restarts(self.config.kmeans_restarts)
                .with_max_iterations(self.config.kmeans_max_iterations)
                .partition(rows, self.config.n_clusters),
        }
    }

    fn snapshot(&self, select: impl Fn(&KdacState) -> &DMatrix<f64>) -> Option<DMatrix<f64>> {
        self.fitted.as_ref().map(|fitted| select(&fitted.state).clone())
    }

    /// Spectral embedding U (n x c)
    pub fn u(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.u)
    }

    /// Row-normalized embedding
    pub fn u_normalized(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.u_normalized)
    }

    /// Kernel matrix of the projected data
    pub fn k(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.k)
    }

    /// Degree matrix
    pub fn d(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.d)
    }

    pub fn d_to_the_minus_half(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.d_to_the_minus_half)
    }

    /// Normalized affinity D^(-1/2) K D^(-1/2)
    pub fn l(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.l)
    }

    /// Projection matrix W (d x q')
    pub fn w(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.w)
    }

    /// Centering matrix
    pub fn h(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.h)
    }

    /// Indicator matrix of the prior clusterings
    pub fn y(&self) -> Option<DMatrix<f64>> {
        self.snapshot(|s| &s.y)
    }

    /// Report of the last successful fit
    pub fn last_report(&self) -> Option<&FitReport> {
        self.fitted.as_ref().map(|fitted| &fitted.report)
    }

    /// Clusterings the last fit was made dissimilar to
    pub fn prior_clusterings(&self) -> &[Vec<usize>] {
        &self.prior_clusterings
    }

    pub fn config(&self) -> &KdacConfig {
        &self.config
    }

    pub fn profiler(&self) -> &KdacProfiler {
        &self.profiler
    }
}

impl Default for Kdac {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Cluster a CSV file into `c` groups with default parameters
    pub fn cluster_csv<P: AsRef<Path>>(path: P, c: usize) -> Result<Vec<usize>> {
        let mut kdac = Kdac::new();
        kdac.configure(c, c.min(kdac.config().reduced_dim), kdac.config().kernel)?;
        kdac.fit_from_csv(path)?;
        kdac.predict()
    }

    /// First clustering of `input` followed by `n_alternatives` alternative
    /// ones, each dissimilar to all the previous
    pub fn alternative_views(
        kdac: &mut Kdac,
        input: &DMatrix<f64>,
        n_alternatives: usize,
    ) -> Result<Vec<Vec<usize>>> {
        kdac.fit(input)?;
        let mut views = vec![kdac.predict()?];
        for _ in 0..n_alternatives {
            kdac.fit_alternative()?;
            views.push(kdac.predict()?);
        }
        Ok(views)
    }
}
