//! KDAC Command Line Interface
//!
//! Clusters dense CSV data and searches alternative clustering views,
//! writing the labelings as a JSON report.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use kdac::api::Kdac;
use kdac::core::{FitReport, KdacConfig, KdacError, Result, SolverBackend};
use kdac::kernel::KernelType;
use kdac::utils::metrics::normalized_mutual_information;
use kdac::utils::scaling::{fit_transform, ScalingMethod};
use kdac::{Dataset, MatrixDataset};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "kdac")]
#[command(about = "Kernel Dimension Alternative Clustering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a dataset and search alternative views
    Cluster(ClusterArgs),
    /// Compare the views stored in a clustering report
    Compare(CompareArgs),
    /// Display dataset information
    Info(InfoArgs),
}

#[derive(Args)]
struct ClusterArgs {
    /// Data file (dense CSV, one sample per row)
    #[arg(long)]
    data: PathBuf,

    /// Number of clusters c
    #[arg(short = 'c', long = "clusters", default_value = "2")]
    clusters: usize,

    /// Reduced dimension q (q <= c)
    #[arg(short = 'q', long = "reduced-dim", default_value = "2")]
    reduced_dim: usize,

    /// Kernel function
    #[arg(short, long, default_value = "gaussian")]
    kernel: CliKernel,

    /// Kernel parameter: sigma, polynomial order or linear offset
    #[arg(short, long, default_value = "1.0")]
    param: f64,

    /// Number of alternative clusterings searched after the first one
    #[arg(short, long, default_value = "0")]
    alternatives: usize,

    /// Weight of the dissimilarity term
    #[arg(long, default_value = "10.0")]
    lambda: f64,

    /// Maximum EMBED/PROJECT rounds per fit
    #[arg(long, default_value = "20")]
    max_rounds: usize,

    /// Seed for k-means
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Spectral decomposition backend
    #[arg(long, default_value = "eigen")]
    solver: CliSolver,

    /// Feature scaling method
    #[arg(long)]
    feature_scaling: Option<CliScalingMethod>,

    /// Standardize features (same as --feature-scaling standard)
    #[arg(long)]
    standardize: bool,

    /// Output report file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    /// Clustering report written by `kdac cluster`
    report: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Data file
    data: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    /// exp(-||x - y||² / (2σ²))
    #[value(name = "gaussian")]
    Gaussian,
    /// (x·y + 1)^p
    #[value(name = "polynomial")]
    Polynomial,
    /// x·y + offset
    #[value(name = "linear")]
    Linear,
}

impl CliKernel {
    fn name(self) -> &'static str {
        match self {
            CliKernel::Gaussian => "gaussian",
            CliKernel::Polynomial => "polynomial",
            CliKernel::Linear => "linear",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliSolver {
    /// Symmetric eigendecomposition with SVD fallback
    #[value(name = "eigen")]
    Eigen,
    /// Singular value decomposition with eigen fallback
    #[value(name = "svd")]
    Svd,
}

impl From<CliSolver> for SolverBackend {
    fn from(cli_solver: CliSolver) -> Self {
        match cli_solver {
            CliSolver::Eigen => SolverBackend::Eigen,
            CliSolver::Svd => SolverBackend::Svd,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum CliScalingMethod {
    /// Min-Max scaling to [-1, 1] range
    #[value(name = "minmax")]
    MinMax,
    /// Standard score (Z-score) normalization
    #[value(name = "standard")]
    StandardScore,
    /// Unit scaling by maximum absolute value
    #[value(name = "unit")]
    UnitScale,
}

impl From<CliScalingMethod> for ScalingMethod {
    fn from(cli_method: CliScalingMethod) -> Self {
        match cli_method {
            CliScalingMethod::MinMax => ScalingMethod::MinMax {
                min_val: -1.0,
                max_val: 1.0,
            },
            CliScalingMethod::StandardScore => ScalingMethod::StandardScore,
            CliScalingMethod::UnitScale => ScalingMethod::UnitScale,
        }
    }
}

/// JSON report of one `cluster` run
#[derive(Debug, Serialize, Deserialize)]
struct ClusteringReport {
    created_at: DateTime<Utc>,
    version: String,
    data: String,
    n_samples: usize,
    n_features: usize,
    config: KdacConfig,
    views: Vec<ViewReport>,
}

/// One clustering view and the fit that produced it
#[derive(Debug, Serialize, Deserialize)]
struct ViewReport {
    labels: Vec<usize>,
    rounds: usize,
    converged: bool,
    objective_value: f64,
    warning: Option<String>,
    /// NMI against each earlier view
    nmi_to_previous: Vec<f64>,
}

impl ViewReport {
    fn new(labels: Vec<usize>, fit: &FitReport, previous: &[ViewReport]) -> Result<Self> {
        let nmi_to_previous = previous
            .iter()
            .map(|view| normalized_mutual_information(&view.labels, &labels))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            labels,
            rounds: fit.rounds,
            converged: fit.converged(),
            objective_value: fit.objective_value,
            warning: fit.warning.as_ref().map(|w| w.to_string()),
            nmi_to_previous,
        })
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Cluster(args) => cluster_command(args),
        Commands::Compare(args) => compare_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn cluster_command(args: ClusterArgs) -> Result<()> {
    info!("Loading dataset from: {:?}", args.data);
    let dataset = MatrixDataset::from_csv_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );

    let mut input = dataset.to_matrix();
    let scaling = match (&args.feature_scaling, args.standardize) {
        (Some(method), _) => Some(method.clone().into()),
        (None, true) => Some(ScalingMethod::StandardScore),
        (None, false) => None,
    };
    if let Some(method) = scaling {
        info!("Using feature scaling: {method:?}");
        input = fit_transform(&input, method)?.0;
    }

    let kernel = KernelType::from_name(args.kernel.name(), args.param)?;
    let backend: SolverBackend = args.solver.into();
    let fallback = match backend {
        SolverBackend::Eigen => SolverBackend::Svd,
        SolverBackend::Svd => SolverBackend::Eigen,
    };

    let mut kdac = Kdac::new()
        .with_lambda(args.lambda)
        .with_max_rounds(args.max_rounds)
        .with_seed(args.seed)
        .with_solver_backend(backend, Some(fallback));
    kdac.configure(args.clusters, args.reduced_dim, kernel)?;

    let mut views: Vec<ViewReport> = Vec::new();
    let fit = kdac.fit(&input)?;
    views.push(ViewReport::new(kdac.predict()?, &fit, &views)?);

    for i in 0..args.alternatives {
        info!("Searching alternative clustering {}", i + 1);
        let fit = kdac.fit_alternative()?;
        let view = ViewReport::new(kdac.predict()?, &fit, &views)?;
        views.push(view);
    }

    for (i, view) in views.iter().enumerate() {
        if let Some(warning) = &view.warning {
            warn!("View {i}: {warning}");
        }
    }

    let report = ClusteringReport {
        created_at: Utc::now(),
        version: kdac::VERSION.to_string(),
        data: args.data.display().to_string(),
        n_samples: input.nrows(),
        n_features: input.ncols(),
        config: kdac.config().clone(),
        views,
    };

    match args.output {
        Some(path) => {
            write_report(&report, &path)?;
            info!("Report saved to: {path:?}");
        }
        None => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| KdacError::SerializationError(e.to_string()))?;
            println!("{json}");
        }
    }

    let profiler = kdac.profiler();
    info!(
        "Time: fit {:?}, u-step {:?}, w-step {:?}, k-means {:?}",
        profiler.fit.total(),
        profiler.u.total(),
        profiler.w.total(),
        profiler.kmeans.total()
    );

    Ok(())
}

fn write_report(report: &ClusteringReport, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| KdacError::SerializationError(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

fn read_report(path: &Path) -> Result<ClusteringReport> {
    let file = File::open(path)?;
    let report: ClusteringReport = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| KdacError::SerializationError(e.to_string()))?;

    for (i, view) in report.views.iter().enumerate() {
        if view.labels.len() != report.n_samples {
            return Err(KdacError::ParseError(format!(
                "View {i} has {} labels, expected {}",
                view.labels.len(),
                report.n_samples
            )));
        }
    }
    Ok(report)
}

fn compare_command(args: CompareArgs) -> Result<()> {
    info!("Loading report from: {:?}", args.report);
    let report = read_report(&args.report)?;

    println!("=== Clustering Views ===");
    println!("Data: {}", report.data);
    println!("Created: {}", report.created_at.to_rfc3339());
    println!("Views: {}", report.views.len());

    println!("\nNormalized mutual information:");
    for (i, a) in report.views.iter().enumerate() {
        let row = report
            .views
            .iter()
            .map(|b| normalized_mutual_information(&a.labels, &b.labels).map(|v| format!("{v:.4}")))
            .collect::<Result<Vec<_>>>()?;
        println!("  view {i}: {}", row.join(" "));
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading dataset from: {:?}", args.data);
    let dataset = MatrixDataset::from_csv_file(&args.data)?;

    println!("=== Dataset ===");
    println!("Samples:  {}", dataset.len());
    println!("Features: {}", dataset.dim());
    if let Some(header) = dataset.header() {
        println!("Columns:  {}", header.join(", "));
    }

    Ok(())
}
