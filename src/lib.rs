//! Rust implementation of Kernel Dimension Alternative Clustering (KDAC)
//!
//! Based on "Iterative Discovery of Multiple Alternative Clustering Views"
//! by Donglin Niu, Jennifer G. Dy and Michael I. Jordan

pub mod api;
pub mod cluster;
pub mod core;
pub mod data;
pub mod kernel;
pub mod optimizer;
pub mod profiler;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::Kdac;
pub use crate::cluster::{KMeans, KMeansResult};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::MatrixDataset;
pub use crate::kernel::{Kernel, KernelType};
pub use crate::optimizer::{KdacOptimizer, KdacState};
pub use crate::profiler::{KdacProfiler, Timer};
pub use crate::solver::{build_solver, EigenSolver, FallbackSolver, SvdSolver};
pub use crate::utils::metrics::normalized_mutual_information;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
