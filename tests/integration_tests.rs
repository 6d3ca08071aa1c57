//! Integration tests for the kdac library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_relative_eq;
use kdac::api::{quick, Kdac};
use kdac::core::{KdacError, SolverBackend};
use kdac::kernel::KernelType;
use kdac::utils::metrics::normalized_mutual_information;
use kdac::{Dataset, MatrixDataset};
use nalgebra::{DMatrix, SymmetricEigen};
use std::io::Write;
use tempfile::NamedTempFile;

/// Five points around each corner of a 10 x 10 square
///
/// Rows 0-4: (0, 0), 5-9: (0, 10), 10-14: (10, 0), 15-19: (10, 10).
fn four_blobs() -> DMatrix<f64> {
    let centers = [(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0)];
    let jitter = [(0.0, 0.0), (0.3, -0.2), (-0.25, 0.15), (0.1, 0.35), (-0.2, -0.3)];

    let mut values = Vec::with_capacity(40);
    for (cx, cy) in centers {
        for (jx, jy) in jitter {
            values.push(cx + jx);
            values.push(cy + jy);
        }
    }
    DMatrix::from_row_slice(20, 2, &values)
}

/// Split of the four blobs by x coordinate
fn x_split() -> Vec<usize> {
    (0..20).map(|i| usize::from(i >= 10)).collect()
}

/// Split of the four blobs by y coordinate
fn y_split() -> Vec<usize> {
    (0..20).map(|i| usize::from((i / 5) % 2 == 1)).collect()
}

fn nmi(a: &[usize], b: &[usize]) -> f64 {
    normalized_mutual_information(a, b).expect("Labelings should have equal length")
}

fn two_pairs() -> DMatrix<f64> {
    DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 0.3, 0.1, 5.0, 5.0, 5.2, 4.8])
}

fn blob_engine() -> Kdac {
    let mut kdac = Kdac::new().with_lambda(10.0);
    kdac.configure(2, 1, KernelType::Gaussian { sigma: 2.0 })
        .expect("Configuration should be valid");
    kdac
}

#[test]
fn test_configure_rejects_q_above_c() {
    let mut kdac = Kdac::new();
    let result = kdac.configure(2, 3, KernelType::Gaussian { sigma: 1.0 });
    assert!(matches!(result, Err(KdacError::Configuration(_))));
}

#[test]
fn test_empty_input() {
    let mut kdac = Kdac::new();
    let result = kdac.fit(&DMatrix::zeros(0, 2));
    assert!(matches!(result, Err(KdacError::Input(_))));
    assert!(matches!(kdac.predict(), Err(KdacError::Precondition(_))));
}

#[test]
fn test_fewer_samples_than_clusters() {
    let mut kdac = Kdac::new();
    kdac.set_c(3).unwrap();
    let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
    assert!(matches!(kdac.fit(&x), Err(KdacError::Input(_))));
}

#[test]
fn test_labels_in_range() {
    let mut kdac = Kdac::new();
    kdac.configure(3, 2, KernelType::Gaussian { sigma: 2.0 }).unwrap();
    kdac.fit(&four_blobs()).expect("Fit should succeed");

    let labels = kdac.predict().unwrap();
    assert_eq!(labels.len(), 20);
    assert!(labels.iter().all(|&l| l < 3));
}

#[test]
fn test_degree_normalization_identity() {
    let mut kdac = blob_engine();
    kdac.fit(&four_blobs()).unwrap();

    let d = kdac.d().unwrap();
    let d_inv_sqrt = kdac.d_to_the_minus_half().unwrap();
    let identity = &d_inv_sqrt * &d * &d_inv_sqrt;
    assert_relative_eq!(identity, DMatrix::identity(20, 20), epsilon = 1e-10);
}

#[test]
fn test_normalized_affinity_spectrum() {
    let mut kdac = blob_engine();
    kdac.fit(&four_blobs()).unwrap();

    let l = kdac.l().unwrap();
    assert_relative_eq!(l.clone(), l.transpose(), epsilon = 1e-12);

    let eigenvalues = SymmetricEigen::new(l).eigenvalues;
    for value in eigenvalues.iter() {
        assert!(*value <= 1.0 + 1e-9 && *value >= -1.0 - 1e-9);
    }
}

#[test]
fn test_embedding_rows_unit_norm() {
    let mut kdac = blob_engine();
    kdac.fit(&four_blobs()).unwrap();

    let u = kdac.u().unwrap();
    let u_normalized = kdac.u_normalized().unwrap();
    assert_eq!(u.shape(), (20, 2));
    for row in u_normalized.row_iter() {
        assert_relative_eq!(row.norm(), 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_fresh_engines_agree() {
    let mut first = blob_engine();
    let mut second = blob_engine();
    first.fit(&four_blobs()).unwrap();
    second.fit(&four_blobs()).unwrap();

    let a = first.u_normalized().unwrap();
    let b = second.u_normalized().unwrap();
    assert_relative_eq!(&a * a.transpose(), &b * b.transpose(), epsilon = 1e-8);
    assert_eq!(first.predict().unwrap(), second.predict().unwrap());
}

#[test]
fn test_refit_is_idempotent() {
    let mut kdac = blob_engine();
    kdac.fit(&four_blobs()).unwrap();
    let labels = kdac.predict().unwrap();
    let u = kdac.u_normalized().unwrap();

    kdac.fit(&four_blobs()).unwrap();
    assert_eq!(kdac.predict().unwrap(), labels);
    assert_relative_eq!(kdac.u_normalized().unwrap(), u, epsilon = 1e-12);
}

#[test]
fn test_two_pairs_are_separated() {
    let mut kdac = Kdac::new();
    kdac.fit(&two_pairs()).unwrap();

    let u = kdac.u_normalized().unwrap();
    let dist = |i: usize, j: usize| (u.row(i) - u.row(j)).norm();
    assert!(dist(0, 1) < dist(0, 2));
    assert!(dist(0, 1) < dist(1, 3));
    assert!(dist(2, 3) < dist(2, 0));
    assert!(dist(2, 3) < dist(3, 1));

    let labels = kdac.predict().unwrap();
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[2], labels[3]);
    assert_ne!(labels[0], labels[2]);
}

#[test]
fn test_first_view_follows_initial_projection() {
    // W starts at the first coordinate axis
    let mut kdac = blob_engine();
    let report = kdac.fit(&four_blobs()).unwrap();
    assert_eq!(report.n_prior_clusterings, 0);

    let labels = kdac.predict().unwrap();
    assert_relative_eq!(
        nmi(&labels, &x_split()),
        1.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_alternative_view_is_dissimilar() {
    let mut kdac = blob_engine();
    kdac.fit(&four_blobs()).unwrap();
    let first = kdac.predict().unwrap();

    let report = kdac.fit_alternative().expect("Alternative fit should succeed");
    assert_eq!(report.n_prior_clusterings, 1);
    let second = kdac.predict().unwrap();

    assert!(
        nmi(&first, &second) < 0.1,
        "Alternative view should be nearly independent of the first one"
    );
    assert_relative_eq!(
        nmi(&second, &y_split()),
        1.0,
        epsilon = 1e-9
    );

    // The projection turned to the second axis
    let w = kdac.w().unwrap();
    assert!(w[(1, 0)].abs() > 0.9);
}

#[test]
fn test_fit_with_labels() {
    let mut kdac = blob_engine();
    kdac.fit_with_labels(&four_blobs(), &x_split()).unwrap();

    let labels = kdac.predict().unwrap();
    assert!(nmi(&labels, &x_split()) < 0.1);
    assert_eq!(kdac.prior_clusterings(), &[x_split()]);
    assert_eq!(kdac.y().unwrap().shape(), (20, 2));
}

#[test]
fn test_alternative_views_helper() {
    let mut kdac = blob_engine();
    let views = quick::alternative_views(&mut kdac, &four_blobs(), 1).unwrap();
    assert_eq!(views.len(), 2);
    assert!(nmi(&views[0], &views[1]) < 0.1);
}

#[test]
fn test_svd_backend_matches_eigen() {
    let mut eigen = blob_engine();
    let mut svd = blob_engine().with_solver_backend(SolverBackend::Svd, None);
    eigen.fit(&four_blobs()).unwrap();
    svd.fit(&four_blobs()).unwrap();

    let a = eigen.u().unwrap();
    let b = svd.u().unwrap();
    assert_relative_eq!(&a * a.transpose(), &b * b.transpose(), epsilon = 1e-3);
    assert_relative_eq!(
        nmi(&eigen.predict().unwrap(), &svd.predict().unwrap()),
        1.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_polynomial_kernel_fit() {
    let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.1, 0.1, 0.0, 2.0, 2.1, 2.1, 2.0]);
    let mut kdac = Kdac::new();
    kdac.configure(2, 1, KernelType::Polynomial { order: 2 }).unwrap();
    kdac.fit(&x).expect("Polynomial fit should succeed");

    let labels = kdac.predict().unwrap();
    assert_eq!(labels.len(), 4);
    assert!(labels.iter().all(|&l| l < 2));
}

#[test]
fn test_linear_kernel_non_positive_degree() {
    let x = DMatrix::from_row_slice(4, 1, &[1.0, -1.0, 1.0, -1.0]);
    let mut kdac = Kdac::new();
    kdac.configure(2, 1, KernelType::Linear { offset: 0.0 }).unwrap();
    assert!(matches!(kdac.fit(&x), Err(KdacError::Numerical(_))));
    assert!(kdac.u().is_none());
}

#[test]
fn test_report_and_profiler() {
    let mut kdac = blob_engine();
    let report = kdac.fit(&four_blobs()).unwrap();

    assert!(report.rounds >= 2);
    assert_eq!(report.objective_history.len(), report.rounds);
    assert_eq!(report.objective_value, *report.objective_history.last().unwrap());
    assert_eq!(report.converged(), report.warning.is_none());

    let profiler = kdac.profiler();
    assert_eq!(profiler.fit.calls(), 1);
    assert!(profiler.u.calls() >= report.rounds as u64);
    assert_eq!(profiler.w.calls(), report.rounds as u64);
}

#[test]
fn test_complete_workflow_csv() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp_file, "x,y").expect("Failed to write");
    for row in four_blobs().row_iter() {
        writeln!(temp_file, "{},{}", row[0], row[1]).expect("Failed to write");
    }
    temp_file.flush().expect("Failed to flush");

    let dataset = MatrixDataset::from_csv_file(temp_file.path()).expect("Failed to load dataset");
    assert_eq!(dataset.len(), 20);
    assert_eq!(dataset.dim(), 2);

    let mut kdac = blob_engine();
    kdac.fit_dataset(&dataset).expect("Fit should succeed");
    let first = kdac.predict().unwrap();
    kdac.fit_alternative().unwrap();
    let second = kdac.predict().unwrap();

    assert!(nmi(&first, &x_split()) > 0.9);
    assert!(nmi(&second, &y_split()) > 0.9);
}
