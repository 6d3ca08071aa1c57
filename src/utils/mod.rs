//! Utility functions for KDAC

use crate::core::{KdacError, Result};
use nalgebra::DMatrix;

/// Feature scaling utilities
pub mod scaling {
    use super::*;

    /// Feature scaling methods
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum ScalingMethod {
        /// Min-Max scaling to [min_val, max_val] range
        MinMax { min_val: f64, max_val: f64 },
        /// Standard (Z-score) normalization: (x - mean) / std
        StandardScore,
        /// Unit scaling: x / max(|x|)
        UnitScale,
    }

    impl Default for ScalingMethod {
        fn default() -> Self {
            Self::StandardScore
        }
    }

    /// Statistics for a single feature column
    #[derive(Debug, Clone)]
    pub struct FeatureStats {
        pub min: f64,
        pub max: f64,
        pub mean: f64,
        pub std: f64,
    }

    /// Fitted per-column scaling parameters
    #[derive(Debug, Clone)]
    pub struct ScalingParams {
        pub method: ScalingMethod,
        pub feature_stats: Vec<FeatureStats>,
    }

    impl ScalingParams {
        /// Compute scaling parameters from the columns of `data`
        pub fn fit(data: &DMatrix<f64>, method: ScalingMethod) -> Self {
            let feature_stats = data
                .column_iter()
                .map(|column| {
                    let n = column.len();
                    let min = column.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                    let max = column.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                    let mean = column.sum() / n as f64;
                    let variance = if n > 1 {
                        column.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
                    } else {
                        0.0
                    };
                    FeatureStats {
                        min,
                        max,
                        mean,
                        std: variance.sqrt(),
                    }
                })
                .collect();

            Self {
                method,
                feature_stats,
            }
        }

        /// Scale every column of `data` with the fitted statistics
        pub fn transform(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
            if data.ncols() != self.feature_stats.len() {
                return Err(KdacError::DimensionMismatch {
                    expected: self.feature_stats.len(),
                    actual: data.ncols(),
                });
            }
            Ok(DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
                self.scale_value(data[(i, j)], &self.feature_stats[j])
            }))
        }

        fn scale_value(&self, value: f64, stats: &FeatureStats) -> f64 {
            match self.method {
                ScalingMethod::MinMax { min_val, max_val } => {
                    if (stats.max - stats.min).abs() < 1e-12 {
                        // Constant feature
                        (min_val + max_val) / 2.0
                    } else {
                        let normalized = (value - stats.min) / (stats.max - stats.min);
                        min_val + normalized * (max_val - min_val)
                    }
                }
                ScalingMethod::StandardScore => {
                    if stats.std < 1e-12 {
                        0.0
                    } else {
                        (value - stats.mean) / stats.std
                    }
                }
                ScalingMethod::UnitScale => {
                    let max_abs = stats.max.abs().max(stats.min.abs());
                    if max_abs < 1e-12 {
                        0.0
                    } else {
                        value / max_abs
                    }
                }
            }
        }
    }

    /// Convenience function: fit and transform in one step
    pub fn fit_transform(
        data: &DMatrix<f64>,
        method: ScalingMethod,
    ) -> Result<(DMatrix<f64>, ScalingParams)> {
        let params = ScalingParams::fit(data, method);
        let transformed = params.transform(data)?;
        Ok((transformed, params))
    }
}

/// Input validation
pub mod validation {
    use super::*;

    /// Reject empty or non-finite input matrices
    pub fn validate_input(input: &DMatrix<f64>) -> Result<()> {
        if input.nrows() == 0 || input.ncols() == 0 {
            return Err(KdacError::Input(format!(
                "Input matrix must have at least one sample and one feature, got {}x{}",
                input.nrows(),
                input.ncols()
            )));
        }
        if let Some(position) = input.iter().position(|v| !v.is_finite()) {
            // Column-major storage
            let (row, col) = (position % input.nrows(), position / input.nrows());
            return Err(KdacError::Input(format!(
                "Input matrix contains a non-finite value at ({row}, {col})"
            )));
        }
        Ok(())
    }

    /// Check that a labeling covers exactly `n_samples` samples
    pub fn validate_labels(labels: &[usize], n_samples: usize) -> Result<()> {
        if labels.len() != n_samples {
            return Err(KdacError::Input(format!(
                "Label vector has {} entries but the input has {n_samples} samples",
                labels.len()
            )));
        }
        Ok(())
    }
}

/// Matrix constructors used by the projection objective
pub mod matrices {
    use super::*;

    /// Centering matrix H = I - (1/n) 1 1ᵀ
    pub fn centering_matrix(n: usize) -> DMatrix<f64> {
        let n_f = n as f64;
        DMatrix::from_fn(n, n, |i, j| if i == j { 1.0 - 1.0 / n_f } else { -1.0 / n_f })
    }

    /// One-hot indicator matrix (n x number of distinct labels)
    ///
    /// Column order follows the sorted distinct label values.
    pub fn one_hot(labels: &[usize]) -> DMatrix<f64> {
        let mut distinct: Vec<usize> = labels.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        let mut indicator = DMatrix::zeros(labels.len(), distinct.len());
        for (i, label) in labels.iter().enumerate() {
            if let Ok(col) = distinct.binary_search(label) {
                indicator[(i, col)] = 1.0;
            }
        }
        indicator
    }

    /// Stack the one-hot blocks of several labelings side by side
    pub fn label_indicator(clusterings: &[Vec<usize>], n_samples: usize) -> DMatrix<f64> {
        let blocks: Vec<DMatrix<f64>> = clusterings.iter().map(|l| one_hot(l)).collect();
        let width: usize = blocks.iter().map(|b| b.ncols()).sum();

        let mut y = DMatrix::zeros(n_samples, width);
        let mut offset = 0;
        for block in &blocks {
            y.view_mut((0, offset), (n_samples, block.ncols()))
                .copy_from(block);
            offset += block.ncols();
        }
        y
    }
}

/// Clustering comparison metrics
pub mod metrics {
    use super::*;
    use std::collections::HashMap;

    /// Normalized mutual information between two labelings
    ///
    /// NMI = I(A; B) / sqrt(H(A) H(B)), in [0, 1]. Returns 1.0 when both
    /// labelings are constant (identical trivial partitions) and 0.0 when
    /// only one of them is. Labelings of different lengths are an
    /// [`KdacError::Input`].
    pub fn normalized_mutual_information(a: &[usize], b: &[usize]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(KdacError::Input(format!(
                "Labelings must have the same length, got {} and {}",
                a.len(),
                b.len()
            )));
        }
        let n = a.len() as f64;
        if a.is_empty() {
            return Ok(1.0);
        }

        let mut joint: HashMap<(usize, usize), f64> = HashMap::new();
        let mut count_a: HashMap<usize, f64> = HashMap::new();
        let mut count_b: HashMap<usize, f64> = HashMap::new();
        for (&x, &y) in a.iter().zip(b) {
            *joint.entry((x, y)).or_default() += 1.0;
            *count_a.entry(x).or_default() += 1.0;
            *count_b.entry(y).or_default() += 1.0;
        }

        let entropy = |counts: &HashMap<usize, f64>| -> f64 {
            counts
                .values()
                .map(|&c| {
                    let p = c / n;
                    -p * p.ln()
                })
                .sum()
        };
        let h_a = entropy(&count_a);
        let h_b = entropy(&count_b);

        if h_a == 0.0 && h_b == 0.0 {
            return Ok(1.0);
        }
        if h_a == 0.0 || h_b == 0.0 {
            return Ok(0.0);
        }

        let mutual: f64 = joint
            .iter()
            .map(|(&(x, y), &c)| {
                let p_xy = c / n;
                p_xy * (p_xy / ((count_a[&x] / n) * (count_b[&y] / n))).ln()
            })
            .sum();

        Ok((mutual / (h_a * h_b).sqrt()).clamp(0.0, 1.0))
    }
}
