//! K-means clustering with k-means++ seeding
//!
//! Used to turn the row-normalized spectral embedding into labels. Runs a
//! fixed number of seeded restarts and keeps the one with the lowest
//! inertia, so the output is reproducible for a given seed.

use crate::core::{KdacError, PartitionClusterer, Result};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// K-means configuration
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Maximum Lloyd iterations per restart
    pub max_iterations: usize,
    /// Number of independent restarts
    pub restarts: usize,
    /// Stop when no centroid moves more than this
    pub tolerance: f64,
    /// Base RNG seed; restart `t` uses `seed + t`
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            restarts: 8,
            tolerance: 1e-6,
            seed: 42,
        }
    }
}

/// Result of a k-means run
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per row, numbered in order of first appearance
    pub labels: Vec<usize>,
    /// Final centroids
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations of the winning restart
    pub iterations: usize,
}

impl KMeans {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cluster the rows of `data` into `k` groups
    pub fn fit(&self, data: &DMatrix<f64>, k: usize) -> Result<KMeansResult> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(KdacError::Input("Cannot cluster an empty matrix".to_string()));
        }
        if k == 0 {
            return Err(KdacError::Configuration(
                "Number of clusters must be positive".to_string(),
            ));
        }

        let points: Vec<Vec<f64>> = data
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        let mut best: Option<KMeansResult> = None;
        for restart in 0..self.restarts.max(1) {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(restart as u64));
            let result = self.lloyd(&points, k, &mut rng);
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        best.ok_or_else(|| KdacError::Input("k-means produced no result".to_string()))
    }

    fn lloyd(&self, points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> KMeansResult {
        let n = points.len();
        let dim = points[0].len();
        let mut centroids = init_plus_plus(points, k, rng);
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;

            // 1. Assignment step
            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let (nearest, _) = nearest_centroid(point, &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            // 2. Update step; empty clusters keep their centroid
            let mut sums = vec![vec![0.0; dim]; k];
            let mut counts = vec![0_usize; k];
            for (point, &label) in points.iter().zip(&labels) {
                counts[label] += 1;
                for (s, v) in sums[label].iter_mut().zip(point) {
                    *s += v;
                }
            }

            let mut max_shift_sq = 0.0_f64;
            for c in 0..k {
                if counts[c] == 0 {
                    continue;
                }
                let updated: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
                max_shift_sq = max_shift_sq.max(distance_sq(&centroids[c], &updated));
                centroids[c] = updated;
            }

            if !changed || max_shift_sq < self.tolerance * self.tolerance {
                break;
            }
        }

        // Final assignment against the final centroids
        let mut inertia = 0.0;
        for (i, point) in points.iter().enumerate() {
            let (nearest, dist) = nearest_centroid(point, &centroids);
            labels[i] = nearest;
            inertia += dist;
        }

        let (labels, centroids) = relabel_by_first_appearance(labels, centroids);
        KMeansResult {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

impl PartitionClusterer for KMeans {
    fn partition(&self, rows: &DMatrix<f64>, n_clusters: usize) -> Result<Vec<usize>> {
        Ok(self.fit(rows, n_clusters)?.labels)
    }
}

/// k-means++ seeding: each next centroid is drawn with probability
/// proportional to its squared distance from the chosen ones
fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    let mut min_dist: Vec<f64> = points.iter().map(|p| distance_sq(p, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = None;
            for (i, &d) in min_dist.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                chosen = Some(i);
                target -= d;
                if target <= 0.0 {
                    break;
                }
            }
            chosen.unwrap_or_else(|| rng.gen_range(0..n))
        } else {
            // All points coincide with a centroid
            rng.gen_range(0..n)
        };

        centroids.push(points[next].clone());
        let newest = &centroids[centroids.len() - 1];
        for (d, p) in min_dist.iter_mut().zip(points) {
            *d = d.min(distance_sq(p, newest));
        }
    }

    centroids
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = distance_sq(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn relabel_by_first_appearance(
    labels: Vec<usize>,
    centroids: Vec<Vec<f64>>,
) -> (Vec<usize>, Vec<Vec<f64>>) {
    let k = centroids.len();
    let mut mapping = vec![usize::MAX; k];
    let mut next = 0;
    for &label in &labels {
        if mapping[label] == usize::MAX {
            mapping[label] = next;
            next += 1;
        }
    }
    // Clusters that ended up empty go last
    for slot in mapping.iter_mut().filter(|m| **m == usize::MAX) {
        *slot = next;
        next += 1;
    }

    let mut reordered = vec![Vec::new(); k];
    for (old, centroid) in centroids.into_iter().enumerate() {
        reordered[mapping[old]] = centroid;
    }
    let labels = labels.into_iter().map(|l| mapping[l]).collect();
    (labels, reordered)
}

/// Squared Euclidean distance
fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            6,
            2,
            &[0.0, 0.0, 0.1, 0.1, -0.1, 0.0, 5.0, 5.0, 5.1, 4.9, 4.9, 5.1],
        )
    }

    #[test]
    fn test_kmeans_two_blobs() {
        let result = KMeans::new(7).fit(&blobs(), 2).unwrap();
        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(result.centroids.len(), 2);
        assert!(result.inertia < 0.1);
    }

    #[test]
    fn test_kmeans_deterministic_for_seed() {
        let a = KMeans::new(3).fit(&blobs(), 3).unwrap();
        let b = KMeans::new(3).fit(&blobs(), 3).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn test_kmeans_more_clusters_than_distinct_points() {
        let data = DMatrix::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let labels = KMeans::default().partition(&data, 2).unwrap();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_kmeans_rejects_bad_input() {
        let empty = DMatrix::<f64>::zeros(0, 2);
        assert!(matches!(
            KMeans::default().fit(&empty, 2),
            Err(KdacError::Input(_))
        ));
        assert!(matches!(
            KMeans::default().fit(&blobs(), 0),
            Err(KdacError::Configuration(_))
        ));
    }

    #[test]
    fn test_relabel_by_first_appearance() {
        let (labels, centroids) =
            relabel_by_first_appearance(vec![2, 2, 0], vec![vec![0.0], vec![1.0], vec![2.0]]);
        assert_eq!(labels, vec![0, 0, 1]);
        assert_eq!(centroids, vec![vec![2.0], vec![0.0], vec![1.0]]);
    }
}
