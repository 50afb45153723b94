use std::collections::BTreeSet;

use log::{debug, info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::ClusteringError;

/// Cluster count used when no configuration overrides it.
pub const DEFAULT_K: usize = 3;
/// Lloyd iteration cap used when no configuration overrides it.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

// ---------------------------------------------------------------------------
// KMeans – configuration
// ---------------------------------------------------------------------------

/// k-means over 2-D points with k-means++ seeding.
///
/// Without a seed the initial centroids come from OS entropy, so only the
/// partition's invariants (cluster count, coverage, non-empty clusters) are
/// stable across runs.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    seed: Option<u64>,
    max_iterations: usize,
    restarts: usize,
}

/// Result of a fit. Cluster ids are numbered by ascending centroid `(lat, lon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster id per input point, index-aligned with the input.
    pub assignments: Vec<usize>,
    pub centroids: Vec<[f64; 2]>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning run.
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        KMeans {
            k,
            seed: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            restarts: 1,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Number of independent initialisations; the lowest inertia wins.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    pub fn fit(&self, points: &[[f64; 2]]) -> Result<KMeansFit, ClusteringError> {
        self.validate(points)?;

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut best = self.run(points, &mut rng, 0);
        for run in 1..self.restarts {
            let fit = self.run(points, &mut rng, run);
            if fit.inertia < best.inertia {
                best = fit;
            }
        }

        let fit = canonical_labels(best);
        info!(
            "clustered {} points into {} clusters (inertia {:.6})",
            points.len(),
            self.k,
            fit.inertia
        );
        Ok(fit)
    }

    fn run(&self, points: &[[f64; 2]], rng: &mut ChaCha8Rng, run: usize) -> KMeansFit {
        let initial = init_plus_plus(points, self.k, rng);
        let fit = lloyd(points, initial, self.max_iterations);
        debug!(
            "k-means run {run}: inertia {:.6} after {} iterations",
            fit.inertia, fit.iterations
        );
        fit
    }

    fn validate(&self, points: &[[f64; 2]]) -> Result<(), ClusteringError> {
        if self.k == 0 {
            return Err(ClusteringError::ZeroClusters);
        }
        if points.len() < self.k {
            return Err(ClusteringError::TooFewPoints {
                k: self.k,
                points: points.len(),
            });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(ClusteringError::NonFiniteCoordinate { index });
        }

        // -0.0 and 0.0 are the same location
        let distinct: BTreeSet<(u64, u64)> = points
            .iter()
            .map(|p| ((p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits()))
            .collect();
        if distinct.len() < self.k {
            warn!(
                "only {} distinct locations for {} clusters; some clusters will be empty",
                distinct.len(),
                self.k
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lloyd iterations
// ---------------------------------------------------------------------------

fn sq_dist(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// k-means++: each new centroid is drawn with probability proportional to
/// its squared distance from the nearest centroid chosen so far.
fn init_plus_plus(points: &[[f64; 2]], k: usize, rng: &mut ChaCha8Rng) -> Vec<[f64; 2]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut nearest: Vec<f64> = points.iter().map(|p| sq_dist(p, &centroids[0])).collect();
    while centroids.len() < k {
        // All-zero weights: every point already sits on a centroid.
        let idx = match WeightedIndex::new(&nearest) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..points.len()),
        };
        let chosen = points[idx];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(sq_dist(p, &chosen));
        }
        centroids.push(chosen);
    }
    centroids
}

/// Index of the nearest centroid; ties go to the lowest index.
fn nearest_centroid(point: &[f64; 2], centroids: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, c) in centroids.iter().enumerate() {
        let d = sq_dist(point, c);
        if d < best_dist {
            best_dist = d;
            best = j;
        }
    }
    best
}

fn assign(points: &[[f64; 2]], centroids: &[[f64; 2]]) -> Vec<usize> {
    points
        .iter()
        .map(|p| nearest_centroid(p, centroids))
        .collect()
}

/// Move each non-empty cluster's centroid to the mean of its points.
/// Empty clusters keep their previous centroid.
fn update_centroids(points: &[[f64; 2]], assignments: &[usize], centroids: &mut [[f64; 2]]) {
    let k = centroids.len();
    let mut sums = vec![[0.0, 0.0]; k];
    let mut counts = vec![0usize; k];
    for (p, &c) in points.iter().zip(assignments) {
        sums[c][0] += p[0];
        sums[c][1] += p[1];
        counts[c] += 1;
    }
    for j in 0..k {
        if counts[j] > 0 {
            let n = counts[j] as f64;
            centroids[j] = [sums[j][0] / n, sums[j][1] / n];
        }
    }
}

fn cluster_counts(assignments: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0usize; k];
    for &c in assignments {
        counts[c] += 1;
    }
    counts
}

/// Give every empty cluster the point farthest from its own centroid, taken
/// from a cluster that keeps at least one point.
///
/// With at least k distinct points some multi-point cluster always holds a
/// point off its centroid, so every cluster ends up non-empty.
fn relocate_empty(points: &[[f64; 2]], assignments: &mut [usize], centroids: &mut [[f64; 2]]) {
    loop {
        let counts = cluster_counts(assignments, centroids.len());
        let Some(empty) = counts.iter().position(|&c| c == 0) else {
            return;
        };
        let donor = points
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[assignments[*i]] > 1)
            .map(|(i, p)| (i, sq_dist(p, &centroids[assignments[i]])))
            .filter(|(_, d)| *d > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((idx, _)) = donor else {
            return;
        };
        debug!("relocating point {idx} into empty cluster {empty}");
        assignments[idx] = empty;
        centroids[empty] = points[idx];
        update_centroids(points, assignments, centroids);
    }
}

fn lloyd(points: &[[f64; 2]], mut centroids: Vec<[f64; 2]>, max_iterations: usize) -> KMeansFit {
    let mut assignments = assign(points, &centroids);
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        update_centroids(points, &assignments, &mut centroids);
        relocate_empty(points, &mut assignments, &mut centroids);
        let next = assign(points, &centroids);
        if next == assignments {
            break;
        }
        assignments = next;
    }

    // Leave centroids consistent with the returned assignments.
    update_centroids(points, &assignments, &mut centroids);
    relocate_empty(points, &mut assignments, &mut centroids);

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &c)| sq_dist(p, &centroids[c]))
        .sum();
    KMeansFit {
        assignments,
        centroids,
        inertia,
        iterations,
    }
}

/// Renumber clusters by ascending centroid `(lat, lon)`.
fn canonical_labels(fit: KMeansFit) -> KMeansFit {
    let mut order: Vec<usize> = (0..fit.centroids.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = (&fit.centroids[a], &fit.centroids[b]);
        ca[0].total_cmp(&cb[0]).then(ca[1].total_cmp(&cb[1]))
    });

    let mut relabel = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        relabel[old] = new;
    }

    KMeansFit {
        assignments: fit.assignments.iter().map(|&c| relabel[c]).collect(),
        centroids: order.iter().map(|&old| fit.centroids[old]).collect(),
        inertia: fit.inertia,
        iterations: fit.iterations,
    }
}
