//! k-means clustering in L*a*b* with k-means++ seeding.

use log::debug;
use palette::Lab;
use rand::Rng;

use crate::color::lab_distance_squared;

/// Outcome of a clustering run.
#[derive(Clone, Debug, Default)]
pub struct Clustering {
    /// One centroid per requested cluster, unrounded
    pub centroids: Vec<Lab>,
    /// Cluster index for every input point
    pub labels: Vec<usize>,
    /// Number of points assigned to each cluster; may contain zeros
    pub counts: Vec<usize>,
    /// Assign/update rounds actually performed
    pub iterations: usize,
}

impl Clustering {
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

/// Index of the closest centroid and its squared distance. Ties resolve to the
/// lowest index.
#[inline]
pub(crate) fn nearest(point: &Lab, centroids: &[Lab]) -> (usize, f32) {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (idx, c) in centroids.iter().enumerate() {
        let d = lab_distance_squared(point, c);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    (best, best_dist)
}

/// k-means++ seeding: the first centroid is drawn uniformly, each following one
/// with probability proportional to its squared distance from the nearest
/// centroid chosen so far.
fn seed_plus_plus<R: Rng + ?Sized>(points: &[Lab], k: usize, rng: &mut R) -> Vec<Lab> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    let mut weights = vec![0f32; points.len()];
    while centroids.len() < k {
        let mut total = 0f64;
        for (w, p) in weights.iter_mut().zip(points) {
            *w = nearest(p, &centroids).1;
            total += *w as f64;
        }

        // Every point already coincides with a centroid
        if total <= 0.0 {
            centroids.push(points[rng.random_range(0..points.len())]);
            continue;
        }

        let target = rng.random::<f64>() * total;
        let mut acc = 0f64;
        let mut chosen = points.len() - 1;
        for (idx, w) in weights.iter().enumerate() {
            acc += *w as f64;
            if *w > 0.0 && acc > target {
                chosen = idx;
                break;
            }
        }
        centroids.push(points[chosen]);
    }

    centroids
}

/// Assign every point to its nearest centroid, returning how many labels
/// changed.
fn assign(points: &[Lab], centroids: &[Lab], labels: &mut [usize]) -> usize {
    let mut changed = 0;
    for (label, p) in labels.iter_mut().zip(points) {
        let (best, _) = nearest(p, centroids);
        if *label != best {
            *label = best;
            changed += 1;
        }
    }
    changed
}

/// Move every centroid to the mean of its points. Empty clusters keep their
/// previous centroid.
fn update(points: &[Lab], labels: &[usize], centroids: &mut [Lab]) -> Vec<usize> {
    let k = centroids.len();
    let mut sums = vec![[0f64; 3]; k];
    let mut counts = vec![0usize; k];

    for (p, &label) in points.iter().zip(labels) {
        let sum = &mut sums[label];
        sum[0] += p.l as f64;
        sum[1] += p.a as f64;
        sum[2] += p.b as f64;
        counts[label] += 1;
    }

    for ((c, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count > 0 {
            let n = count as f64;
            *c = Lab::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32);
        }
    }

    counts
}

/// Cluster `points` into `k` groups.
///
/// Stops as soon as an assignment pass changes no label, or after
/// `max_iterations` rounds. At least one round always runs, so every label is
/// a valid cluster index. An empty point set yields an empty [`Clustering`].
/// `k` is expected to be at least 1; callers validate it.
pub fn kmeans<R: Rng + ?Sized>(
    points: &[Lab],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Clustering {
    if points.is_empty() || k == 0 {
        return Clustering::default();
    }

    let mut centroids = seed_plus_plus(points, k, rng);
    let mut labels = vec![usize::MAX; points.len()];
    let mut counts = vec![0usize; k];
    let mut iterations = 0;
    let max_iterations = max_iterations.max(1);

    while iterations < max_iterations {
        let changed = assign(points, &centroids, &mut labels);
        counts = update(points, &labels, &mut centroids);
        iterations += 1;
        if changed == 0 {
            break;
        }
    }

    debug!(
        "k-means: {} points, k={}, {} iteration(s)",
        points.len(),
        k,
        iterations
    );

    Clustering {
        centroids,
        labels,
        counts,
        iterations,
    }
}
