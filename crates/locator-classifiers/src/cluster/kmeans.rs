//! Lloyd's k-means with k-means++ seeding over small dense point sets.
use rand::Rng;

#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per input point.
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// k-means++: the first centroid is uniform, each next one is drawn with
/// probability proportional to its squared distance to the closest chosen one.
fn seed_centroids<R: Rng>(points: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // Every point already coincides with a centroid.
            break;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if *w > 0.0 && target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(points[chosen].clone());
    }
    centroids
}

/// Cluster `points` into at most `k` groups.
///
/// Fewer than `k` centroids are returned when the points have fewer distinct
/// positions than `k`. Empty input yields an empty result.
pub fn kmeans<R: Rng>(points: &[Vec<f64>], k: usize, max_iterations: usize, rng: &mut R) -> KMeansResult {
    if points.is_empty() || k == 0 {
        return KMeansResult {
            assignments: vec![0; points.len()],
            centroids: Vec::new(),
            iterations: 0,
        };
    }

    let dims = points[0].len();
    let mut centroids = seed_centroids(points, k.min(points.len()), rng);
    let mut assignments: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut sums = vec![vec![0.0; dims]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (p, &a) in points.iter().zip(assignments.iter()) {
            counts[a] += 1;
            for (s, v) in sums[a].iter_mut().zip(p.iter()) {
                *s += v;
            }
        }
        for (c, (sum, count)) in centroids.iter_mut().zip(sums.into_iter().zip(counts)) {
            // An empty cluster keeps its previous centroid.
            if count > 0 {
                *c = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();
        if next == assignments {
            break;
        }
        assignments = next;
    }

    log::trace!(
        "k-means finished after {} iterations with {} centroids",
        iterations,
        centroids.len()
    );

    KMeansResult {
        assignments,
        centroids,
        iterations,
    }
}
