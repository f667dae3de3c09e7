use ndarray::{Array1, ArrayView1};

/// An exact distance between two vectors of equal dimension.
///
/// The index evaluates this only while re-scoring candidates, so it may be
/// arbitrarily expensive. Smaller values mean closer; implementations must
/// return non-negative values.
pub trait DistanceMeasure {
    fn distance(&self, a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32;
}

impl<F> DistanceMeasure for F
where
    F: Fn(&ArrayView1<'_, f32>, &ArrayView1<'_, f32>) -> f32,
{
    fn distance(&self, a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
        self(a, b)
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance. Range [0, inf).
    #[default]
    Euclidean,
    /// Squared Euclidean distance. Same ordering as `Euclidean`, no square root.
    SquaredEuclidean,
    /// Cosine distance: 1 - cos(a, b). Range [0, 2]. 0 = identical direction.
    Cosine,
    /// Manhattan (L1) distance. Range [0, inf).
    Manhattan,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    pub fn compute(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::SquaredEuclidean => squared_euclidean_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }
}

impl DistanceMeasure for DistanceMetric {
    fn distance(&self, a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
        self.compute(a, b)
    }
}

/// Cosine distance: 1 - cos(a, b).
pub fn cosine_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    let dot = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    let denom = norm_a * norm_b;
    if denom < f32::EPSILON {
        return 1.0;
    }
    // Rounding can push cos slightly above 1.
    (1.0 - (dot / denom)).max(0.0)
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    squared_euclidean_distance(a, b).sqrt()
}

/// Squared Euclidean distance between two vectors.
pub fn squared_euclidean_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
}

/// Manhattan (L1) distance between two vectors.
pub fn manhattan_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Normalize a vector to unit length (L2 norm).
///
/// Returns `false` and leaves the vector unchanged if its norm is too small
/// to divide by.
pub fn normalize(v: &mut Array1<f32>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm > f32::EPSILON {
        *v /= norm;
        true
    } else {
        false
    }
}
