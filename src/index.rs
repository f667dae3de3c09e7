use std::collections::btree_set;
use std::marker::PhantomData;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::axis;
use crate::distance::{DistanceMeasure, DistanceMetric};
use crate::error::{ProjectionError, Result};
use crate::metrics::{MetricsCollector, MetricsSnapshot, QueryTimer};
use crate::projection::{AxisProjection, ProjectionEntry, VectorId};
use crate::vector::DenseVector;

/// Exclusive upper bound on the number of projection axes.
pub const MAX_PROJECTIONS: usize = 100;

/// Configuration for the projection index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of random projection axes (1..100).
    pub num_projections: usize,
    /// Entries scanned on each side of the query's position, per axis.
    pub search_size: usize,
    /// Optional RNG seed for reproducible axes.
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_projections: 8,
            search_size: 20,
            seed: None,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_projections == 0 || self.num_projections >= MAX_PROJECTIONS {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "num_projections must be in 1..{MAX_PROJECTIONS}, got {}",
                self.num_projections
            )));
        }
        Ok(())
    }
}

/// A single nearest-neighbor result.
#[derive(Debug)]
pub struct QueryResult<'a, V> {
    /// Handle of the indexed vector.
    pub id: VectorId,
    /// The indexed vector itself.
    pub vector: &'a V,
    /// Exact distance from the query (lower is closer).
    pub distance: f32,
}

impl<V> Clone for QueryResult<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for QueryResult<'_, V> {}

/// Aggregate statistics about the index.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub num_vectors: usize,
    pub num_projections: usize,
    /// `None` until the first insert fixes it.
    pub dimension: Option<usize>,
    pub search_size: usize,
    /// Upper bound on distinct candidates re-scored by one query.
    pub max_candidates_per_query: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dim = match self.dimension {
            Some(d) => d.to_string(),
            None => "unset".to_string(),
        };
        write!(
            f,
            "ProjectionIndex {{ vectors: {}, projections: {}, dim: {}, \
             search_size: {}, max_candidates: {} }}",
            self.num_vectors,
            self.num_projections,
            dim,
            self.search_size,
            self.max_candidates_per_query,
        )
    }
}

enum IndexState {
    /// No vector seen yet: dimension and axes are not fixed.
    Uninitialized,
    Initialized {
        dimension: usize,
        projections: Vec<AxisProjection>,
    },
}

// ---------------------------------------------------------------------------
// ProjectionIndex
// ---------------------------------------------------------------------------

/// Approximate nearest-neighbor index over random scalar projections.
///
/// Every vector is projected onto `num_projections` random unit axes and kept
/// in one ordered set per axis. A query scans `search_size` entries on either
/// side of its own projection on every axis and re-scores the union of those
/// entries with the exact distance measure.
///
/// Not internally synchronized: mutation takes `&mut self`. Wrap the index in
/// [`SharedProjectionIndex`](crate::SharedProjectionIndex) to share it
/// between threads.
pub struct ProjectionIndex<V, M = DistanceMetric> {
    state: IndexState,
    vectors: HashMap<VectorId, V>,
    distance: M,
    config: IndexConfig,
    rng: StdRng,
    next_id: u64,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<V, M> std::fmt::Debug for ProjectionIndex<V, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionIndex")
            .field("num_vectors", &self.vectors.len())
            .field("dimension", &self.dimension())
            .field("config", &self.config)
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<V, M> ProjectionIndex<V, M> {
    /// Dimension fixed by the first insert, if any.
    pub fn dimension(&self) -> Option<usize> {
        match &self.state {
            IndexState::Uninitialized => None,
            IndexState::Initialized { dimension, .. } => Some(*dimension),
        }
    }

    /// True once the first insert has generated the axes.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, IndexState::Initialized { .. })
    }

    fn projections(&self) -> &[AxisProjection] {
        match &self.state {
            IndexState::Uninitialized => &[],
            IndexState::Initialized { projections, .. } => projections,
        }
    }
}

impl<V: DenseVector, M: DistanceMeasure> ProjectionIndex<V, M> {
    /// Create an index with `num_projections` axes and a per-axis search
    /// window of `search_size` entries on each side.
    pub fn new(distance: M, num_projections: usize, search_size: usize) -> Result<Self> {
        Self::with_config(
            distance,
            IndexConfig {
                num_projections,
                search_size,
                seed: None,
            },
        )
    }

    /// Create an index directly from an [`IndexConfig`].
    pub fn with_config(distance: M, config: IndexConfig) -> Result<Self> {
        Self::from_parts(distance, config, false)
    }

    fn from_parts(distance: M, config: IndexConfig, enable_metrics: bool) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let metrics = if enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        Ok(Self {
            state: IndexState::Uninitialized,
            vectors: HashMap::new(),
            distance,
            config,
            rng,
            next_id: 0,
            metrics,
        })
    }

    /// Fix the dimension and draw the axes on first use, then check `dim`
    /// against the fixed dimension.
    fn ensure_initialized(&mut self, dim: usize) -> Result<&mut Vec<AxisProjection>> {
        if let IndexState::Uninitialized = self.state {
            let axes = axis::random_basis(dim, self.config.num_projections, &mut self.rng)?;
            tracing::debug!(
                dimension = dim,
                projections = axes.len(),
                "generated projection basis"
            );
            self.state = IndexState::Initialized {
                dimension: dim,
                projections: axes.into_iter().map(AxisProjection::new).collect(),
            };
        }

        match &mut self.state {
            IndexState::Initialized {
                dimension,
                projections,
            } => {
                if *dimension != dim {
                    return Err(ProjectionError::DimensionMismatch {
                        expected: *dimension,
                        got: dim,
                    });
                }
                Ok(projections)
            }
            IndexState::Uninitialized => Err(ProjectionError::CorruptIndex(
                "basis generation left the index uninitialized".into(),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert a vector and receive its handle.
    ///
    /// The first insert fixes the index dimension and generates the axes.
    /// Inserting the same contents twice stores two distinct entries.
    pub fn insert(&mut self, vector: V) -> Result<VectorId> {
        let id = VectorId(self.next_id);
        let projections = self.ensure_initialized(vector.dim())?;

        for projection in projections.iter_mut() {
            let scalar = projection.project(&vector);
            projection.insert(ProjectionEntry { scalar, id });
        }

        self.next_id += 1;
        self.vectors.insert(id, vector);

        let expected = self.vectors.len();
        if let Some((axis, p)) = self
            .projections()
            .iter()
            .enumerate()
            .find(|(_, p)| p.len() != expected)
        {
            tracing::error!(%id, axis, len = p.len(), expected, "projection cardinality diverged");
            return Err(ProjectionError::CorruptIndex(format!(
                "projection {axis} holds {} entries after insert, expected {expected}",
                p.len()
            )));
        }

        if let Some(ref m) = self.metrics {
            m.record_insert();
        }

        Ok(id)
    }

    /// Insert multiple vectors in order. Aborts on first error; vectors
    /// inserted before the failure stay in the index.
    pub fn insert_batch<I>(&mut self, vectors: I) -> Result<Vec<VectorId>>
    where
        I: IntoIterator<Item = V>,
    {
        vectors.into_iter().map(|v| self.insert(v)).collect()
    }

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------

    /// Find up to `limit` approximate nearest neighbors of `query`.
    ///
    /// Returns results sorted by ascending exact distance. An uninitialized
    /// index returns no results.
    pub fn search<Q>(&self, query: &Q, limit: usize) -> Result<Vec<QueryResult<'_, V>>>
    where
        Q: DenseVector + ?Sized,
    {
        let timer = self.metrics.as_ref().map(|_| QueryTimer::new());

        let projections = match &self.state {
            IndexState::Uninitialized => return Ok(Vec::new()),
            IndexState::Initialized {
                dimension,
                projections,
            } => {
                if query.dim() != *dimension {
                    return Err(ProjectionError::DimensionMismatch {
                        expected: *dimension,
                        got: query.dim(),
                    });
                }
                projections
            }
        };

        let half_width = self.config.search_size;
        let bound = half_width
            .saturating_mul(2)
            .saturating_mul(projections.len())
            .min(self.vectors.len());
        let mut seen: HashSet<VectorId> = HashSet::with_capacity(bound);
        let mut candidates: Vec<VectorId> = Vec::with_capacity(bound);
        let mut window_entries = 0u64;

        for projection in projections {
            let scalar = projection.project(query);
            for entry in projection.window(scalar, half_width) {
                window_entries += 1;
                if seen.insert(entry.id) {
                    candidates.push(entry.id);
                }
            }
        }

        let query_view = query.view();
        let mut results = Vec::with_capacity(candidates.len());
        for id in candidates {
            let vector = self.vectors.get(&id).ok_or_else(|| {
                ProjectionError::CorruptIndex(format!("projection entry {id} has no stored vector"))
            })?;
            results.push(QueryResult {
                id,
                vector,
                distance: self.distance.distance(&query_view, &vector.view()),
            });
        }
        let num_candidates = results.len();

        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(limit);

        tracing::trace!(
            window_entries,
            candidates = num_candidates,
            returned = results.len(),
            "projection search"
        );

        if let Some(ref m) = self.metrics {
            if let Some(t) = timer {
                m.record_query(window_entries, num_candidates as u64, t.elapsed_ns());
            }
        }

        Ok(results)
    }

    /// Run [`search`](Self::search) for every query. Aborts on first error.
    pub fn search_batch<Q>(&self, queries: &[Q], limit: usize) -> Result<Vec<Vec<QueryResult<'_, V>>>>
    where
        Q: DenseVector,
    {
        queries.iter().map(|q| self.search(q, limit)).collect()
    }

    // ------------------------------------------------------------------
    // Removal / lookup
    // ------------------------------------------------------------------

    /// Remove the indexed vector closest to `vector` if it lies within
    /// `epsilon` of it.
    ///
    /// The match is found with a regular [`search`](Self::search), so a
    /// vector outside every search window (for instance with a search size
    /// of zero) is reported absent. Returns `Ok(false)` without mutating
    /// when nothing is close enough.
    ///
    /// A [`ProjectionError::InternalInconsistency`] means the entry was
    /// missing from some projections; the index must not be used further.
    pub fn remove<Q>(&mut self, vector: &Q, epsilon: f32) -> Result<bool>
    where
        Q: DenseVector + ?Sized,
    {
        let best = match self.search(vector, 1)?.first() {
            Some(best) if best.distance < epsilon => best.id,
            _ => return Ok(false),
        };

        match self.remove_by_id(best)? {
            Some(_) => Ok(true),
            None => Err(ProjectionError::CorruptIndex(format!(
                "search returned {best} but it is not stored"
            ))),
        }
    }

    /// Remove a vector by handle, returning it if it was present.
    pub fn remove_by_id(&mut self, id: VectorId) -> Result<Option<V>> {
        let Some(vector) = self.vectors.remove(&id) else {
            return Ok(None);
        };

        let projections = match &mut self.state {
            IndexState::Initialized { projections, .. } => projections,
            IndexState::Uninitialized => {
                return Err(ProjectionError::CorruptIndex(
                    "vector stored in an uninitialized index".into(),
                ))
            }
        };

        let expected = projections.len();
        let mut removed = 0;
        for projection in projections.iter_mut() {
            let entry = ProjectionEntry {
                scalar: projection.project(&vector),
                id,
            };
            if projection.remove(&entry) {
                removed += 1;
            }
        }

        if removed != expected {
            tracing::error!(%id, removed, expected, "removal touched only part of the projections");
            return Err(ProjectionError::InternalInconsistency { removed, expected });
        }

        if let Some(ref m) = self.metrics {
            m.record_remove();
        }

        Ok(Some(vector))
    }

    /// Check whether a handle is present.
    pub fn contains(&self, id: VectorId) -> bool {
        self.vectors.contains_key(&id)
    }

    /// Borrow an indexed vector by handle.
    pub fn get(&self, id: VectorId) -> Option<&V> {
        self.vectors.get(&id)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Remove all vectors. The dimension and axes are kept.
    pub fn clear(&mut self) {
        if let IndexState::Initialized { projections, .. } = &mut self.state {
            for projection in projections.iter_mut() {
                projection.clear();
            }
        }
        self.vectors.clear();
    }

    /// Check every structural invariant in O(projections * vectors).
    ///
    /// All projections must hold exactly the stored handles, each sorted by
    /// scalar, and every stored vector must have the index dimension.
    pub fn verify_invariants(&self) -> Result<()> {
        let (dimension, projections) = match &self.state {
            IndexState::Uninitialized if self.vectors.is_empty() => return Ok(()),
            IndexState::Uninitialized => {
                return Err(ProjectionError::CorruptIndex(format!(
                    "{} vectors stored in an uninitialized index",
                    self.vectors.len()
                )))
            }
            IndexState::Initialized {
                dimension,
                projections,
            } => (*dimension, projections),
        };

        if projections.len() != self.config.num_projections {
            return Err(ProjectionError::CorruptIndex(format!(
                "{} projections, configured {}",
                projections.len(),
                self.config.num_projections
            )));
        }

        for (axis, projection) in projections.iter().enumerate() {
            if projection.len() != self.vectors.len() {
                return Err(ProjectionError::CorruptIndex(format!(
                    "projection {axis} holds {} entries, {} vectors stored",
                    projection.len(),
                    self.vectors.len()
                )));
            }
            if !projection.is_sorted() {
                return Err(ProjectionError::CorruptIndex(format!(
                    "projection {axis} is out of order"
                )));
            }
            let ids: HashSet<VectorId> = projection.iter().map(|e| e.id).collect();
            if ids.len() != projection.len() || !ids.iter().all(|id| self.vectors.contains_key(id)) {
                return Err(ProjectionError::CorruptIndex(format!(
                    "projection {axis} does not hold exactly the stored vectors"
                )));
            }
        }

        if let Some((id, v)) = self.vectors.iter().find(|(_, v)| v.dim() != dimension) {
            return Err(ProjectionError::CorruptIndex(format!(
                "vector {id} has dimension {}, index dimension is {dimension}",
                v.dim()
            )));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    /// Every indexed vector once, in ascending order of the first axis.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.iter_with_ids(),
        }
    }

    /// Like [`iter`](Self::iter), paired with each vector's handle.
    pub fn iter_with_ids(&self) -> IterWithIds<'_, V> {
        IterWithIds {
            entries: self.projections().first().map(AxisProjection::iter),
            vectors: &self.vectors,
        }
    }

    /// The projection axes, in order. Empty until the first insert.
    pub fn axes(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> + '_ {
        self.projections().iter().map(AxisProjection::axis)
    }

    // ------------------------------------------------------------------
    // Stats / config
    // ------------------------------------------------------------------

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.projections().first().map_or(0, AxisProjection::len)
    }

    /// True when the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_projections(&self) -> usize {
        self.config.num_projections
    }

    pub fn search_size(&self) -> usize {
        self.config.search_size
    }

    /// Takes effect on the next search; stored projections are unaffected.
    pub fn set_search_size(&mut self, search_size: usize) {
        self.config.search_size = search_size;
    }

    pub fn distance_measure(&self) -> &M {
        &self.distance
    }

    /// Return a clone of the current configuration.
    pub fn config(&self) -> IndexConfig {
        self.config.clone()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_vectors: self.len(),
            num_projections: self.config.num_projections,
            dimension: self.dimension(),
            search_size: self.config.search_size,
            max_candidates_per_query: self
                .config
                .search_size
                .saturating_mul(2)
                .saturating_mul(self.config.num_projections),
        }
    }

    /// Snapshot of runtime metrics (`None` if metrics were not enabled).
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Reset metrics counters.
    pub fn reset_metrics(&self) {
        if let Some(ref m) = self.metrics {
            m.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Parallel batch query (behind `parallel` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "parallel")]
impl<V, M> ProjectionIndex<V, M>
where
    V: DenseVector + Sync,
    M: DistanceMeasure + Sync,
{
    /// Query multiple vectors in parallel.
    pub fn par_search_batch<Q>(
        &self,
        queries: &[Q],
        limit: usize,
    ) -> Result<Vec<Vec<QueryResult<'_, V>>>>
    where
        Q: DenseVector + Sync,
    {
        use rayon::prelude::*;

        queries
            .par_iter()
            .map(|q| self.search(q, limit))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Iterator over `(handle, vector)` in first-axis order.
pub struct IterWithIds<'a, V> {
    entries: Option<btree_set::Iter<'a, ProjectionEntry>>,
    vectors: &'a HashMap<VectorId, V>,
}

impl<'a, V> Iterator for IterWithIds<'a, V> {
    type Item = (VectorId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;
        for entry in entries.by_ref() {
            match self.vectors.get(&entry.id) {
                Some(v) => return Some((entry.id, v)),
                None => tracing::error!(
                    id = %entry.id,
                    "projection entry has no stored vector, skipping"
                ),
            }
        }
        None
    }
}

/// Iterator over indexed vectors in first-axis order.
pub struct Iter<'a, V> {
    inner: IterWithIds<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, V: DenseVector, M: DistanceMeasure> IntoIterator for &'a ProjectionIndex<V, M> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`ProjectionIndex`].
///
/// `V` is the stored vector type; it is usually inferred from how the built
/// index is used.
#[derive(Debug, Clone)]
pub struct ProjectionIndexBuilder<V, M = DistanceMetric> {
    config: IndexConfig,
    distance: M,
    enable_metrics: bool,
    _vector: PhantomData<fn() -> V>,
}

impl<V> Default for ProjectionIndexBuilder<V, DistanceMetric> {
    fn default() -> Self {
        Self {
            config: IndexConfig::default(),
            distance: DistanceMetric::default(),
            enable_metrics: false,
            _vector: PhantomData,
        }
    }
}

impl<V> ProjectionIndexBuilder<V, DistanceMetric> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance = metric;
        self
    }
}

impl<V, M> ProjectionIndexBuilder<V, M> {
    /// Replace the distance with any [`DistanceMeasure`].
    pub fn distance_measure<N: DistanceMeasure>(self, distance: N) -> ProjectionIndexBuilder<V, N> {
        ProjectionIndexBuilder {
            config: self.config,
            distance,
            enable_metrics: self.enable_metrics,
            _vector: PhantomData,
        }
    }

    pub fn num_projections(mut self, n: usize) -> Self {
        self.config.num_projections = n;
        self
    }

    pub fn search_size(mut self, n: usize) -> Self {
        self.config.search_size = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }
}

impl<V: DenseVector, M: DistanceMeasure> ProjectionIndexBuilder<V, M> {
    /// Build the index, returning an error on invalid configuration.
    pub fn build(self) -> Result<ProjectionIndex<V, M>> {
        ProjectionIndex::from_parts(self.distance, self.config, self.enable_metrics)
    }
}

impl<V: DenseVector> ProjectionIndex<V, DistanceMetric> {
    /// Start building an index with the builder pattern.
    pub fn builder() -> ProjectionIndexBuilder<V> {
        ProjectionIndexBuilder::new()
    }
}
