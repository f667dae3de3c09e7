//! A lock-protected handle for using one index from several threads.
//!
//! [`ProjectionIndex`] itself performs no synchronization. This wrapper
//! serializes access with a single-writer/multiple-reader lock: searches run
//! concurrently, inserts and removals are exclusive.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::distance::{DistanceMeasure, DistanceMetric};
use crate::error::Result;
use crate::index::{IndexStats, ProjectionIndex};
use crate::metrics::MetricsSnapshot;
use crate::projection::VectorId;
use crate::vector::DenseVector;

/// An owned search result, detached from the index lock.
#[derive(Debug, Clone)]
pub struct Neighbor<V> {
    pub id: VectorId,
    pub vector: V,
    pub distance: f32,
}

/// Cloneable, thread-safe handle to a [`ProjectionIndex`].
///
/// Results are cloned out of the index, so cheap-to-clone vector types such
/// as `Arc<[f32]>` or `Arc<Vec<f32>>` work best here.
pub struct SharedProjectionIndex<V, M = DistanceMetric> {
    inner: Arc<RwLock<ProjectionIndex<V, M>>>,
}

impl<V, M> Clone for SharedProjectionIndex<V, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, M> std::fmt::Debug for SharedProjectionIndex<V, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedProjectionIndex")
            .field(&*self.inner.read())
            .finish()
    }
}

impl<V, M> From<ProjectionIndex<V, M>> for SharedProjectionIndex<V, M> {
    fn from(index: ProjectionIndex<V, M>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }
}

impl<V: DenseVector + Clone, M: DistanceMeasure> SharedProjectionIndex<V, M> {
    pub fn new(index: ProjectionIndex<V, M>) -> Self {
        Self::from(index)
    }

    pub fn insert(&self, vector: V) -> Result<VectorId> {
        self.inner.write().insert(vector)
    }

    pub fn insert_batch<I>(&self, vectors: I) -> Result<Vec<VectorId>>
    where
        I: IntoIterator<Item = V>,
    {
        self.inner.write().insert_batch(vectors)
    }

    pub fn search<Q>(&self, query: &Q, limit: usize) -> Result<Vec<Neighbor<V>>>
    where
        Q: DenseVector + ?Sized,
    {
        let index = self.inner.read();
        let results = index.search(query, limit)?;
        Ok(results
            .into_iter()
            .map(|r| Neighbor {
                id: r.id,
                vector: r.vector.clone(),
                distance: r.distance,
            })
            .collect())
    }

    pub fn remove<Q>(&self, vector: &Q, epsilon: f32) -> Result<bool>
    where
        Q: DenseVector + ?Sized,
    {
        self.inner.write().remove(vector, epsilon)
    }

    pub fn remove_by_id(&self, id: VectorId) -> Result<Option<V>> {
        self.inner.write().remove_by_id(id)
    }

    pub fn contains(&self, id: VectorId) -> bool {
        self.inner.read().contains(id)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn search_size(&self) -> usize {
        self.inner.read().search_size()
    }

    pub fn set_search_size(&self, search_size: usize) {
        self.inner.write().set_search_size(search_size);
    }

    /// Clone every vector out in first-axis order.
    pub fn snapshot(&self) -> Vec<V> {
        self.inner.read().iter().cloned().collect()
    }

    pub fn verify_invariants(&self) -> Result<()> {
        self.inner.read().verify_invariants()
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.inner.read().metrics()
    }

    /// Hold the read lock for several operations.
    pub fn read(&self) -> RwLockReadGuard<'_, ProjectionIndex<V, M>> {
        self.inner.read()
    }

    /// Hold the write lock for several operations.
    pub fn write(&self) -> RwLockWriteGuard<'_, ProjectionIndex<V, M>> {
        self.inner.write()
    }
}
