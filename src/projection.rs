//! One random axis and the ordered multiset of scalar projections onto it.

use std::cmp::Ordering;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::ops::Bound;

use ndarray::{Array1, ArrayView1};

use crate::vector::DenseVector;

/// Stable handle of an indexed vector, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorId(pub(crate) u64);

impl VectorId {
    /// The raw insertion sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A vector's position along one axis.
///
/// Ordered by scalar (IEEE total order), then by [`VectorId`], so two vectors
/// with equal projections still have a fixed relative order.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionEntry {
    pub scalar: f32,
    pub id: VectorId,
}

impl PartialEq for ProjectionEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProjectionEntry {}

impl PartialOrd for ProjectionEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectionEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scalar
            .total_cmp(&other.scalar)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A projection axis together with every indexed vector's scalar on it.
#[derive(Debug, Clone)]
pub struct AxisProjection {
    axis: Array1<f32>,
    entries: BTreeSet<ProjectionEntry>,
}

impl AxisProjection {
    pub fn new(axis: Array1<f32>) -> Self {
        Self {
            axis,
            entries: BTreeSet::new(),
        }
    }

    pub fn axis(&self) -> ArrayView1<'_, f32> {
        self.axis.view()
    }

    /// Scalar projection of `vector` onto this axis.
    pub fn project<V: DenseVector + ?Sized>(&self, vector: &V) -> f32 {
        vector.dot(&self.axis.view())
    }

    /// Returns `false` if the exact entry was already present.
    pub fn insert(&mut self, entry: ProjectionEntry) -> bool {
        self.entries.insert(entry)
    }

    /// Returns `false` if no entry with this scalar and id exists.
    pub fn remove(&mut self, entry: &ProjectionEntry) -> bool {
        self.entries.remove(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in ascending projection order.
    pub fn iter(&self) -> btree_set::Iter<'_, ProjectionEntry> {
        self.entries.iter()
    }

    /// Up to `half_width` entries with scalar `>= scalar`, nearest first,
    /// followed by up to `half_width` entries with scalar `< scalar`, also
    /// nearest first.
    pub fn window(&self, scalar: f32, half_width: usize) -> Window<'_> {
        let pivot = ProjectionEntry {
            scalar,
            id: VectorId(u64::MIN),
        };
        Window {
            above: self
                .entries
                .range((Bound::Included(pivot), Bound::Unbounded))
                .take(half_width),
            below: self
                .entries
                .range((Bound::Unbounded, Bound::Excluded(pivot)))
                .rev()
                .take(half_width),
        }
    }

    /// True if consecutive entries are non-decreasing by scalar.
    pub fn is_sorted(&self) -> bool {
        self.entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(a, b)| a.scalar.total_cmp(&b.scalar) != Ordering::Greater)
    }
}

/// The entries around a query's position on one axis.
pub struct Window<'a> {
    above: std::iter::Take<btree_set::Range<'a, ProjectionEntry>>,
    below: std::iter::Take<std::iter::Rev<btree_set::Range<'a, ProjectionEntry>>>,
}

impl<'a> Iterator for Window<'a> {
    type Item = &'a ProjectionEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.above.next().or_else(|| self.below.next())
    }
}
