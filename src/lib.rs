//! # projection_index
//!
//! A lightweight, in-memory vector index for approximate nearest-neighbor
//! (ANN) search using random scalar projections.
//!
//! Every vector is projected onto a handful of random unit axes and kept in
//! one sorted structure per axis. A query looks at the few entries around its
//! own projection on each axis, merges those candidates and ranks them by the
//! exact distance. Recall is traded for speed through the search window size.
//!
//! ## Quick start
//!
//! ```rust
//! use projection_index::{DistanceMetric, ProjectionIndex};
//!
//! let mut index = ProjectionIndex::builder()
//!     .num_projections(8)
//!     .search_size(20)
//!     .distance_metric(DistanceMetric::Euclidean)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! // The first insert fixes the dimension.
//! index.insert(vec![0.1_f32; 128]).unwrap();
//! index.insert(vec![0.2_f32; 128]).unwrap();
//!
//! let results = index.search(&vec![0.1_f32; 128], 5).unwrap();
//! for r in &results {
//!     println!("id={} dist={:.4}", r.id, r.distance);
//! }
//!
//! assert!(index.remove(&vec![0.1_f32; 128], 1e-6).unwrap());
//! assert_eq!(index.len(), 1);
//! ```
//!
//! ## Feature flags
//!
//! | Flag       | Effect                                 |
//! |------------|----------------------------------------|
//! | `parallel` | Parallel batch search via rayon        |
//! | `full`     | Enables `parallel`                     |

pub mod axis;
pub mod distance;
pub mod error;
pub mod index;
pub mod metrics;
pub mod projection;
pub mod shared;
pub mod vector;

// Re-exports for convenience.
pub use distance::{DistanceMeasure, DistanceMetric};
pub use error::{ProjectionError, Result};
pub use index::{
    IndexConfig, IndexStats, Iter, IterWithIds, ProjectionIndex, ProjectionIndexBuilder,
    QueryResult, MAX_PROJECTIONS,
};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use projection::VectorId;
pub use shared::{Neighbor, SharedProjectionIndex};
pub use vector::DenseVector;
