//! Basic usage of `projection_index`.
//!
//! Demonstrates the builder pattern, inserting random vectors, searching,
//! widening the search window, inspecting stats and metrics, removal, and
//! clearing.
//!
//! Run with:
//!   cargo run --example basic_usage

use projection_index::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const DIM: usize = 32;
const NUM_VECTORS: usize = 10_000;

fn main() {
    // ---------------------------------------------------------------
    // 1. Build a projection index using the builder pattern.
    // ---------------------------------------------------------------
    println!("=== Step 1: Build the index ===");
    let mut index = ProjectionIndex::builder()
        .num_projections(8)
        .search_size(20)
        .distance_metric(DistanceMetric::Euclidean)
        .seed(42)
        .enable_metrics()
        .build()
        .expect("failed to build index");

    println!("Created index: projections=8, search_size=20, metric=Euclidean, seed=42, metrics=on\n");

    // ---------------------------------------------------------------
    // 2. Generate and insert random vectors. The first insert fixes
    //    the dimension and draws the axes.
    // ---------------------------------------------------------------
    println!("=== Step 2: Insert {} random vectors ===", NUM_VECTORS);

    let mut rng = StdRng::seed_from_u64(123);
    let normal = Normal::new(0.0_f32, 1.0).unwrap();

    let vectors: Vec<Vec<f32>> = (0..NUM_VECTORS)
        .map(|_| (0..DIM).map(|_| normal.sample(&mut rng)).collect())
        .collect();

    index
        .insert_batch(vectors.iter().cloned())
        .expect("insert failed");

    println!("Inserted {} vectors (dimension {:?}).\n", index.len(), index.dimension());

    // ---------------------------------------------------------------
    // 3. Search with one of the inserted vectors; print top-5 results.
    // ---------------------------------------------------------------
    println!("=== Step 3: Top-5 nearest neighbors for vector #0 ===");
    let results = index.search(&vectors[0], 5).expect("search failed");

    for (rank, r) in results.iter().enumerate() {
        println!("  rank={} id={:<6} distance={:.6}", rank + 1, r.id, r.distance);
    }
    println!();

    // ---------------------------------------------------------------
    // 4. Widen the window: more candidates, better recall.
    // ---------------------------------------------------------------
    println!("=== Step 4: Search size vs. best distance for a fresh query ===");
    let query: Vec<f32> = (0..DIM).map(|_| normal.sample(&mut rng)).collect();
    for search_size in [5, 20, 100, 500] {
        index.set_search_size(search_size);
        let best = index.search(&query, 1).expect("search failed");
        println!(
            "  search_size={:<4} best id={} distance={:.4}",
            search_size, best[0].id, best[0].distance
        );
    }
    index.set_search_size(20);
    println!();

    // ---------------------------------------------------------------
    // 5. Show index stats.
    // ---------------------------------------------------------------
    println!("=== Step 5: Index statistics ===");
    let stats = index.stats();
    println!("  {}", stats);
    println!("  Vectors:            {}", stats.num_vectors);
    println!("  Projections:        {}", stats.num_projections);
    println!("  Search size:        {}", stats.search_size);
    println!("  Max candidates:     {}", stats.max_candidates_per_query);
    println!();

    // ---------------------------------------------------------------
    // 6. Show metrics snapshot.
    // ---------------------------------------------------------------
    println!("=== Step 6: Metrics snapshot ===");
    if let Some(m) = index.metrics() {
        println!("  {}", m);
        println!("  Query count:              {}", m.query_count);
        println!("  Insert count:             {}", m.insert_count);
        println!("  Avg query time:           {:.2} us", m.avg_query_time_us);
        println!("  Avg candidates per query: {:.1}", m.avg_candidates_per_query);
        println!("  Dedup ratio:              {:.1}%", m.dedup_ratio * 100.0);
    } else {
        println!("  Metrics not enabled.");
    }
    println!();

    // ---------------------------------------------------------------
    // 7. Remove a vector by value and verify it is gone.
    // ---------------------------------------------------------------
    println!("=== Step 7: Remove vector #42 ===");
    let removed = index.remove(&vectors[42], 1e-6).expect("remove failed");
    println!("  Removed: {}", removed);
    let again = index.remove(&vectors[42], 1e-6).expect("remove failed");
    println!("  Removed again: {}", again);
    println!("  Index size after removal: {}", index.len());
    println!();

    // ---------------------------------------------------------------
    // 8. Clear the index. Dimension and axes are kept.
    // ---------------------------------------------------------------
    println!("=== Step 8: Clear the index ===");
    index.clear();
    println!("  Index size after clear: {}", index.len());
    println!("  Index is empty: {}", index.is_empty());
    println!("  Dimension still fixed: {:?}", index.dimension());
    println!();

    println!("Done.");
}
