use projection_index::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    (0..dim).map(|_| normal.sample(rng)).collect()
}

fn make_index<V: DenseVector>(search_size: usize, seed: u64) -> ProjectionIndex<V> {
    ProjectionIndex::builder()
        .num_projections(8)
        .search_size(search_size)
        .distance_metric(DistanceMetric::Euclidean)
        .seed(seed)
        .build()
        .unwrap()
}

fn brute_force_ids(data: &[Vec<f32>], query: &[f32], k: usize) -> Vec<usize> {
    let q = ndarray::ArrayView1::from(query);
    let mut dists: Vec<(usize, f32)> = data
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let d = DistanceMetric::Euclidean.compute(&q, &ndarray::ArrayView1::from(v.as_slice()));
            (i, d)
        })
        .collect();
    dists.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    dists.into_iter().take(k).map(|(i, _)| i).collect()
}

// ---------------------------------------------------------------------------
// 1. Concurrent insert + search through the shared handle
//    4 writers insert 1,000 vectors each while 4 readers search.
//    Verify no panics, consistent invariants, final len() is correct.
// ---------------------------------------------------------------------------

#[test]
fn stress_shared_concurrent_insert_and_search() {
    let dim = 32;
    let vectors_per_thread = 1_000;
    let num_writer_threads = 4;
    let num_reader_threads = 4;

    let index: SharedProjectionIndex<Arc<Vec<f32>>> =
        SharedProjectionIndex::new(make_index(20, 42));
    // Fix the dimension before readers start.
    index.insert(Arc::new(vec![0.0; dim])).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::new();

    for t in 0..num_writer_threads {
        let idx = index.clone();
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(t as u64);
            for _ in 0..vectors_per_thread {
                idx.insert(Arc::new(random_vector(&mut rng, dim))).unwrap();
            }
        }));
    }

    for t in 0..num_reader_threads {
        let idx = index.clone();
        let done_flag = Arc::clone(&done);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(100 + t as u64);
            let mut query_count = 0u64;
            while !done_flag.load(Ordering::Relaxed) {
                let q = random_vector(&mut rng, dim);
                let results = idx.search(&q, 10).unwrap();
                assert!(!results.is_empty());
                for r in &results {
                    assert!(r.distance.is_finite(), "non-finite distance: {}", r.distance);
                }
                query_count += 1;
                if query_count > 20_000 {
                    break;
                }
            }
        }));
    }

    for h in handles.drain(..num_writer_threads) {
        h.join().expect("writer thread panicked");
    }
    done.store(true, Ordering::Relaxed);

    for h in handles {
        h.join().expect("reader thread panicked");
    }

    let expected = num_writer_threads * vectors_per_thread + 1;
    assert_eq!(index.len(), expected);
    index.verify_invariants().unwrap();
    assert_eq!(index.snapshot().len(), expected);
}

// ---------------------------------------------------------------------------
// 2. Large-scale insert
//    Insert 20,000 vectors of dim=64; every vector finds itself.
// ---------------------------------------------------------------------------

#[test]
fn stress_large_scale_insert() {
    let dim = 64;
    let n = 20_000;
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<Vec<f32>> = (0..n).map(|_| random_vector(&mut rng, dim)).collect();

    let mut index = make_index(10, 7);
    let ids = index.insert_batch(data.clone()).unwrap();
    assert_eq!(index.len(), n);
    index.verify_invariants().unwrap();

    let stats = index.stats();
    assert_eq!(stats.num_vectors, n);
    assert_eq!(stats.dimension, Some(dim));

    for i in (0..n).step_by(97) {
        let results = index.search(&data[i], 1).unwrap();
        assert_eq!(results[0].id, ids[i]);
        assert_eq!(results[0].distance, 0.0);
    }
}

// ---------------------------------------------------------------------------
// 3. Churn: insert, remove half, re-insert
// ---------------------------------------------------------------------------

#[test]
fn stress_insert_remove_churn() {
    let dim = 16;
    let mut rng = StdRng::seed_from_u64(3);
    let data: Vec<Vec<f32>> = (0..3_000).map(|_| random_vector(&mut rng, dim)).collect();

    let mut index = make_index(8, 11);
    index.insert_batch(data.clone()).unwrap();

    for v in data.iter().step_by(2) {
        assert!(index.remove(v, 1e-6).unwrap(), "inserted vector must be removable");
    }
    assert_eq!(index.len(), 1_500);
    index.verify_invariants().unwrap();

    for v in data.iter().step_by(2) {
        assert!(!index.remove(v, 1e-6).unwrap(), "removed vector must stay absent");
    }
    assert_eq!(index.len(), 1_500);

    let remaining: HashSet<Vec<u32>> = index
        .iter()
        .map(|v| v.iter().map(|x| x.to_bits()).collect())
        .collect();
    for (i, v) in data.iter().enumerate() {
        let key: Vec<u32> = v.iter().map(|x| x.to_bits()).collect();
        assert_eq!(remaining.contains(&key), i % 2 == 1);
    }

    index.insert_batch(data.iter().step_by(2).cloned()).unwrap();
    assert_eq!(index.len(), 3_000);
    index.verify_invariants().unwrap();
}

// ---------------------------------------------------------------------------
// 4. Recall grows with the search window
//    Candidate sets only grow with W, so recall never drops; a window
//    covering the dataset is exact.
// ---------------------------------------------------------------------------

#[test]
fn stress_recall_monotone_in_search_size() {
    let dim = 8;
    let n = 2_000;
    let k = 10;
    let mut rng = StdRng::seed_from_u64(99);
    let data: Vec<Vec<f32>> = (0..n).map(|_| random_vector(&mut rng, dim)).collect();
    let queries: Vec<Vec<f32>> = (0..30).map(|_| random_vector(&mut rng, dim)).collect();

    let mut index = make_index(1, 5);
    index.insert_batch(data.clone()).unwrap();

    let mut previous = vec![0.0f64; queries.len()];
    for search_size in [5, 25, 100, n] {
        index.set_search_size(search_size);
        for (qi, q) in queries.iter().enumerate() {
            let truth: HashSet<usize> = brute_force_ids(&data, q, k).into_iter().collect();
            let found: HashSet<usize> = index
                .search(q, k)
                .unwrap()
                .iter()
                .map(|r| r.id.get() as usize)
                .collect();
            let recall = truth.intersection(&found).count() as f64 / k as f64;
            assert!(
                recall >= previous[qi],
                "recall dropped from {} to {recall} at search_size {search_size}",
                previous[qi]
            );
            previous[qi] = recall;
        }
    }

    assert!(previous.iter().all(|&r| r == 1.0), "full window must be exact");
}
