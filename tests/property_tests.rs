//! Property-based tests for the projection index.
//!
//! These check invariants that should hold for any input:
//! - every per-axis projection holds exactly the stored vectors, in order
//! - reported distances are exact and ascending
//! - a window wider than the dataset reproduces brute-force search

use ndarray::ArrayView1;
use proptest::prelude::*;
use projection_index::*;

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(-10.0f32..10.0, dim)) -> Vec<f32> {
        vec
    }
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Vec<f32>),
    /// Remove the stored vector at this position (modulo the model size).
    Remove(usize),
    RemoveById(usize),
    Clear,
}

fn arb_op(dim: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => arb_vector(dim).prop_map(Op::Insert),
        3 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::RemoveById),
        1 => Just(Op::Clear),
    ]
}

fn index_with(num_projections: usize, search_size: usize, seed: u64) -> ProjectionIndex<Vec<f32>> {
    ProjectionIndex::builder()
        .num_projections(num_projections)
        .search_size(search_size)
        .seed(seed)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_random_ops(
        num_projections in 1usize..8,
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(4), 1..80),
    ) {
        // Window wider than any reachable size, so removal always finds its target.
        let mut index = index_with(num_projections, 128, seed);
        let mut model: Vec<(VectorId, Vec<f32>)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let id = index.insert(v.clone()).unwrap();
                    model.push((id, v));
                }
                Op::Remove(k) if !model.is_empty() => {
                    let (_, v) = model[k % model.len()].clone();
                    prop_assert!(index.remove(&v, 1e-3).unwrap());
                    // The index may have removed an identical copy instead.
                    let pos = model.iter().position(|(id, _)| !index.contains(*id)).unwrap();
                    model.swap_remove(pos);
                }
                Op::RemoveById(k) if !model.is_empty() => {
                    let (id, v) = model.swap_remove(k % model.len());
                    prop_assert_eq!(index.remove_by_id(id).unwrap(), Some(v));
                }
                Op::Clear => {
                    index.clear();
                    model.clear();
                }
                _ => {}
            }

            prop_assert_eq!(index.len(), model.len());
            prop_assert!(index.verify_invariants().is_ok());
        }

        let mut stored: Vec<VectorId> = index.iter_with_ids().map(|(id, _)| id).collect();
        let mut expected: Vec<VectorId> = model.iter().map(|(id, _)| *id).collect();
        stored.sort();
        expected.sort();
        prop_assert_eq!(stored, expected);
    }

    #[test]
    fn distances_are_exact_and_sorted(
        data in prop::collection::vec(arb_vector(3), 1..60),
        query in arb_vector(3),
        search_size in 0usize..10,
        limit in 0usize..20,
    ) {
        let mut index = index_with(3, search_size, 17);
        index.insert_batch(data).unwrap();

        let results = index.search(&query, limit).unwrap();
        prop_assert!(results.len() <= limit);
        prop_assert!(results.len() <= 2 * search_size * 3);

        let q = ArrayView1::from(query.as_slice());
        for r in &results {
            let direct = DistanceMetric::Euclidean.compute(&q, &ArrayView1::from(r.vector.as_slice()));
            prop_assert_eq!(r.distance, direct);
        }
        for pair in results.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn full_window_matches_brute_force(
        data in prop::collection::vec(arb_vector(5), 1..50),
        query in arb_vector(5),
        limit in 1usize..10,
    ) {
        let mut index = index_with(2, data.len(), 5);
        index.insert_batch(data.clone()).unwrap();

        let got: Vec<f32> = index.search(&query, limit).unwrap().iter().map(|r| r.distance).collect();

        let q = ArrayView1::from(query.as_slice());
        let mut all: Vec<f32> = data
            .iter()
            .map(|v| DistanceMetric::Euclidean.compute(&q, &ArrayView1::from(v.as_slice())))
            .collect();
        all.sort_by(|a, b| a.total_cmp(b));
        all.truncate(limit);

        prop_assert_eq!(got, all);
    }
}
