//! Property tests for flat vector index search ordering.

use complaint_rag::flat::FlatIndex;
use complaint_rag::index::VectorIndex;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// *For any* set of stored vectors, searching SHALL return at most `k`
/// distinct positions ordered by descending cosine similarity.
mod prop_flat_search_ordering {
    use std::collections::HashSet;

    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
            k in 0usize..25,
        ) {
            let stored = vectors.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = FlatIndex::new(DIM, vectors).unwrap();
                index.search(&query, k).await.unwrap()
            });

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(stored));

            let positions: HashSet<_> = results.iter().map(|n| n.position).collect();
            prop_assert_eq!(positions.len(), results.len());
            prop_assert!(results.iter().all(|n| n.position < stored));

            for window in results.windows(2) {
                let (a, b) = (window[0].score.unwrap(), window[1].score.unwrap());
                prop_assert!(a >= b, "results not in descending order: {} < {}", a, b);
            }
        }
    }
}
