use std::cmp::Ordering;

use common::error::AppError;

/// A corpus row index paired with its cosine score against a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub index: usize,
    pub score: f32,
}

/// Precomputed precedent-key vectors with cosine top-k lookup.
///
/// The index is immutable after construction; concurrent readers need no
/// locks. Queries are O(N * D).
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    texts: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl EmbeddingIndex {
    /// Builds an index from parallel arrays, asserting equal length and a
    /// uniform dimensionality across rows.
    pub fn new(texts: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self, AppError> {
        if texts.len() != vectors.len() {
            return Err(AppError::InternalError(format!(
                "embedding index arrays disagree: {} texts vs {} vectors",
                texts.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(row) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(AppError::InternalError(format!(
                "embedding index row {row} has dimension {} but the index holds {dimension}",
                vectors.get(row).map_or(0, Vec::len),
            )));
        }

        Ok(Self {
            texts,
            vectors,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    fn check_query_dimension(&self, query: &[f32]) -> Result<(), AppError> {
        if !self.is_empty() && query.len() != self.dimension {
            return Err(AppError::InternalError(format!(
                "query embedding has dimension {} but the index holds {}",
                query.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    /// Returns the `k` highest-scoring rows in descending score order, ties
    /// broken by lower index. Zero-norm rows are never selected.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRow>, AppError> {
        self.check_query_dimension(query)?;

        let mut scored: Vec<ScoredRow> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(_, row)| norm(row) > 0.0)
            .map(|(index, row)| ScoredRow {
                index,
                score: cosine_similarity(query, row),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// The single closest row, equal in index and score to `top_k` with k = 1.
    pub fn most_similar(&self, query: &[f32]) -> Result<ScoredRow, AppError> {
        self.top_k(query, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("embedding index has no scorable rows".into()))
    }
}

/// `dot(a, b) / (‖a‖ * ‖b‖)`; zero-norm inputs yield 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norms = norm(a) * norm(b);
    if norms > 0.0 {
        dot / norms
    } else {
        0.0
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> EmbeddingIndex {
        EmbeddingIndex::new(
            vec!["a".into(), "b".into(), "c".into(), "zero".into()],
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ],
        )
        .expect("index")
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = [0.3, 0.8, -0.2];
        let b = [0.5, -0.1, 0.9];
        let forward = cosine_similarity(&a, &b);
        let backward = cosine_similarity(&b, &a);
        assert!((forward - backward).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_scores_stay_within_unit_interval() {
        let a = [2.0, -3.0, 0.5];
        let b = [-1.0, 4.0, 2.5];
        let score = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn top_k_orders_descending_with_index_tiebreak() {
        let index = EmbeddingIndex::new(
            vec!["x".into(), "y".into(), "z".into()],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .expect("index");

        let results = index.top_k(&[1.0, 0.0], 3).expect("top_k");
        assert_eq!(results.len(), 3);
        // Rows 0 and 1 tie at score 1.0; the lower index wins.
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 1);
        assert_eq!(results[2].index, 2);
    }

    #[test]
    fn top_k_with_k_one_matches_most_similar() {
        let index = sample_index();
        let query = [0.7, 0.7];

        let top = index.top_k(&query, 1).expect("top_k");
        let best = index.most_similar(&query).expect("most_similar");

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].index, best.index);
        assert!((top[0].score - best.score).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_norm_rows_are_never_selected() {
        let index = sample_index();
        let results = index.top_k(&[1.0, 0.0], 10).expect("top_k");
        assert!(results.iter().all(|row| row.index != 3));
    }

    #[test]
    fn mismatched_query_dimension_fails_fast() {
        let index = sample_index();
        let result = index.top_k(&[1.0, 0.0, 0.0], 1);
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }

    #[test]
    fn mismatched_parallel_arrays_are_rejected() {
        let result = EmbeddingIndex::new(vec!["only".into()], vec![]);
        assert!(result.is_err());

        let ragged = EmbeddingIndex::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(ragged.is_err());
    }
}
