use crate::error::{ApiError, Result};
use crate::ml::Embedder;
use crate::models::MovieSummary;
use crate::services::catalog::Catalog;
use crate::services::similarity::{cosine_similarity, SimilarityMatrix};
use crate::services::title_matcher::TitleMatcher;
use std::sync::Arc;
use tracing::{debug, info};

/// Serving-time engine over the immutable catalog and similarity matrix.
/// Two retrieval paths with different shapes: a precomputed matrix row read
/// for known titles, and a live embedding comparison for free-text queries.
/// All shared state is read-only, so any number of concurrent requests can
/// run against one engine without locking.
pub struct RecommendationEngine<E: Embedder> {
    catalog: Arc<Catalog>,
    similarity: Arc<SimilarityMatrix>,
    embedder: E,
    matcher: TitleMatcher,
}

impl<E: Embedder> RecommendationEngine<E> {
    /// Fails fast with `DimensionMismatch` when the matrix was built against
    /// a different catalog version; serving with misaligned indices would
    /// produce silently wrong rankings.
    pub fn new(
        catalog: Arc<Catalog>,
        similarity: Arc<SimilarityMatrix>,
        embedder: E,
        matcher: TitleMatcher,
    ) -> Result<Self> {
        similarity.validate_against(&catalog)?;
        Ok(Self {
            catalog,
            similarity,
            embedder,
            matcher,
        })
    }

    /// Recommend movies similar to a known catalog title. The title is
    /// fuzzy-resolved first; a low-confidence match is an `InvalidQuery`,
    /// never a silent best-effort pick.
    pub fn by_title(&self, title: &str, top_n: usize) -> Result<Vec<MovieSummary>> {
        if self.catalog.is_empty() {
            return Ok(Vec::new());
        }

        let matched = self
            .matcher
            .resolve(title, self.catalog.titles())
            .ok_or_else(|| {
                ApiError::InvalidQuery(format!(
                    "Movie title '{}' not found with sufficient accuracy",
                    title
                ))
            })?;
        debug!(
            "Resolved '{}' to '{}' (score {}, row {})",
            title, matched.title, matched.score, matched.index
        );

        // Self-exclusion by index, not by rank: duplicate embeddings could
        // otherwise push the query movie into the results.
        let mut scored: Vec<(usize, f32)> = self
            .similarity
            .row(matched.index)
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| *idx != matched.index)
            .collect();
        rank(&mut scored);

        Ok(self.project(scored.into_iter().take(top_n)))
    }

    /// Recommend movies for a free-text description. The query is embedded
    /// live and compared against every row's overview embedding; the query
    /// is not a catalog member, so nothing is excluded.
    pub async fn by_description(&self, query: &str, top_n: usize) -> Result<Vec<MovieSummary>> {
        if self.catalog.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .catalog
            .records()
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                (idx, cosine_similarity(&query_embedding, &record.overview_embedding))
            })
            .collect();
        rank(&mut scored);

        info!("Scored {} movies against query embedding", scored.len());
        Ok(self.project(scored.into_iter().take(top_n)))
    }

    fn project(&self, ranked: impl Iterator<Item = (usize, f32)>) -> Vec<MovieSummary> {
        ranked
            .map(|(idx, _)| self.catalog.records()[idx].summary())
            .collect()
    }
}

/// Descending by score; equal scores fall back to ascending catalog index
/// so rankings are deterministic across runs.
fn rank(scored: &mut [(usize, f32)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::{catalog_with_embeddings, record_with_embedding};
    use std::collections::HashMap;

    /// Deterministic stand-in for the sentence encoder.
    struct StubEmbedder {
        responses: HashMap<String, Vec<f32>>,
        dimension: usize,
    }

    impl StubEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                responses: HashMap::new(),
                dimension,
            }
        }

        fn with_response(mut self, text: &str, embedding: Vec<f32>) -> Self {
            self.responses.insert(text.to_string(), embedding);
            self
        }
    }

    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ApiError> {
            Ok(self
                .responses
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0; self.dimension]))
        }

        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, ApiError> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    fn engine_for(
        embeddings: Vec<Vec<f32>>,
        embedder: StubEmbedder,
    ) -> RecommendationEngine<StubEmbedder> {
        let catalog = Arc::new(catalog_with_embeddings(embeddings));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        RecommendationEngine::new(catalog, similarity, embedder, TitleMatcher::default()).unwrap()
    }

    #[test]
    fn by_title_never_returns_the_query_movie() {
        let engine = engine_for(
            vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]],
            StubEmbedder::new(2),
        );

        let results = engine.by_title("Movie 0", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.title != "Movie 0"));
    }

    #[test]
    fn by_title_with_unmatchable_title_is_an_invalid_query() {
        let engine = engine_for(vec![vec![1.0, 0.0], vec![0.0, 1.0]], StubEmbedder::new(2));

        let err = engine.by_title("Xyzzyxq Nonexistent Film", 5).unwrap_err();
        assert!(matches!(err, ApiError::InvalidQuery(_)));
    }

    #[test]
    fn identical_embeddings_rank_ahead_of_dissimilar_ones() {
        // Movie 0 and Movie 1 share an embedding; Movie 2 is orthogonal.
        let engine = engine_for(
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            StubEmbedder::new(2),
        );

        let results = engine.by_title("Movie 0", 2).unwrap();
        assert_eq!(results[0].title, "Movie 1");
        assert_eq!(results[1].title, "Movie 2");
    }

    #[test]
    fn top_n_larger_than_catalog_returns_all_available() {
        let engine = engine_for(vec![vec![1.0, 0.0], vec![0.5, 0.5]], StubEmbedder::new(2));

        let results = engine.by_title("Movie 0", 50).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_catalog_returns_empty_results() {
        let catalog = Arc::new(catalog_with_embeddings(Vec::new()));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        let engine = RecommendationEngine::new(
            catalog,
            similarity,
            StubEmbedder::new(2),
            TitleMatcher::default(),
        )
        .unwrap();

        assert!(engine.by_title("Anything", 5).unwrap().is_empty());
    }

    #[test]
    fn mismatched_matrix_is_rejected_at_construction() {
        let catalog = Arc::new(catalog_with_embeddings(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
        let other = catalog_with_embeddings(vec![vec![1.0, 0.0]]);
        let similarity = Arc::new(SimilarityMatrix::build(&other));

        let err = RecommendationEngine::new(
            catalog,
            similarity,
            StubEmbedder::new(2),
            TitleMatcher::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn by_description_orders_by_non_increasing_similarity() {
        let query = "a story about a shark terrorizing a beach town";
        let embedder = StubEmbedder::new(2).with_response(query, vec![1.0, 0.0]);

        let catalog = Arc::new(Catalog::new(vec![
            record_with_embedding(0, "Far", vec![0.0, 1.0]),
            record_with_embedding(1, "Close", vec![1.0, 0.1]),
            record_with_embedding(2, "Middle", vec![0.5, 0.5]),
        ]));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        let engine =
            RecommendationEngine::new(catalog, similarity, embedder, TitleMatcher::default())
                .unwrap();

        let results = engine.by_description(query, 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Close");
        assert_eq!(results[1].title, "Middle");
        assert_eq!(results[2].title, "Far");
    }

    #[tokio::test]
    async fn by_description_caps_results_at_top_n() {
        let embedder = StubEmbedder::new(2).with_response("query", vec![1.0, 0.0]);
        let catalog = Arc::new(catalog_with_embeddings(vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.8, 0.2],
        ]));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        let engine =
            RecommendationEngine::new(catalog, similarity, embedder, TitleMatcher::default())
                .unwrap();

        let results = engine.by_description("query", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn equal_description_scores_keep_catalog_order() {
        let embedder = StubEmbedder::new(2).with_response("query", vec![1.0, 0.0]);
        // All rows identical, so every score ties.
        let catalog = Arc::new(catalog_with_embeddings(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
        ]));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        let engine =
            RecommendationEngine::new(catalog, similarity, embedder, TitleMatcher::default())
                .unwrap();

        let results = engine.by_description("query", 3).await.unwrap();
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Movie 0", "Movie 1", "Movie 2"]);
    }
}
