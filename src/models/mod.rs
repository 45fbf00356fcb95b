use serde::{Deserialize, Serialize};

pub use movie::{MovieRecord, MovieSummary, RawMovie};

pub mod movie;

/// Request structure for the search endpoint. Exactly one of `title` /
/// `query` is expected; `title` takes precedence when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Catalog title to find similar movies for (fuzzy-matched).
    #[serde(default)]
    pub title: Option<String>,
    /// Free-text description to search against movie overviews.
    #[serde(default)]
    pub query: Option<String>,
    /// Number of recommendations to return.
    #[serde(default = "default_top_n", alias = "top_n")]
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub recommendations: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

fn default_top_n() -> usize {
    10
}
