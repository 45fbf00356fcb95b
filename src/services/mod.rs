pub mod catalog;
pub mod recommendation;
pub mod similarity;
pub mod title_matcher;
pub mod tmdb;

// Re-export public types
pub use catalog::{Catalog, CatalogBuilder};
pub use recommendation::RecommendationEngine;
pub use similarity::SimilarityMatrix;
pub use title_matcher::{TitleMatch, TitleMatcher};
pub use tmdb::{Checkpoint, TmdbClient};
