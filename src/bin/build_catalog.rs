//! Offline batch job: turn the raw fetched payloads into the serving
//! artifacts. Cleans and deduplicates the catalog, generates embeddings,
//! computes the full pairwise similarity matrix, and persists everything
//! the serving process loads at startup.

use anyhow::Context;
use log::info;
use recommend_a_movie_api::config::Config;
use recommend_a_movie_api::ml::SentenceEncoder;
use recommend_a_movie_api::models::RawMovie;
use recommend_a_movie_api::services::{CatalogBuilder, SimilarityMatrix};
use std::fs::File;
use std::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "build_catalog=info,recommend_a_movie_api=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let file = File::open(&config.raw_movies_path)
        .with_context(|| format!("Failed to open {}", config.raw_movies_path.display()))?;
    let raw_movies: Vec<RawMovie> =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse raw movie data")?;
    info!("Loaded {} raw movie payloads", raw_movies.len());

    let mut catalog = CatalogBuilder::build(&raw_movies);
    catalog
        .export_csv(&config.csv_export_path)
        .context("Failed to export catalog CSV")?;

    let encoder = SentenceEncoder::new(&config.huggingface_api_key)?;
    catalog
        .embed_with(&encoder)
        .await
        .context("Failed to generate embeddings")?;
    catalog.save(&config.catalog_path)?;

    let matrix = SimilarityMatrix::build(&catalog);
    matrix.save(&config.similarity_matrix_path)?;

    info!(
        "Catalog build complete: {} movies, {}x{} similarity matrix",
        catalog.len(),
        matrix.len(),
        matrix.len()
    );
    Ok(())
}
