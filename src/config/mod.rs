use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub huggingface_api_key: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub catalog_path: PathBuf,
    pub similarity_matrix_path: PathBuf,
    pub movie_ids_path: PathBuf,
    pub raw_movies_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub csv_export_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            huggingface_api_key: env::var("HUGGINGFACE_API_KEY").unwrap_or_default(),
            tmdb_api_key: env::var("TMDB_API_KEY").unwrap_or_default(),
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            catalog_path: env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "artifacts/data/processed/movies_catalog.json".to_string())
                .into(),
            similarity_matrix_path: env::var("SIMILARITY_MATRIX_PATH")
                .unwrap_or_else(|_| "artifacts/models/similarity_matrix.json".to_string())
                .into(),
            movie_ids_path: env::var("MOVIE_IDS_PATH")
                .unwrap_or_else(|_| "artifacts/data/raw/movie_ids.json".to_string())
                .into(),
            raw_movies_path: env::var("RAW_MOVIES_PATH")
                .unwrap_or_else(|_| "artifacts/data/processed/movies_data.json".to_string())
                .into(),
            checkpoint_path: env::var("CHECKPOINT_PATH")
                .unwrap_or_else(|_| "artifacts/data/checkpoint.json".to_string())
                .into(),
            csv_export_path: env::var("CSV_EXPORT_PATH")
                .unwrap_or_else(|_| "artifacts/data/raw/movies_data.csv".to_string())
                .into(),
        })
    }
}
