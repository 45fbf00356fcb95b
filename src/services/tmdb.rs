use crate::error::{ApiError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 500;

/// Fetch progress marker. Persisted alongside the raw output so an
/// interrupted run resumes from the last saved offset instead of
/// re-fetching from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub processed_count: usize,
}

impl Checkpoint {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer(file, self)?;
        Ok(())
    }

    /// Missing or unreadable checkpoint means starting from the beginning.
    pub fn load(path: &Path) -> Self {
        let processed_count = File::open(path)
            .ok()
            .and_then(|f| serde_json::from_reader::<_, Checkpoint>(BufReader::new(f)).ok())
            .map(|c| c.processed_count)
            .unwrap_or(0);
        Self { processed_count }
    }
}

/// Movie ids from a newline-delimited JSON export, one `{"id": ...}` object
/// per line.
pub fn read_movie_ids(path: &Path) -> Result<Vec<i64>> {
    #[derive(Deserialize)]
    struct IdRecord {
        id: i64,
    }

    let file = File::open(path)?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: IdRecord = serde_json::from_str(&line)?;
        ids.push(record.id);
    }
    Ok(ids)
}

/// Client for the TMDB detail endpoint. Fetches full movie payloads with
/// nested credits, keywords and reviews; the raw JSON is persisted as-is and
/// parsed into catalog rows by the offline build.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one movie's full details. A non-success status is logged and
    /// mapped to `None` so one bad id never aborts the batch; transport
    /// errors are retried with exponential backoff first.
    pub async fn get_movie_details(&self, movie_id: i64) -> Result<Option<Value>> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);
        let mut attempt = 0;

        loop {
            let result = self
                .client
                .get(&url)
                .query(&[
                    ("api_key", self.api_key.as_str()),
                    ("append_to_response", "credits,keywords,reviews,videos"),
                ])
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(Some(response.json().await?));
                }
                Ok(response) => {
                    warn!(
                        "Failed to fetch data for movie ID {}: {}",
                        movie_id,
                        response.status()
                    );
                    return Ok(None);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(ApiError::ExternalServiceError(format!(
                            "TMDB request for movie {} failed after {} attempts: {}",
                            movie_id, MAX_RETRIES, e
                        )));
                    }
                    let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                    warn!("Attempt {} for movie {} failed, retrying in {}ms", attempt, movie_id, delay);
                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }
}

/// Raw movie payloads already persisted by a previous partial run.
pub fn load_raw_output(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let movies = serde_json::from_reader(BufReader::new(file))?;
    Ok(movies)
}

pub fn save_raw_output(path: &Path, movies: &[Value]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, movies)?;
    info!("Saved {} raw movie payloads to {}", movies.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn checkpoint_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        Checkpoint { processed_count: 42 }.save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).processed_count, 42);
    }

    #[test]
    fn missing_checkpoint_starts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");
        assert_eq!(Checkpoint::load(&path).processed_count, 0);
    }

    #[test]
    fn reads_ids_from_newline_delimited_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie_ids.json");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"id": 603, "original_title": "The Matrix"}}"#).unwrap();
        writeln!(file, r#"{{"id": 27205, "original_title": "Inception"}}"#).unwrap();
        writeln!(file).unwrap();

        let ids = read_movie_ids(&path).unwrap();
        assert_eq!(ids, vec![603, 27205]);
    }

    #[test]
    fn raw_output_round_trips_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies_data.json");

        assert!(load_raw_output(&path).unwrap().is_empty());

        let movies = vec![serde_json::json!({"id": 1, "title": "A"})];
        save_raw_output(&path, &movies).unwrap();
        assert_eq!(load_raw_output(&path).unwrap(), movies);
    }
}
