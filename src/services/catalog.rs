use crate::error::Result;
use crate::ml::Embedder;
use crate::models::{MovieRecord, RawMovie};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Cast list is capped at the most popular members.
const MAX_CAST: usize = 15;

fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
}

/// Converts raw TMDB payloads into cleaned, deduplicated catalog rows.
/// Malformed records are skipped with a warning; the batch never fails on a
/// single bad payload.
pub struct CatalogBuilder;

impl CatalogBuilder {
    pub fn build(raw: &[RawMovie]) -> Catalog {
        let mut seen: HashSet<i64> = HashSet::new();
        let mut records = Vec::with_capacity(raw.len());

        for movie in raw {
            let Some(record) = Self::extract(movie) else {
                continue;
            };
            // First occurrence of a movie_id wins.
            if seen.insert(record.movie_id) {
                records.push(record);
            }
        }

        info!("Built catalog with {} movies from {} raw records", records.len(), raw.len());
        Catalog { records }
    }

    fn extract(movie: &RawMovie) -> Option<MovieRecord> {
        let movie_id = match movie.id {
            Some(id) => id,
            None => {
                warn!("Skipping raw record without a movie id");
                return None;
            }
        };
        let title = match &movie.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                warn!("Skipping movie {}: missing title", movie_id);
                return None;
            }
        };

        let director = movie
            .credits
            .crew
            .iter()
            .find(|crew| crew.job == "Director")
            .map(|crew| crew.name.clone());

        // Stable sort keeps input order for equal popularity.
        let mut cast = movie.credits.cast.clone();
        cast.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        let movie_cast: Vec<String> = cast
            .into_iter()
            .take(MAX_CAST)
            .map(|member| member.name)
            .collect();

        let release_date = movie
            .release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(sentinel_date);

        Some(MovieRecord {
            movie_id,
            title,
            overview: movie.overview.clone().unwrap_or_default(),
            genres: movie.genres.iter().map(|g| g.name.clone()).collect(),
            keywords: movie.keywords.keywords.iter().map(|k| k.name.clone()).collect(),
            movie_cast,
            director,
            release_date,
            popularity: movie.popularity.unwrap_or(0.0) as f32,
            vote_average: movie.vote_average.unwrap_or(0.0) as f32,
            vote_count: movie.vote_count.unwrap_or(0) as i32,
            poster_path: movie.poster_path.clone(),
            title_embedding: Vec::new(),
            overview_embedding: Vec::new(),
            combined_features: Vec::new(),
        })
    }
}

/// The full set of movies available for recommendation, in a fixed row
/// order. Row index is the contract with the similarity matrix.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<MovieRecord>,
}

impl Catalog {
    pub fn new(records: Vec<MovieRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.title.as_str())
    }

    /// Attach title, overview and combined-feature embeddings to every row.
    /// Empty source text embeds to the zero vector via the encoder's
    /// fallback, so every row ends up with exactly one vector per field.
    pub async fn embed_with<E: Embedder>(&mut self, embedder: &E) -> Result<()> {
        let titles: Vec<String> = self.records.iter().map(|r| r.title.clone()).collect();
        let overviews: Vec<String> = self.records.iter().map(|r| r.overview.clone()).collect();
        let combined: Vec<String> = self.records.iter().map(|r| r.combined_text()).collect();

        let title_embeddings = embedder.embed_batch(&titles).await?;
        let overview_embeddings = embedder.embed_batch(&overviews).await?;
        let combined_embeddings = embedder.embed_batch(&combined).await?;

        for (((record, title_emb), overview_emb), combined_emb) in self
            .records
            .iter_mut()
            .zip(title_embeddings)
            .zip(overview_embeddings)
            .zip(combined_embeddings)
        {
            record.title_embedding = title_emb;
            record.overview_embedding = overview_emb;
            record.combined_features = combined_emb;
        }

        info!("Generated embeddings for {} movies", self.records.len());
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer(file, &self.records)?;
        info!("Saved catalog ({} movies) to {}", self.records.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let records: Vec<MovieRecord> = serde_json::from_reader(BufReader::new(file))?;
        info!("Loaded catalog with {} movies from {}", records.len(), path.display());
        Ok(Self { records })
    }

    /// Flat CSV export of the cleaned rows for inspection; embeddings are
    /// left out.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "movie_id",
            "title",
            "overview",
            "genres",
            "keywords",
            "movie_cast",
            "director",
            "release_date",
            "popularity",
            "vote_average",
            "vote_count",
            "poster_path",
        ])?;

        for record in &self.records {
            writer.write_record([
                record.movie_id.to_string(),
                record.title.clone(),
                record.overview.clone(),
                record.genres.join(","),
                record.keywords.join(","),
                record.movie_cast.join(","),
                record.director.clone().unwrap_or_default(),
                record.release_date.to_string(),
                record.popularity.to_string(),
                record.vote_average.to_string(),
                record.vote_count.to_string(),
                record.poster_path.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
