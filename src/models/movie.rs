use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw per-movie payload as returned by the TMDB detail endpoint with
/// `append_to_response=credits,keywords`. Only the fields the catalog
/// needs are deserialized; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMovie {
    pub id: Option<i64>,
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<NamedEntry>,
    #[serde(default)]
    pub keywords: KeywordList,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordList {
    #[serde(default)]
    pub keywords: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

/// One cleaned catalog row. Embedding vectors are attached by the offline
/// build; the row index in the catalog is the contract with the similarity
/// matrix and must not change after the matrix is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: i64,
    pub title: String,
    /// May be empty; empty overviews embed to the zero vector.
    pub overview: String,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    /// Top 15 cast members, ordered by descending popularity.
    pub movie_cast: Vec<String>,
    pub director: Option<String>,
    /// Missing or unparsable dates are normalized to 1900-01-01.
    pub release_date: NaiveDate,
    pub popularity: f32,
    pub vote_average: f32,
    pub vote_count: i32,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub title_embedding: Vec<f32>,
    #[serde(default)]
    pub overview_embedding: Vec<f32>,
    #[serde(default)]
    pub combined_features: Vec<f32>,
}

impl MovieRecord {
    /// Text fed to the embedder for the combined-features vector backing
    /// the full similarity matrix.
    pub fn combined_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if !self.overview.is_empty() {
            parts.push(self.overview.clone());
        }
        if !self.genres.is_empty() {
            parts.push(self.genres.join(" "));
        }
        if !self.keywords.is_empty() {
            parts.push(self.keywords.join(" "));
        }
        if !self.movie_cast.is_empty() {
            parts.push(self.movie_cast.join(" "));
        }
        if let Some(director) = &self.director {
            parts.push(director.clone());
        }
        parts.join(" ")
    }

    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            title: self.title.clone(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
            director: self.director.clone(),
            movie_cast: self.movie_cast.clone(),
        }
    }
}

/// Projection of a catalog row returned to API clients. Optional fields
/// serialize as explicit `null` rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub director: Option<String>,
    pub movie_cast: Vec<String>,
}
