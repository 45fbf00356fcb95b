use crate::error::{ApiError, Result};
use crate::services::catalog::Catalog;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Cosine similarity between two vectors, defined as 0 when either operand
/// has zero norm. This keeps zero-vector rows (empty source text) at a
/// deterministic low similarity against everything instead of dividing by
/// zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Precomputed pairwise cosine similarities over the catalog's
/// combined-feature embeddings. Row/column `i` corresponds to catalog row
/// `i` at build time; the matrix is read-only for the serving lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    matrix: Array2<f32>,
}

impl SimilarityMatrix {
    /// Compute the full C x C matrix in catalog row order. Symmetric by
    /// construction; the diagonal is 1.0 for every row with a non-zero
    /// embedding and 0.0 for zero-norm rows.
    pub fn build(catalog: &Catalog) -> Self {
        let n = catalog.len();
        let mut matrix = Array2::<f32>::zeros((n, n));

        for i in 0..n {
            let v_i = &catalog.records()[i].combined_features;
            matrix[[i, i]] = cosine_similarity(v_i, v_i);
            for j in (i + 1)..n {
                let score = cosine_similarity(v_i, &catalog.records()[j].combined_features);
                matrix[[i, j]] = score;
                matrix[[j, i]] = score;
            }
        }

        info!("Built {}x{} similarity matrix", n, n);
        Self { matrix }
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    /// Similarity scores of catalog row `idx` against every catalog row.
    pub fn row(&self, idx: usize) -> Vec<f32> {
        self.matrix.row(idx).to_vec()
    }

    /// The matrix must be square with one row per catalog entry; a mismatch
    /// means it was built against a different catalog version and every
    /// ranking it produces would be silently wrong.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<()> {
        if self.matrix.nrows() != catalog.len() || self.matrix.ncols() != catalog.len() {
            return Err(ApiError::DimensionMismatch {
                expected: catalog.len(),
                got: self.matrix.nrows(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer(file, self)?;
        info!("Saved similarity matrix to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let matrix = serde_json::from_reader(BufReader::new(file))?;
        Ok(matrix)
    }
}
