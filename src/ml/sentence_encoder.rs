use crate::error::ApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co/models";
const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of the sentence-transformer model.
pub const EMBEDDING_DIM: usize = 384;

/// Text-to-vector seam. The serving engine and the offline build are generic
/// over this so tests can substitute a deterministic encoder.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    fn dimension(&self) -> usize;

    /// Embed a single text. Must return a vector of `dimension()` entries
    /// for any input, including empty strings.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    /// Embed a batch of texts, one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct SentenceEncoder {
    client: Client,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct EncodeRequest {
    inputs: Vec<String>,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct EncodeResponse(Vec<Vec<f32>>);

impl SentenceEncoder {
    pub fn new(api_key: &str) -> Result<Self, ApiError> {
        // Bounded timeout so a hung model call cannot stall a request forever.
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Embed a batch of texts. Empty or whitespace-only entries map to the
    /// zero vector without touching the model, so null-overview movies get a
    /// deterministic low-similarity representation.
    pub async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut embeddings = vec![vec![0.0; EMBEDDING_DIM]; texts.len()];

        let non_empty: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .collect();

        if non_empty.is_empty() {
            return Ok(embeddings);
        }

        let inputs: Vec<String> = non_empty.iter().map(|(_, t)| t.clone()).collect();
        let encoded = self.call_model(&inputs).await?;

        if encoded.len() != inputs.len() {
            return Err(ApiError::ModelInferenceError(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                encoded.len()
            )));
        }

        for ((i, _), vector) in non_empty.into_iter().zip(encoded) {
            embeddings[i] = vector;
        }

        Ok(embeddings)
    }

    async fn call_model(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let request = EncodeRequest {
            inputs: texts.to_vec(),
            options: Options {
                wait_for_model: true,
                use_cache: true,
            },
        };

        debug!("Sending {} texts to HuggingFace API", texts.len());
        let url = format!("{}/{}", HUGGINGFACE_API_BASE, MODEL_NAME);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ApiError::ExternalServiceError(format!("HuggingFace API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("HuggingFace API error: {}", error_text);
            return Err(ApiError::ExternalServiceError(format!(
                "HuggingFace API error: {}",
                error_text
            )));
        }

        let embeddings: EncodeResponse = response.json().await.map_err(|e| {
            ApiError::SerializationError(format!("Failed to parse HuggingFace response: {}", e))
        })?;

        Ok(embeddings.0)
    }
}

impl Embedder for SentenceEncoder {
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }
        let mut embeddings = self.call_model(&[text.to_string()]).await?;
        if embeddings.is_empty() {
            return Err(ApiError::ModelInferenceError(
                "Model returned no embedding".to_string(),
            ));
        }
        Ok(embeddings.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.encode_batch(texts).await
    }
}
