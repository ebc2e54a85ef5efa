use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::EmbedError;

pub const EMBEDDING_DIMENSIONS: usize = 384;
pub const EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Turns texts into fixed-dimension vectors. `embed` preserves both order
/// and count: `output[i]` is the embedding of `texts[i]`.
#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let input = [text.to_string()];
        let mut vectors = self.embed(&input).await?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            returned: 0,
        })
    }
}

/// Client for an OpenAI-compatible `/embeddings` endpoint serving the
/// pinned MiniLM sentence-transformer. Built once at startup; the model id
/// and dimension never change for the life of the process.
pub struct MiniLmEmbedder {
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    client: Client,
}

impl MiniLmEmbedder {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, EmbedError> {
        let endpoint = Url::parse(&format!(
            "{}/embeddings",
            base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            endpoint,
            api_key,
            model: EMBEDDING_MODEL.to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl Embedder for MiniLmEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.to_string(),
                details,
            });
        }

        let payload: EmbeddingResponse = response.json().await?;
        rows_to_vectors(payload, texts.len(), self.dimensions)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

// Endpoints may return rows out of order; the `index` field is
// authoritative.
fn rows_to_vectors(
    payload: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let mut rows = payload.data;
    if rows.len() != expected {
        return Err(EmbedError::CountMismatch {
            expected,
            returned: rows.len(),
        });
    }
    rows.sort_by_key(|row| row.index);

    let mut vectors = Vec::with_capacity(rows.len());
    for row in rows {
        if row.embedding.len() != dimensions {
            return Err(EmbedError::Dimensions {
                expected: dimensions,
                returned: row.embedding.len(),
            });
        }
        vectors.push(row.embedding);
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, fill: f32, dimensions: usize) -> EmbeddingRow {
        EmbeddingRow {
            index,
            embedding: vec![fill; dimensions],
        }
    }

    #[test]
    fn rows_are_reordered_by_index() {
        let payload = EmbeddingResponse {
            data: vec![row(1, 2.0, 3), row(0, 1.0, 3)],
        };
        let vectors = rows_to_vectors(payload, 2, 3).expect("rows should parse");
        assert_eq!(vectors[0], vec![1.0, 1.0, 1.0]);
        assert_eq!(vectors[1], vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn missing_rows_are_a_count_mismatch() {
        let payload = EmbeddingResponse {
            data: vec![row(0, 1.0, 3)],
        };
        let result = rows_to_vectors(payload, 2, 3);
        assert!(matches!(
            result,
            Err(EmbedError::CountMismatch {
                expected: 2,
                returned: 1
            })
        ));
    }

    #[test]
    fn wrong_width_rows_are_a_dimension_error() {
        let payload = EmbeddingResponse {
            data: vec![row(0, 1.0, 5)],
        };
        let result = rows_to_vectors(payload, 1, 3);
        assert!(matches!(
            result,
            Err(EmbedError::Dimensions {
                expected: 3,
                returned: 5
            })
        ));
    }

    #[test]
    fn request_body_carries_the_pinned_model() {
        let input = vec!["first".to_string(), "second".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: &input,
        })
        .expect("request should serialize");
        assert_eq!(body["model"], "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(body["input"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn endpoint_join_tolerates_trailing_slash() {
        let with_slash = MiniLmEmbedder::new("http://localhost:8080/v1/", None)
            .expect("url should parse");
        let without = MiniLmEmbedder::new("http://localhost:8080/v1", None)
            .expect("url should parse");
        assert_eq!(
            with_slash.endpoint.as_str(),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(with_slash.endpoint, without.endpoint);
    }

    #[test]
    fn embedder_reports_the_fixed_dimension() {
        let embedder =
            MiniLmEmbedder::new("http://localhost:8080/v1", None).expect("url should parse");
        assert_eq!(embedder.dimensions(), 384);
    }
}
