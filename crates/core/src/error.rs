use thiserror::Error;

/// Failures talking to the vector store (Pinecone control or data plane).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("index dimension is {existing} but vectors have dimension {requested}")]
    DimensionMismatch { existing: usize, requested: usize },
}

/// Failures talking to the embedding endpoint.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("embedding request failed with {status}: {details}")]
    Api { status: String, details: String },

    #[error("asked for {expected} embeddings, endpoint returned {returned}")]
    CountMismatch { expected: usize, returned: usize },

    #[error("expected {expected}-dimensional embeddings, endpoint returned {returned}")]
    Dimensions { expected: usize, returned: usize },
}

/// Failures talking to the completion API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("completion request failed with {status}: {details}")]
    Api { status: String, details: String },

    #[error("completion response contained no choices")]
    EmptyCompletion,

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Errors surfaced by the ingestion flow.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector store rejected the batch: {0}")]
    Store(#[from] StoreError),

    #[error("vector index not initialized")]
    IndexNotReady,
}

/// Errors surfaced by the query flow. The user message is already part of
/// the session when one of these comes back.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("retrieval failed: {0}")]
    Store(#[from] StoreError),

    #[error("answer generation failed: {0}")]
    Llm(#[from] LlmError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_names_both_sides() {
        let err = StoreError::DimensionMismatch {
            existing: 384,
            requested: 768,
        };
        let text = err.to_string();
        assert!(text.contains("384"));
        assert!(text.contains("768"));
    }

    #[test]
    fn flow_errors_wrap_component_errors() {
        let err = IngestError::from(EmbedError::CountMismatch {
            expected: 3,
            returned: 2,
        });
        assert!(matches!(err, IngestError::Embed(_)));
        assert!(err.to_string().contains("embedding failed"));

        let err = QueryError::from(LlmError::EmptyCompletion);
        assert!(matches!(err, QueryError::Llm(_)));
    }
}
