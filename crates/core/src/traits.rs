use async_trait::async_trait;

use crate::error::{LlmError, StoreError};
use crate::models::{QueryMatch, VectorRecord};

/// A vector index that records can be written to and queried from.
/// Same-id upserts overwrite (last write wins).
#[async_trait]
pub trait VectorIndex {
    fn dimensions(&self) -> usize;

    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), StoreError>;

    /// Returns at most `top_k` matches, ordered by descending similarity.
    async fn query(&self, vector: &[f32], top_k: usize)
        -> Result<Vec<QueryMatch>, StoreError>;
}

/// Produces an answer to `question` grounded in `context`. An empty
/// context is a valid input; the prompt handles the refusal wording.
#[async_trait]
pub trait AnswerGenerator {
    async fn answer(&self, question: &str, context: &str) -> Result<String, LlmError>;
}
