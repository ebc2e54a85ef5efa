use crate::chunking::{split_text, ChunkerConfig};
use crate::embeddings::Embedder;
use crate::error::{IngestError, QueryError};
use crate::extractor::extract_text;
use crate::models::{
    AnswerOutcome, DocumentFingerprint, IngestionReport, PipelineOptions, QueryMatch,
    RecordMetadata, Session, VectorRecord,
};
use crate::traits::{AnswerGenerator, VectorIndex};

/// Drives the two flows of the system: ingesting a syllabus PDF into the
/// vector index, and answering a question against whatever has been
/// ingested so far.
///
/// The index is an `Option`: the surface stays usable when the vector
/// store could not be reached at startup. Queries then run with an empty
/// context and ingestion fails at the upsert stage.
pub struct SyllabusPipeline<E, V, G>
where
    E: Embedder,
    V: VectorIndex,
    G: AnswerGenerator,
{
    embedder: E,
    index: Option<V>,
    generator: G,
    options: PipelineOptions,
}

impl<E, V, G> SyllabusPipeline<E, V, G>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
    G: AnswerGenerator + Send + Sync,
{
    pub fn new(embedder: E, index: Option<V>, generator: G, options: PipelineOptions) -> Self {
        Self {
            embedder,
            index,
            generator,
            options,
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Extracts, chunks, embeds and upserts one PDF.
    ///
    /// A PDF with no extractable text finishes as a zero-chunk report
    /// without touching the embedder or the index. An absent index fails
    /// the flow only at the upsert stage, after the earlier stages ran.
    pub async fn ingest(&self, pdf: &[u8]) -> Result<IngestionReport, IngestError> {
        let fingerprint = DocumentFingerprint::from_bytes(pdf);
        let text = extract_text(pdf)?;
        let extracted_chars = text.chars().count();

        let config = ChunkerConfig::try_from(self.options)?;
        let chunks = split_text(&text, config);
        if chunks.is_empty() {
            return Ok(IngestionReport {
                document_id: fingerprint.document_id,
                extracted_chars,
                chunk_count: 0,
                ingested_at: fingerprint.ingested_at,
            });
        }

        let embeddings = self.embedder.embed(&chunks).await?;
        let chunk_count = chunks.len();
        let records = build_records(&fingerprint.document_id, chunks, embeddings);

        let index = self.index.as_ref().ok_or(IngestError::IndexNotReady)?;
        index.upsert(&records).await?;

        Ok(IngestionReport {
            document_id: fingerprint.document_id,
            extracted_chars,
            chunk_count,
            ingested_at: fingerprint.ingested_at,
        })
    }

    /// Answers one question, appending the turn to `session`.
    ///
    /// The user message is appended before anything can fail, so a failed
    /// query leaves it in place with no assistant reply. Without an index
    /// the retrieval step is skipped and the generator sees an empty
    /// context, which the prompt turns into the refusal answer.
    pub async fn answer(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<AnswerOutcome, QueryError> {
        session.push_user(question);

        let context = match &self.index {
            Some(index) => {
                let vector = self.embedder.embed_query(question).await?;
                let matches = index.query(&vector, self.options.top_k).await?;
                assemble_context(&matches)
            }
            None => String::new(),
        };

        let answer = self.generator.answer(question, &context).await?;
        session.push_assistant(answer.clone());

        Ok(AnswerOutcome { answer, context })
    }
}

fn build_records(
    document_id: &str,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
) -> Vec<VectorRecord> {
    chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (text, values))| VectorRecord {
            id: format!("{document_id}-{position}"),
            values,
            metadata: RecordMetadata { text },
        })
        .collect()
}

// Match texts joined in retrieval order; no deduplication, no truncation
// beyond what top_k already bounded.
fn assemble_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|hit| hit.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
