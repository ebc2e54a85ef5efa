pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod stores;
pub mod traits;

pub use chunking::{split_text, ChunkerConfig, DEFAULT_SEPARATORS};
pub use embeddings::{Embedder, MiniLmEmbedder, EMBEDDING_DIMENSIONS, EMBEDDING_MODEL};
pub use error::{EmbedError, IngestError, LlmError, QueryError, StoreError};
pub use extractor::extract_text;
pub use llm::{GroqGenerator, COMPLETION_MODEL, DEFAULT_GROQ_URL};
pub use models::{
    AnswerOutcome, ConversationMessage, DocumentFingerprint, IngestionReport, PipelineOptions,
    QueryMatch, RecordMetadata, Role, Session, VectorRecord,
};
pub use orchestrator::SyllabusPipeline;
pub use prompts::{render_system_prompt, RAG_SYSTEM_PROMPT, REFUSAL_ANSWER};
pub use stores::{PineconeClient, PineconeIndex, DEFAULT_CONTROL_PLANE_URL, DEFAULT_INDEX_NAME};
pub use traits::{AnswerGenerator, VectorIndex};
