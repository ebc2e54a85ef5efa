use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of an ingested document, derived from the raw PDF bytes.
///
/// The bytes themselves are consumed by ingestion and never retained;
/// `document_id` scopes the record ids written to the vector store, so
/// re-ingesting identical bytes overwrites its own records instead of
/// colliding with another document's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

impl DocumentFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let checksum = format!("{:x}", hasher.finalize());
        let document_id = checksum[..12].to_string();
        Self {
            document_id,
            checksum,
            ingested_at: Utc::now(),
        }
    }
}

/// Metadata stored alongside each vector. A fixed record, not an open map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    pub text: String,
}

/// One embedded chunk, shaped for the vector store wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// One retrieved record with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

/// Append-only conversation transcript, owned by the caller and passed
/// `&mut` into the query flow. Lives for one interactive session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<ConversationMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
        }
    }
}

/// Outcome of one ingestion flow. `chunk_count == 0` is the valid terminal
/// for a PDF with no extractable text, not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub document_id: String,
    pub extracted_chars: usize,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

impl IngestionReport {
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

/// Outcome of one query flow: the generated answer plus the raw context the
/// generator saw, so the surface can show what was retrieved.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub context: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_identical_bytes() {
        let a = DocumentFingerprint::from_bytes(b"syllabus bytes");
        let b = DocumentFingerprint::from_bytes(b"syllabus bytes");
        assert_eq!(a.document_id, b.document_id);
        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.document_id.len(), 12);
    }

    #[test]
    fn fingerprint_differs_across_documents() {
        let a = DocumentFingerprint::from_bytes(b"first syllabus");
        let b = DocumentFingerprint::from_bytes(b"second syllabus");
        assert_ne!(a.document_id, b.document_id);
    }

    #[test]
    fn session_appends_in_order() {
        let mut session = Session::new();
        session.push_user("When are office hours?");
        session.push_assistant("Office hours are Monday 3-5pm.");
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = ConversationMessage {
            role: Role::Assistant,
            content: "hi".into(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn default_options_match_pipeline_contract() {
        let options = PipelineOptions::default();
        assert_eq!(options.chunk_size, 500);
        assert_eq!(options.chunk_overlap, 50);
        assert_eq!(options.top_k, 5);
    }
}
