pub mod pinecone;

pub use pinecone::{
    PineconeClient, PineconeIndex, DEFAULT_CONTROL_PLANE_URL, DEFAULT_INDEX_NAME,
    UPSERT_BATCH_SIZE,
};
