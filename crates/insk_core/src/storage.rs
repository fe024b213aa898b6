use async_trait::async_trait;
use crate::types::{Document, ScoredDocument};
use crate::Result;

#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Store documents alongside their embeddings
    async fn add_documents(&self, documents: Vec<(Document, Vec<f32>)>) -> Result<()>;

    /// Find the documents closest to an embedding, best match first
    async fn find_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredDocument>>;

    /// Number of stored documents
    async fn len(&self) -> usize;
}
