use async_trait::async_trait;
use insk_core::{Document, DocumentIndex, Error, Result, ScoredDocument};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cosine_similarity;

#[derive(Default)]
pub struct MemoryStore {
    documents: Vec<(Document, Vec<f32>)>,
    vector_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_documents(&mut self, documents: Vec<(Document, Vec<f32>)>) -> Result<()> {
        for (document, embedding) in documents {
            match self.vector_size {
                Some(size) if size != embedding.len() => {
                    return Err(Error::Storage(format!(
                        "Embedding of document {} has {} dimensions, index expects {}",
                        document.id,
                        embedding.len(),
                        size
                    )));
                }
                None => self.vector_size = Some(embedding.len()),
                _ => {}
            }
            self.documents.push((document, embedding));
        }
        Ok(())
    }

    pub fn find_similar(&self, embedding: &[f32], limit: usize) -> Vec<ScoredDocument> {
        let mut scored: Vec<ScoredDocument> = self
            .documents
            .iter()
            .map(|(document, stored)| ScoredDocument {
                document: document.clone(),
                score: cosine_similarity(embedding, stored),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn vector_size(&self) -> Option<usize> {
        self.vector_size
    }
}

/// In-process similarity index; lives as long as the pipeline that owns it.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentIndex for MemoryStorage {
    async fn add_documents(&self, documents: Vec<(Document, Vec<f32>)>) -> Result<()> {
        let mut store = self.store.write().await;
        let added = documents.len();
        store.add_documents(documents)?;
        debug!("Indexed {} documents ({} total)", added, store.len());
        Ok(())
    }

    async fn find_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredDocument>> {
        let store = self.store.read().await;
        Ok(store.find_similar(embedding, limit))
    }

    async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}
