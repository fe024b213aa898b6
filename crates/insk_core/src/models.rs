use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Embed a search query
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents destined for the similarity index
    async fn generate_document_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.generate_embeddings(text).await?);
        }
        Ok(embeddings)
    }

    /// Run a single-turn chat completion over a fully rendered prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}
