use std::sync::Arc;

use insk_core::{InferenceModel, Result};
use insk_ingest::ArticleTable;
use insk_storage::create_index;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::RagPipeline;
use crate::Config;

struct Entry {
    fingerprint: String,
    pipeline: Option<Arc<RagPipeline>>,
}

/// Memoizes the pipeline of the most recent table.
///
/// Builds run under the lock, so concurrent first questions share one build.
/// Failed builds are not remembered and are retried on the next call.
pub struct PipelineCache {
    model: Arc<dyn InferenceModel>,
    config: Config,
    entry: Mutex<Option<Entry>>,
}

impl PipelineCache {
    pub fn new(model: Arc<dyn InferenceModel>, config: Config) -> Self {
        Self {
            model,
            config,
            entry: Mutex::new(None),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// `None` when the table has no articles to answer from.
    pub async fn get_or_build(&self, table: &ArticleTable) -> Result<Option<Arc<RagPipeline>>> {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fingerprint == table.fingerprint() {
                debug!("Reusing chat pipeline for table {}", &cached.fingerprint[..12]);
                return Ok(cached.pipeline.clone());
            }
            info!("♻️ Article table changed, rebuilding chat pipeline");
        }

        let index = create_index(&self.config.index_backend)?;
        let pipeline = RagPipeline::build(table, self.model.clone(), index, &self.config)
            .await?
            .map(Arc::new);

        *entry = Some(Entry {
            fingerprint: table.fingerprint().to_string(),
            pipeline: pipeline.clone(),
        });
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use crate::rag::tests::{article, sample_table};
    use async_trait::async_trait;
    use insk_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingModel {
        batches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl InferenceModel for CountingModel {
        fn name(&self) -> &str {
            "Counting"
        }

        async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn generate_document_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Inference("embedding service down".to_string()));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_pipeline_cached_per_table() {
        let model = Arc::new(CountingModel::default());
        let cache = PipelineCache::new(model.clone(), Config::default());
        let table = sample_table();

        let first = cache.get_or_build(&table).await.unwrap().unwrap();
        let second = cache.get_or_build(&table).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(model.batches.load(Ordering::SeqCst), 1);

        let changed = ArticleTable::new(vec![article("new", "different")], Vec::new());
        let third = cache.get_or_build(&changed).await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.documents(), 1);
        assert_eq!(model.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let model = Arc::new(CountingModel { fail: true, ..CountingModel::default() });
        let cache = PipelineCache::new(model.clone(), Config::default());
        let table = sample_table();

        assert!(cache.get_or_build(&table).await.is_err());
        assert!(cache.get_or_build(&table).await.is_err());
        assert_eq!(model.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_index_backend_is_config_error() {
        let model = Arc::new(CountingModel::default());
        let config = Config { index_backend: "faiss".to_string(), ..Config::default() };
        let cache = PipelineCache::new(model.clone(), config);

        assert!(matches!(cache.get_or_build(&sample_table()).await, Err(Error::Config(_))));
        assert_eq!(model.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_table_has_no_pipeline() {
        let cache = PipelineCache::new(Arc::new(DummyModel), Config::default());
        assert!(cache.get_or_build(&ArticleTable::empty()).await.unwrap().is_none());
        assert_eq!(cache.model_name(), "Dummy");
    }
}
