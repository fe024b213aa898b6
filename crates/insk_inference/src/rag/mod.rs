use std::fmt;
use std::sync::Arc;

use insk_core::{ArticleRecord, Document, DocumentIndex, Error, InferenceModel, Result};
use insk_ingest::ArticleTable;
use serde::Serialize;
use tracing::{debug, info};

use crate::Config;

pub mod cache;

pub use cache::PipelineCache;

const PROMPT_HEADER: &str =
    "당신은 AI 뉴스 전문가입니다. '참고 기사'를 바탕으로 '질문'에 대해 한국어로 답변해주세요.\n[참고 기사]\n";
const PROMPT_QUESTION: &str = "\n\n[질문]\n";
const PROMPT_FOOTER: &str = "\n\n[답변]\n";

const CONTENT_MARKER: &str = "내용:";

/// Text the index stores for one article.
pub fn article_document(article: &ArticleRecord) -> String {
    format!("제목: {}\n\n{} {}", article.title, CONTENT_MARKER, article.summary)
}

/// Context and question are inserted verbatim, never re-scanned for placeholders.
pub fn render_prompt(context: &[&str], question: &str) -> String {
    let context = context.join("\n\n");
    let mut prompt = String::with_capacity(
        PROMPT_HEADER.len() + context.len() + PROMPT_QUESTION.len() + question.len() + PROMPT_FOOTER.len(),
    );
    prompt.push_str(PROMPT_HEADER);
    prompt.push_str(&context);
    prompt.push_str(PROMPT_QUESTION);
    prompt.push_str(question);
    prompt.push_str(PROMPT_FOOTER);
    prompt
}

/// Title line of a retrieved document, shown as the answer's reference.
pub fn source_label(content: &str) -> String {
    content
        .split(CONTENT_MARKER)
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Retrieve-then-answer over one canonical table.
pub struct RagPipeline {
    model: Arc<dyn InferenceModel>,
    index: Arc<dyn DocumentIndex>,
    top_k: usize,
    fingerprint: String,
    documents: usize,
}

impl fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagPipeline")
            .field("model", &self.model.name())
            .field("index", &"<dyn DocumentIndex>")
            .field("top_k", &self.top_k)
            .field("documents", &self.documents)
            .finish()
    }
}

impl RagPipeline {
    /// Embed every article into `index`. An empty table has nothing to answer from.
    pub async fn build(
        table: &ArticleTable,
        model: Arc<dyn InferenceModel>,
        index: Arc<dyn DocumentIndex>,
        config: &Config,
    ) -> Result<Option<Self>> {
        if table.is_empty() {
            info!("📭 No articles loaded, chat pipeline not built");
            return Ok(None);
        }

        let texts: Vec<String> = table.articles.iter().map(article_document).collect();
        info!("🔢 Embedding {} articles with {}", texts.len(), model.name());
        let embeddings = model.generate_document_embeddings(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::Inference(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let documents = texts.len();
        index
            .add_documents(
                texts
                    .into_iter()
                    .enumerate()
                    .map(|(id, content)| Document { id, content })
                    .zip(embeddings)
                    .collect(),
            )
            .await?;
        info!("✨ Chat pipeline ready over {} documents", documents);

        Ok(Some(Self {
            model,
            index,
            top_k: config.top_k.max(1),
            fingerprint: table.fingerprint().to_string(),
            documents,
        }))
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn ask(&self, question: &str) -> Result<RagAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Question must not be empty".to_string()));
        }

        let query = self.model.generate_embeddings(question).await?;
        let retrieved = self.index.find_similar(&query, self.top_k).await?;
        debug!("🔍 Retrieved {} documents for question", retrieved.len());

        let context: Vec<&str> = retrieved.iter().map(|d| d.document.content.as_str()).collect();
        let prompt = render_prompt(&context, question);
        let answer = self.model.complete(&prompt).await?;

        Ok(RagAnswer {
            answer,
            sources: context.iter().map(|c| source_label(c)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use insk_core::{Category, Importance};
    use insk_storage::MemoryStorage;

    pub(crate) fn article(title: &str, summary: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            summary: summary.to_string(),
            category: Category::Telco,
            subcat: String::new(),
            url: String::new(),
            importance: Importance::Medium,
        }
    }

    pub(crate) fn sample_table() -> ArticleTable {
        ArticleTable::new(
            vec![
                article("KT 6G 시험", "KT가 6G 필드 시험을 시작했다"),
                article("NVIDIA GPU", "GPU 공급이 늘었다"),
                article("SKT AI", "SKT가 AI 에이전트를 출시했다"),
                article("Samsung HBM", "HBM 생산이 확대됐다"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_article_document_and_source_label() {
        let doc = article_document(&article("제목 A", "요약 B"));
        assert_eq!(doc, "제목: 제목 A\n\n내용: 요약 B");
        assert_eq!(source_label(&doc), "제목: 제목 A");
    }

    #[test]
    fn test_render_prompt() {
        let prompt = render_prompt(&["doc one", "doc two"], "무슨 일?");
        assert!(prompt.contains("[참고 기사]\ndoc one\n\ndoc two\n"));
        assert!(prompt.contains("[질문]\n무슨 일?\n"));
        assert!(prompt.ends_with("[답변]\n"));
    }

    #[test]
    fn test_render_prompt_leaves_braces_in_articles_alone() {
        let prompt = render_prompt(&["see {question} and {context} here"], "WHAT");
        assert!(prompt.contains("see {question} and {context} here"));
        assert_eq!(prompt.matches("WHAT").count(), 1);
        assert!(prompt.contains("[질문]\nWHAT\n"));
    }

    #[tokio::test]
    async fn test_pipeline_answers_with_sources() {
        let table = sample_table();
        let index = Arc::new(MemoryStorage::new());
        let pipeline = RagPipeline::build(
            &table,
            Arc::new(DummyModel),
            index.clone(),
            &Config::default(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(index.len().await, 4);
        assert_eq!(pipeline.documents(), 4);
        assert_eq!(pipeline.fingerprint(), table.fingerprint());

        let answer = pipeline.ask("  KT 6G 시험 소식?  ").await.unwrap();
        assert_eq!(answer.answer, "(dummy) KT 6G 시험 소식?");
        assert_eq!(answer.sources.len(), 3);
        assert!(answer.sources.iter().all(|s| s.starts_with("제목: ")));
    }

    #[tokio::test]
    async fn test_top_k_bounds_sources() {
        let config = Config { top_k: 1, ..Config::default() };
        let pipeline = RagPipeline::build(&sample_table(), Arc::new(DummyModel), Arc::new(MemoryStorage::new()), &config)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pipeline.ask("GPU").await.unwrap().sources.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_table_builds_nothing() {
        let pipeline = RagPipeline::build(
            &ArticleTable::empty(),
            Arc::new(DummyModel),
            Arc::new(MemoryStorage::new()),
            &Config::default(),
        )
        .await
        .unwrap();
        assert!(pipeline.is_none());
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let pipeline = RagPipeline::build(&sample_table(), Arc::new(DummyModel), Arc::new(MemoryStorage::new()), &Config::default())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(pipeline.ask("   ").await, Err(Error::InvalidInput(_))));
    }
}
