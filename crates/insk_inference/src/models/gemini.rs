use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use insk_core::{Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Config;

/// Largest batch accepted by `batchEmbedContents`.
const EMBED_BATCH_SIZE: usize = 100;
const CONCURRENT_BATCHES: usize = 4;
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self { parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ChatContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct ChatContent {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    temperature: f32,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

impl GeminiModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Gemini API key is not configured".to_string()))?;

        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: qualified(&config.embedding_model),
            chat_model: qualified(&config.chat_model),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model, method)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, url: String, body: &B) -> Result<R> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(Error::Inference(format!("Gemini API returned {}: {}", status, text)));
        }

        response.json::<R>().await.map_err(transport_error)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: self.embedding_model.clone(),
                    content: Content::text(text),
                    task_type: "RETRIEVAL_DOCUMENT",
                })
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .post(self.endpoint(&self.embedding_model, "batchEmbedContents"), &request)
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(Error::Inference(format!(
                "Gemini returned {} embeddings for {} documents",
                response.embeddings.len(),
                texts.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// Request URLs never reach callers; error text ends up in chat replies and logs.
fn transport_error(e: reqwest::Error) -> Error {
    Error::Http(e.without_url())
}

/// Gemini model ids are addressed as `models/<id>`.
fn qualified(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Inference("Gemini returned an empty answer".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedContentRequest {
            model: self.embedding_model.clone(),
            content: Content::text(text),
            task_type: "RETRIEVAL_QUERY",
        };
        let response: EmbedContentResponse = self
            .post(self.endpoint(&self.embedding_model, "embedContent"), &request)
            .await?;
        Ok(response.embedding.values)
    }

    async fn generate_document_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("Embedding {} documents with {}", texts.len(), self.embedding_model);
        let requests: Vec<_> = texts
            .chunks(EMBED_BATCH_SIZE)
            .map(|batch| self.embed_batch(batch))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(CONCURRENT_BATCHES)
            .try_collect()
            .await?;
        Ok(batches.into_iter().flatten().collect())
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![ChatContent {
                role: "user",
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };
        let response: GenerateContentResponse = self
            .post(self.endpoint(&self.chat_model, "generateContent"), &request)
            .await?;
        extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn model() -> GeminiModel {
        GeminiModel::new(Config {
            api_key: Some("test-key".to_string()),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_model_requires_api_key() {
        let result = GeminiModel::new(Config::default());
        assert_eq!(result.unwrap_err().to_string(), "Configuration error: Gemini API key is not configured");

        let result = GeminiModel::new(Config {
            api_key: Some("  ".to_string()),
            ..Config::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoints() {
        let model = model();
        assert_eq!(
            model.endpoint(&model.chat_model, "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            model.endpoint(&model.embedding_model, "batchEmbedContents"),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:batchEmbedContents"
        );
        assert!(!format!("{:?}", model).contains("test-key"));
    }

    #[test]
    fn test_request_shapes() {
        let request = BatchEmbedRequest {
            requests: vec![EmbedContentRequest {
                model: "models/embedding-001".to_string(),
                content: Content::text("hello"),
                task_type: "RETRIEVAL_DOCUMENT",
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"requests": [{
                "model": "models/embedding-001",
                "content": {"parts": [{"text": "hello"}]},
                "taskType": "RETRIEVAL_DOCUMENT"
            }]})
        );

        let request = GenerateContentRequest {
            contents: vec![ChatContent { role: "user", parts: vec![Part { text: "q".to_string() }] }],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["temperature"], json!(0.5));
        assert_eq!(value["contents"][0]["role"], json!("user"));
    }

    #[test]
    fn test_extract_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "KT는 "}, {"text": "6G를 시험합니다."}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "KT는 6G를 시험합니다.");

        let blocked: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(extract_text(blocked), Err(Error::Inference(_))));
    }

    /// Serves a stand-in Gemini API on an ephemeral port and returns its base URL.
    async fn fake_gemini() -> String {
        async fn handle(uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some("test-key") {
                return (StatusCode::FORBIDDEN, Json(json!({"error": {"message": "API key not valid"}})));
            }
            let path = uri.path();
            if path.ends_with(":batchEmbedContents") {
                let embeddings: Vec<Value> = body["requests"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| {
                        let n: f32 = r["content"]["parts"][0]["text"].as_str().unwrap().parse().unwrap();
                        json!({"values": [n, 1.0]})
                    })
                    .collect();
                (StatusCode::OK, Json(json!({"embeddings": embeddings})))
            } else if path.ends_with(":embedContent") {
                (StatusCode::OK, Json(json!({"embedding": {"values": [0.5, 0.5]}})))
            } else {
                (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": {"message": "quota exhausted"}})))
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(handle)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn model_at(base_url: String, api_key: &str) -> GeminiModel {
        GeminiModel::new(Config {
            api_key: Some(api_key.to_string()),
            base_url,
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let model = model_at("http://127.0.0.1:1".to_string(), "SECRET-KEY-123");
        let err = model.complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn test_key_sent_as_header() {
        let base = fake_gemini().await;
        let ok = model_at(base.clone(), "test-key");
        assert_eq!(ok.generate_embeddings("q").await.unwrap(), vec![0.5, 0.5]);

        let wrong = model_at(base, "other-key");
        let err = wrong.generate_embeddings("q").await.unwrap_err().to_string();
        assert!(err.contains("403"));
        assert!(!err.contains("other-key"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_inference_error() {
        let model = model_at(fake_gemini().await, "test-key");
        match model.complete("hi").await {
            Err(Error::Inference(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("quota exhausted"));
            }
            other => panic!("expected an inference error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_document_embeddings_keep_order_across_batches() {
        let model = model_at(fake_gemini().await, "test-key");
        let texts: Vec<String> = (0..250).map(|i| i.to_string()).collect();
        let embeddings = model.generate_document_embeddings(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 250);
        for (i, embedding) in embeddings.iter().enumerate() {
            assert_eq!(embedding[0], i as f32);
        }
    }

    #[test]
    fn test_qualified_model_names() {
        assert_eq!(qualified("gemini-1.5-flash"), "models/gemini-1.5-flash");
        assert_eq!(qualified("models/embedding-001"), "models/embedding-001");
    }
}
