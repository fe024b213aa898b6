pub mod models;
pub mod rag;
pub mod secrets;

pub const DEFAULT_MODEL: &str = "gemini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_INDEX_BACKEND: &str = "memory";

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    /// Which backend `create_model` builds: "gemini" or "dummy"
    pub model_name: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Documents retrieved per question
    pub top_k: usize,
    /// Passed to `insk_storage::create_index`
    pub index_backend: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("index_backend", &self.index_backend)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.3,
            top_k: 3,
            index_backend: DEFAULT_INDEX_BACKEND.to_string(),
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::rag::{PipelineCache, RagAnswer, RagPipeline};
    pub use super::secrets::Secrets;
    pub use insk_core::{InferenceModel, Result, Error};
}

pub use models::create_model;
pub use rag::{PipelineCache, RagAnswer, RagPipeline};
pub use secrets::Secrets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
