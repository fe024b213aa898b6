use std::fmt;

use insk_core::{InferenceModel, Result};
use insk_storage::DEFAULT_VECTOR_SIZE;

use crate::Config;

/// Offline model: character-bucket embeddings and an echoing completion.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub async fn new(_config: Option<Config>) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; DEFAULT_VECTOR_SIZE];

        let text_len = text.chars().count() as f32;
        if text_len == 0.0 {
            return Ok(embedding);
        }
        embedding[0] = text_len / 1000.0;

        // character frequencies, bucketed by code point
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            let bucket = 1 + (c as usize) % (DEFAULT_VECTOR_SIZE - 1);
            embedding[bucket] += 1.0 / text_len;
        }

        Ok(embedding)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let question = prompt
            .lines()
            .map(str::trim)
            .skip_while(|line| *line != "[질문]")
            .nth(1)
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| prompt.lines().next().unwrap_or(""));
        Ok(format!("(dummy) {}", question))
    }
}
