use std::sync::Arc;

use insk_core::{Error, Result};
use tracing::info;

use crate::{Config, DEFAULT_MODEL};

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;
pub use insk_core::InferenceModel;

pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    let name = config
        .model_name
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
        .to_lowercase();

    let model: Arc<dyn InferenceModel> = match name.as_str() {
        "gemini" => Arc::new(GeminiModel::new(config)?),
        "dummy" => Arc::new(DummyModel::new(None).await?),
        other => {
            return Err(Error::Config(format!(
                "Unknown model '{}'. Available models: gemini (default), dummy",
                other
            )))
        }
    };
    info!("🧠 Inference model ready (using {})", model.name());
    Ok(model)
}
