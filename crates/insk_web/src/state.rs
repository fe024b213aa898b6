use std::sync::Arc;

use insk_inference::PipelineCache;
use insk_ingest::{ArticleTable, TableCache};

use crate::error::ApiError;
use crate::sessions::SessionStore;

/// Chat backend as far as the dashboard knows it.
pub enum ChatBackend {
    Ready(PipelineCache),
    /// The model could not be created; the reason is shown in place of the chat
    Unavailable(String),
}

pub struct AppState {
    pub tables: Arc<TableCache>,
    pub chat: ChatBackend,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(tables: Arc<TableCache>, chat: ChatBackend) -> Self {
        Self {
            tables,
            chat,
            sessions: SessionStore::new(),
        }
    }

    pub async fn table(&self) -> Result<Arc<ArticleTable>, ApiError> {
        Ok(self.tables.get().await?)
    }

    pub fn model_name(&self) -> Option<&str> {
        match &self.chat {
            ChatBackend::Ready(cache) => Some(cache.model_name()),
            ChatBackend::Unavailable(_) => None,
        }
    }

    pub fn chat_error(&self) -> Option<&str> {
        match &self.chat {
            ChatBackend::Ready(_) => None,
            ChatBackend::Unavailable(reason) => Some(reason.as_str()),
        }
    }
}
