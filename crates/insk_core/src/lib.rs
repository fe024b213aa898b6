pub mod models;
pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::InferenceModel;
pub use storage::DocumentIndex;
pub use types::{
    ArticleRecord, Category, CategoryFilter, ChatMessage, ChatRole, Document, Importance,
    ScoredDocument, Transcript,
};
