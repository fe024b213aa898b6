use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use insk_core::{ArticleRecord, CategoryFilter, ChatMessage, Importance};
use insk_ingest::{
    analyze_insights, search_articles, summary_stats, Insight, KeywordView, LoadWarning, SummaryStats,
    DEFAULT_SEARCH_LIMIT,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, ChatBackend};

pub const EMPTY_TABLE_MESSAGE: &str = "No data could be loaded. Check the spreadsheet file paths.";
pub const EMPTY_CATEGORY_MESSAGE: &str = "No news in this category.";
pub const NO_INSIGHTS_MESSAGE: &str = "Not enough data to derive insights.";
pub const CHAT_FAILURE_PREFIX: &str = "답변 생성 중 오류가 발생했습니다";

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleCard {
    pub title: String,
    pub summary: String,
    pub category: String,
    pub category_class: String,
    pub keywords: Vec<String>,
    pub url: String,
    /// Safe anchor target: the article URL when it is http(s), otherwise "#"
    pub link: String,
    pub importance: Importance,
}

impl From<&ArticleRecord> for ArticleCard {
    fn from(article: &ArticleRecord) -> Self {
        Self {
            title: article.title.clone(),
            summary: article.summary.clone(),
            category: article.category.label().to_string(),
            category_class: article.category.css_class(),
            keywords: article
                .subcat
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            url: article.url.clone(),
            link: card_link(&article.url),
            importance: article.importance,
        }
    }
}

pub fn card_link(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => "#".to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticlesResponse {
    pub selected: String,
    pub categories: Vec<String>,
    pub total: usize,
    pub articles: Vec<ArticleCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub limit: usize,
    pub total: usize,
    pub articles: Vec<ArticleCard>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsQuery {
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
    pub stats: SummaryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub loaded_at: DateTime<Utc>,
    pub articles: usize,
    pub files: Vec<String>,
    pub warnings: Vec<LoadWarning>,
    pub model: Option<String>,
    pub chat_error: Option<String>,
    pub sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: ChatMessage,
    pub sources: Vec<String>,
    /// The answer could not be generated; `reply` carries the error text
    pub failed: bool,
    pub transcript_len: usize,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let table = state.table().await?;
    Ok(Json(StatusResponse {
        loaded_at: table.loaded_at,
        articles: table.len(),
        files: state.tables.paths().iter().map(|p| p.display().to_string()).collect(),
        warnings: table.warnings.clone(),
        model: state.model_name().map(str::to_string),
        chat_error: state.chat_error().map(str::to_string),
        sessions: state.sessions.len().await,
    }))
}

pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    info!("🔄 Reloading article table on request");
    state.tables.invalidate().await;
    status(State(state)).await
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let filter: CategoryFilter = query.category.as_deref().unwrap_or("All").parse()?;
    let table = state.table().await?;

    let articles: Vec<ArticleCard> = table.filter(filter).into_iter().map(ArticleCard::from).collect();
    let message = if table.is_empty() {
        Some(EMPTY_TABLE_MESSAGE.to_string())
    } else if articles.is_empty() {
        Some(EMPTY_CATEGORY_MESSAGE.to_string())
    } else {
        None
    };

    Ok(Json(ArticlesResponse {
        selected: filter.label().to_string(),
        categories: CategoryFilter::choices().into_iter().map(str::to_string).collect(),
        total: articles.len(),
        articles,
        message,
    }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let table = state.table().await?;
    let limit = query.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_SEARCH_LIMIT);
    let articles: Vec<ArticleCard> = search_articles(&table, &query.q, Some(limit))
        .into_iter()
        .map(ArticleCard::from)
        .collect();
    Ok(Json(SearchResponse {
        query: query.q,
        limit,
        total: articles.len(),
        articles,
    }))
}

pub async fn keywords(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordsQuery>,
) -> Result<Json<KeywordView>, ApiError> {
    let table = state.table().await?;
    Ok(Json(KeywordView::build(&table, query.top)))
}

pub async fn insights(State(state): State<Arc<AppState>>) -> Result<Json<InsightsResponse>, ApiError> {
    let table = state.table().await?;
    let insights = analyze_insights(&table);
    let message = insights.is_empty().then(|| NO_INSIGHTS_MESSAGE.to_string());
    Ok(Json(InsightsResponse {
        insights,
        stats: summary_stats(&table),
        message,
    }))
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (session_id, transcript) = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            messages: transcript.messages().to_vec(),
        }),
    )
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let transcript = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Unknown chat session {}", id)))?;
    Ok(Json(SessionResponse {
        session_id: id,
        messages: transcript.messages().to_vec(),
    }))
}

pub async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        info!("👋 Chat session {} ended", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Unknown chat session {}", id)))
    }
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if !state.sessions.contains(&id).await {
        return Err(ApiError::NotFound(format!("Unknown chat session {}", id)));
    }
    let question = request.content.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".to_string()));
    }

    let cache = match &state.chat {
        ChatBackend::Ready(cache) => cache,
        ChatBackend::Unavailable(reason) => return Err(ApiError::ServiceUnavailable(reason.clone())),
    };
    let table = state.table().await?;
    let pipeline = cache
        .get_or_build(&table)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Failed to build the chat pipeline: {}", e)))?
        .ok_or_else(|| ApiError::ServiceUnavailable(EMPTY_TABLE_MESSAGE.to_string()))?;

    let (reply, sources, failed) = match pipeline.ask(&question).await {
        Ok(answer) => (ChatMessage::assistant(answer.answer), answer.sources, false),
        Err(e) => {
            warn!("❌ Answer generation failed: {}", e);
            (
                ChatMessage::assistant(format!("{}: {}", CHAT_FAILURE_PREFIX, e)),
                Vec::new(),
                true,
            )
        }
    };

    let transcript_len = state
        .sessions
        .push_exchange(&id, ChatMessage::user(question), reply.clone())
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Unknown chat session {}", id)))?;

    Ok(Json(ChatReply {
        session_id: id,
        reply,
        sources,
        failed,
        transcript_len,
    }))
}
