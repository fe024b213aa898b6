pub mod cache;
pub mod columns;
pub mod insights;
pub mod loader;
pub mod reader;
pub mod search;
pub mod subcat;

pub use cache::{TableCache, DEFAULT_TTL};
pub use insights::{analyze_insights, summary_stats, Insight, KeywordView, SummaryStats};
pub use loader::{load_news_from_files, ArticleTable, LoadWarning, WarningLevel};
pub use search::{search_articles, DEFAULT_SEARCH_LIMIT};

pub mod prelude {
    pub use super::{ArticleTable, KeywordView, TableCache};
    pub use insk_core::{ArticleRecord, Category, Importance, Result, Error};
}
