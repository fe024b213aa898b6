use insk_core::ArticleRecord;

use crate::loader::ArticleTable;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Case-insensitive substring search over titles and summaries, in table order.
///
/// A blank query matches nothing. A missing or zero `limit` means
/// [`DEFAULT_SEARCH_LIMIT`].
pub fn search_articles<'a>(table: &'a ArticleTable, query: &str, limit: Option<usize>) -> Vec<&'a ArticleRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let limit = limit.filter(|&l| l > 0).unwrap_or(DEFAULT_SEARCH_LIMIT);

    table
        .articles
        .iter()
        .filter(|a| a.title.to_lowercase().contains(&needle) || a.summary.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
