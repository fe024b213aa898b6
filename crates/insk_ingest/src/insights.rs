use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use insk_core::{Category, Importance};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::loader::ArticleTable;

pub const MAX_TOP_KEYWORDS: usize = 20;
pub const DEFAULT_TOP_KEYWORDS: usize = 10;
pub const TITLE_KEYWORD_LIMIT: usize = 10;

lazy_static! {
    static ref TITLE_WORD: Regex = Regex::new(r"[가-힣a-zA-Z0-9]{3,}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub categories: usize,
    pub high_importance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSource {
    Subcategory,
    Title,
}

/// Data behind the keyword bar chart and its "top N" slider.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordView {
    pub total_articles: usize,
    pub source: KeywordSource,
    /// Articles with a non-empty keyword list
    pub tagged_articles: usize,
    pub total_mentions: usize,
    pub distinct_keywords: usize,
    pub max_top: usize,
    pub default_top: usize,
    pub top: usize,
    pub samples: Vec<String>,
    pub keywords: Vec<KeywordCount>,
}

/// Count occurrences, most frequent first; ties keep first-seen order.
fn ranked<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut order = Vec::new();
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }
    let mut ranked: Vec<(T, usize)> = order
        .into_iter()
        .map(|item| {
            let count = counts[&item];
            (item, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn category_counts(table: &ArticleTable) -> Vec<(Category, usize)> {
    ranked(table.articles.iter().map(|a| a.category))
}

pub fn analyze_insights(table: &ArticleTable) -> Vec<Insight> {
    let mut insights = Vec::new();
    if let Some((top, count)) = category_counts(table).into_iter().next() {
        insights.push(Insight {
            title: "📊 Top category".to_string(),
            content: format!(
                "The most mentioned category is \"{}\" ({} articles).",
                top, count
            ),
        });
    }
    insights
}

pub fn summary_stats(table: &ArticleTable) -> SummaryStats {
    let categories: HashSet<Category> = table.articles.iter().map(|a| a.category).collect();
    SummaryStats {
        total: table.len(),
        categories: categories.len(),
        high_importance: table
            .articles
            .iter()
            .filter(|a| a.importance == Importance::High)
            .count(),
    }
}

fn subcat_keywords(table: &ArticleTable) -> impl Iterator<Item = String> + '_ {
    table
        .articles
        .iter()
        .flat_map(|a| a.subcat.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

pub fn keyword_counts(table: &ArticleTable) -> Vec<KeywordCount> {
    ranked(subcat_keywords(table))
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect()
}

/// Fallback keywords when no article carries a subcategory list.
pub fn title_keywords(table: &ArticleTable, limit: usize) -> Vec<KeywordCount> {
    let words = table
        .articles
        .iter()
        .flat_map(|a| TITLE_WORD.find_iter(&a.title).map(|m| m.as_str().to_string()).collect::<Vec<_>>());
    ranked(words)
        .into_iter()
        .take(limit)
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect()
}

impl KeywordView {
    pub fn build(table: &ArticleTable, requested_top: Option<usize>) -> Self {
        let tagged: Vec<&str> = table
            .articles
            .iter()
            .map(|a| a.subcat.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let (source, counts) = if tagged.is_empty() {
            (KeywordSource::Title, title_keywords(table, TITLE_KEYWORD_LIMIT))
        } else {
            (KeywordSource::Subcategory, keyword_counts(table))
        };

        let distinct_keywords = counts.len();
        let max_top = distinct_keywords.min(MAX_TOP_KEYWORDS);
        let default_top = DEFAULT_TOP_KEYWORDS.min(max_top);
        let top = match requested_top {
            Some(n) if max_top > 0 => n.clamp(1, max_top),
            _ => default_top,
        };

        Self {
            total_articles: table.len(),
            source,
            tagged_articles: tagged.len(),
            total_mentions: counts.iter().map(|k| k.count).sum(),
            distinct_keywords,
            max_top,
            default_top,
            top,
            samples: tagged.iter().take(5).map(|s| s.to_string()).collect(),
            keywords: counts.into_iter().take(top).collect(),
        }
    }
}
