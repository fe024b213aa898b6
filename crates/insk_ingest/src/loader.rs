use std::cmp::Reverse;
use std::path::Path;

use chrono::{DateTime, Utc};
use insk_core::{ArticleRecord, Category, CategoryFilter, Error, Importance, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::columns::{ColumnMap, Field};
use crate::reader::{read_table, RawTable};
use crate::subcat::parse_subcat;

const DERIVED_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Warning,
    Error,
}

/// Problem with one input file. Shown to the user, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub file: String,
    pub level: WarningLevel,
    pub message: String,
}

/// The canonical article table every view reads from.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleTable {
    pub articles: Vec<ArticleRecord>,
    pub warnings: Vec<LoadWarning>,
    pub loaded_at: DateTime<Utc>,
    #[serde(skip)]
    fingerprint: String,
}

impl ArticleTable {
    pub fn new(articles: Vec<ArticleRecord>, warnings: Vec<LoadWarning>) -> Self {
        let fingerprint = fingerprint(&articles);
        Self {
            articles,
            warnings,
            loaded_at: Utc::now(),
            fingerprint,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Hex SHA-256 over the records, identifying distinct tables.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn filter(&self, filter: CategoryFilter) -> Vec<&ArticleRecord> {
        self.articles
            .iter()
            .filter(|a| filter.matches(a.category))
            .collect()
    }
}

fn fingerprint(articles: &[ArticleRecord]) -> String {
    let mut hasher = Sha256::new();
    for article in articles {
        for field in [
            article.title.as_str(),
            article.summary.as_str(),
            article.category.label(),
            article.subcat.as_str(),
            article.url.as_str(),
            article.importance.label(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Row with canonical columns, before cleaning.
#[derive(Debug, Clone)]
struct RawArticle {
    title: String,
    summary: String,
    category: String,
    subcat: String,
    url: String,
    score: String,
}

pub fn load_news_from_files<P: AsRef<Path>>(paths: &[P]) -> ArticleTable {
    let mut warnings = Vec::new();
    let mut merged = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file = path.display().to_string();

        if !path.exists() {
            warn!("⚠️ '{}' not found, skipping", file);
            warnings.push(LoadWarning {
                file,
                level: WarningLevel::Warning,
                message: "file not found, skipping".to_string(),
            });
            continue;
        }

        let rows = read_table(path).and_then(|table| extract_rows(&file, &table));
        match rows {
            Ok(rows) => {
                info!("📄 Loaded {} rows from {}", rows.len(), file);
                merged.extend(rows);
            }
            Err(Error::MissingColumn { column, .. }) => {
                warn!("⚠️ '{}' has no '{}' column, skipping", file, column);
                warnings.push(LoadWarning {
                    file,
                    level: WarningLevel::Warning,
                    message: format!("required column '{}' missing, skipping", column),
                });
            }
            Err(e) => {
                error!("❌ Failed to load '{}': {}", file, e);
                warnings.push(LoadWarning {
                    file,
                    level: WarningLevel::Error,
                    message: format!("failed to load: {}", e),
                });
            }
        }
    }

    let articles = clean(merged);
    info!("✨ Canonical table built with {} articles", articles.len());
    ArticleTable::new(articles, warnings)
}

fn extract_rows(file: &str, table: &RawTable) -> Result<Vec<RawArticle>> {
    let columns = ColumnMap::from(table);
    if !columns.has(Field::Summary) {
        return Err(Error::MissingColumn {
            file: file.to_string(),
            column: Field::Summary.name().to_string(),
        });
    }
    let has_title = columns.has(Field::Title);
    let has_subcat = columns.has(Field::Subcat);

    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cell = |field: Field| columns.get(row, field).unwrap_or("").to_string();
            let summary = cell(Field::Summary);
            let title = if has_title {
                cell(Field::Title)
            } else {
                derive_title(&summary)
            };
            let subcat = if has_subcat {
                parse_subcat(&cell(Field::Subcat))
            } else {
                String::new()
            };
            RawArticle {
                title,
                summary,
                category: cell(Field::Category),
                subcat,
                url: cell(Field::Url).trim().to_string(),
                score: cell(Field::Score),
            }
        })
        .collect())
}

/// Stand-in title for sheets without one: the head of the first summary segment.
pub fn derive_title(summary: &str) -> String {
    let head = summary.split('|').next().unwrap_or("");
    let mut title: String = head.chars().take(DERIVED_TITLE_CHARS).collect();
    title.push_str("...");
    title
}

fn clean(mut rows: Vec<RawArticle>) -> Vec<ArticleRecord> {
    // stable: equal titles keep file order
    rows.sort_by(|a, b| {
        a.summary
            .cmp(&b.summary)
            .then_with(|| Reverse(a.title.chars().count()).cmp(&Reverse(b.title.chars().count())))
    });
    rows.dedup_by(|later, kept| later.summary == kept.summary);

    rows.into_iter()
        .filter(|row| !row.summary.trim().is_empty())
        .map(|row| ArticleRecord {
            summary: last_segment(&row.summary),
            category: Category::normalize(&row.category),
            importance: Importance::from_score(parse_score(&row.score)),
            title: row.title,
            subcat: row.subcat,
            url: row.url,
        })
        .collect()
}

fn last_segment(summary: &str) -> String {
    summary.rsplit('|').next().unwrap_or("").trim().to_string()
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| !s.is_nan())
}
