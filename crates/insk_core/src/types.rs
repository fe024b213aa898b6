use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One row of the canonical article table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub summary: String,
    pub category: Category,
    /// Comma separated keywords, possibly empty
    pub subcat: String,
    pub url: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Telco")]
    Telco,
    #[serde(rename = "LLM/AI Service")]
    LlmAiService,
    #[serde(rename = "AI Infra")]
    AiInfra,
    #[serde(rename = "AI Ecosystem")]
    AiEcosystem,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Telco,
        Category::LlmAiService,
        Category::AiInfra,
        Category::AiEcosystem,
        Category::Other,
    ];

    /// Map a free-text classifier label onto the closed category set.
    /// Earlier rules win, so "telco service" is Telco.
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| s.contains(n));

        if has(&["telco", "통신", "텔코"]) {
            Category::Telco
        } else if has(&["llm", "service", "서비스"]) {
            Category::LlmAiService
        } else if has(&["infra", "인프라"]) {
            Category::AiInfra
        } else if has(&["ecosystem", "생태계"]) {
            Category::AiEcosystem
        } else {
            Category::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Telco => "Telco",
            Category::LlmAiService => "LLM/AI Service",
            Category::AiInfra => "AI Infra",
            Category::AiEcosystem => "AI Ecosystem",
            Category::Other => "Other",
        }
    }

    /// Label stripped to alphanumerics, used as a styling hook by the front-end.
    pub fn css_class(&self) -> String {
        self.label().chars().filter(|c| c.is_alphanumeric()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category selection of the card view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn choices() -> Vec<&'static str> {
        std::iter::once("All")
            .chain(Category::ALL.iter().map(|c| c.label()))
            .collect()
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(c) => c.label(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("all") || wanted.is_empty() {
            return Ok(CategoryFilter::All);
        }
        if wanted == "기타" {
            return Ok(CategoryFilter::Only(Category::Other));
        }
        Category::ALL
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .map(|c| CategoryFilter::Only(*c))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Importance {
    High,
    Medium,
}

impl Importance {
    /// Missing or unparsable scores count as zero.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s > 0.0 => Importance::High,
            _ => Importance::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Importance::High => "High",
            Importance::Medium => "Medium",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

pub const GREETING: &str = "안녕하세요! 수집된 뉴스에 대해 무엇이든 물어보세요.";

/// Chat history of one session. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub started_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Text unit stored in the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Row position in the table the document was built from
    pub id: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}
