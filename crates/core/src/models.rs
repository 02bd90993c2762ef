use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Voice,
    Document,
}

impl HistoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Voice => "voice",
            HistoryKind::Document => "document",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryKind {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "voice" => Ok(HistoryKind::Voice),
            "document" => Ok(HistoryKind::Document),
            other => Err(ServiceError::Validation(format!(
                "type_filter must be one of voice, document (got {other:?})"
            ))),
        }
    }
}

/// The AI side of a recorded interaction. The variant decides which of
/// `response` / `summary` appears next to `type` in the serialized item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Interaction {
    Voice { response: String },
    Document { summary: String },
}

impl Interaction {
    pub fn kind(&self) -> HistoryKind {
        match self {
            Interaction::Voice { .. } => HistoryKind::Voice,
            Interaction::Document { .. } => HistoryKind::Document,
        }
    }

    pub fn generated_text(&self) -> &str {
        match self {
            Interaction::Voice { response } => response,
            Interaction::Document { summary } => summary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: u64,
    #[serde(flatten)]
    pub interaction: Interaction,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn kind(&self) -> HistoryKind {
        self.interaction.kind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ServiceError::Validation(format!(
                "sort must be one of asc, desc (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryQuery {
    pub page: u32,
    pub per_page: u32,
    pub type_filter: Option<HistoryKind>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            type_filter: None,
            search: None,
            sort: SortOrder::Desc,
        }
    }
}

impl HistoryQuery {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.page < 1 {
            return Err(ServiceError::Validation(format!(
                "page must be at least 1 (got {})",
                self.page
            )));
        }

        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(ServiceError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE} (got {})",
                self.per_page
            )));
        }

        Ok(())
    }

    /// The lowercased search term, or `None` when no search applies.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginatedHistory {
    pub items: Vec<HistoryItem>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadOutcome {
    pub filename: String,
    pub text: String,
    pub summary: String,
}
