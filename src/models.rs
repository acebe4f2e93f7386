//! Data models for quotekeeper.
//!
//! This module defines the core entities: Quote, QuoteId and Conflict.
//! Quotes serialize to the same `{id?, text, category, timestamp?}` JSON shape
//! used by storage, export files and import files.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for identities minted locally (never issued by the remote source)
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Identity of a quote. Remote sources hand out numbers, local forks use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuoteId {
    Number(i64),
    Text(String),
}

impl QuoteId {
    /// Mint a fresh identity that cannot collide with remote ids
    pub fn new_local() -> Self {
        QuoteId::Text(format!("{}{}", LOCAL_ID_PREFIX, Uuid::now_v7().simple()))
    }

    /// Check if this identity was minted locally
    pub fn is_local(&self) -> bool {
        matches!(self, QuoteId::Text(s) if s.starts_with(LOCAL_ID_PREFIX))
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteId::Number(n) => write!(f, "{}", n),
            QuoteId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for QuoteId {
    fn from(value: i64) -> Self {
        QuoteId::Number(value)
    }
}

impl From<i32> for QuoteId {
    fn from(value: i32) -> Self {
        QuoteId::Number(i64::from(value))
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        QuoteId::Text(value.to_string())
    }
}

/// A single quote record.
///
/// `id` is only present for records that came from, or are matched against,
/// the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    pub text: String,
    pub category: String,
    /// RFC 3339 time the record was fetched or created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Quote {
    /// Create a local-only quote
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            category: category.into(),
            timestamp: None,
        }
    }

    /// Create a quote carrying an identity
    pub fn with_id(id: impl Into<QuoteId>, text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(text, category)
        }
    }

    /// Stamp the quote with the current time
    pub fn stamped(mut self) -> Self {
        self.timestamp = Some(now_rfc3339());
        self
    }

    /// Check if the quote has no identity
    pub fn is_local_only(&self) -> bool {
        self.id.is_none()
    }

    /// True if text and category agree, identity and timestamp ignored
    pub fn same_content(&self, other: &Quote) -> bool {
        self.text == other.text && self.category == other.category
    }
}

/// Ordered list of quotes
pub type QuoteList = Vec<Quote>;

/// A local and a remote record sharing an id but disagreeing on content.
///
/// Conflicts only live until the user resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub id: QuoteId,
    pub local: Quote,
    pub server: Quote,
}

impl Conflict {
    pub fn new(id: QuoteId, local: Quote, server: Quote) -> Self {
        Self { id, local, server }
    }

    pub fn text_differs(&self) -> bool {
        self.local.text != self.server.text
    }

    pub fn category_differs(&self) -> bool {
        self.local.category != self.server.category
    }
}

/// Quotes the store is seeded with when nothing has been persisted yet
pub fn seed_quotes() -> QuoteList {
    vec![
        Quote::new("The only way to do great work is to love what you do.", "Inspiration"),
        Quote::new("Life is what happens when you're busy making other plans.", "Life"),
        Quote::new(
            "The future belongs to those who believe in the beauty of their dreams.",
            "Dreams",
        ),
        Quote::new("The best way to predict the future is to create it.", "Future"),
        Quote::new("Do not wait; the time will never be 'just right.'", "Action"),
        Quote::new(
            "Challenges are what make life interesting and overcoming them is what makes life meaningful.",
            "Challenges",
        ),
    ]
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
