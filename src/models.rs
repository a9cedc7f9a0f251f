//! Unified post and comment records shared by every source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ANONYMOUS_AUTHOR, REDDIT_DELETED_AUTHOR};

/// Platform a record was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "Reddit")]
    Reddit,
    #[serde(rename = "4chan")]
    FourChan,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reddit => "Reddit",
            Self::FourChan => "4chan",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a post or comment.
///
/// Reddit uses base36 strings, 4chan uses post numbers. Identifiers are only unique
/// within one platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A reply attached to a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub comment_id: RecordId,
    pub comment_text: String,
    pub comment_author: String,
    /// Voting score; 4chan has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_score: Option<i64>,
    pub comment_timestamp: i64,
}

/// A collected post with its comments in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub platform: Platform,
    pub id: RecordId,
    pub title: String,
    pub content: String,
    /// Creation time, epoch seconds.
    pub timestamp: i64,
    /// Reply count as reported by the source, not necessarily `comments.len()`.
    pub comments_count: u64,
    /// Always serialized so the column exists even when every value is empty.
    pub upvotes: Option<i64>,
    pub author: String,
    /// Exported as a separate table.
    #[serde(skip_serializing)]
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
}

/// Map a possibly missing or deleted author to a display name.
#[must_use]
pub fn author_or_anonymous(author: Option<&str>) -> String {
    match author.map(str::trim) {
        Some(name) if !name.is_empty() && name != REDDIT_DELETED_AUTHOR => name.to_string(),
        _ => ANONYMOUS_AUTHOR.to_string(),
    }
}
