//! CSV export of collected posts and their comments.
//!
//! Posts and comments are written to two tables sharing one run timestamp. Column
//! order is fixed by [`POST_COLUMNS`] and [`COMMENT_COLUMNS`]; a declared column is
//! written only when at least one row carries the field, and a row without the field
//! gets an empty cell.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::models::Post;

/// Timestamp embedded in output file names, second resolution.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Column order of the posts table.
pub const POST_COLUMNS: &[&str] = &[
    "platform",
    "id",
    "title",
    "content",
    "timestamp",
    "comments_count",
    "upvotes",
    "author",
    "topic",
    "board",
];

/// Column order of the comments table.
pub const COMMENT_COLUMNS: &[&str] = &[
    "comment_id",
    "comment_text",
    "comment_author",
    "comment_score",
    "comment_timestamp",
    "post_id",
    "platform",
];

/// Source of the run timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Where an export was written and how much it contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub posts_path: PathBuf,
    pub comments_path: PathBuf,
    pub posts_written: usize,
    pub comments_written: usize,
}

/// A rectangular table of rendered cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from field maps.
    ///
    /// Declared columns come first, in declared order, if any record has them. Fields
    /// not declared are appended after, in key order.
    #[must_use]
    pub fn from_records(records: &[Map<String, Value>], declared: &[&str]) -> Self {
        let mut columns: Vec<String> = declared
            .iter()
            .filter(|column| records.iter().any(|r| r.contains_key(**column)))
            .map(|column| (*column).to_string())
            .collect();

        for record in records {
            for key in record.keys() {
                if !declared.contains(&key.as_str()) && !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| render_cell(record.get(c))).collect())
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV with a header row. An empty table yields an empty file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        if !self.columns.is_empty() {
            writer
                .write_record(&self.columns)
                .with_context(|| format!("Failed to write header to {}", path.display()))?;
        }
        for row in &self.rows {
            writer
                .write_record(row)
                .with_context(|| format!("Failed to write row to {}", path.display()))?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        Ok(())
    }
}

/// Missing fields and nulls render as empty cells.
fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).context("Failed to serialize record")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected a record, got {other}"),
    }
}

/// One row per post, without comments.
///
/// # Errors
///
/// Returns an error if a post cannot be serialized.
pub fn posts_table(posts: &[Post]) -> Result<Table> {
    let records = posts.iter().map(to_record).collect::<Result<Vec<_>>>()?;
    Ok(Table::from_records(&records, POST_COLUMNS))
}

/// One row per comment across all posts, tagged with the parent's id and platform.
///
/// # Errors
///
/// Returns an error if a comment cannot be serialized.
pub fn comments_table(posts: &[Post]) -> Result<Table> {
    let mut records = Vec::new();
    for post in posts {
        let post_id = serde_json::to_value(&post.id).context("Failed to serialize post id")?;
        for comment in &post.comments {
            let mut record = to_record(comment)?;
            record.insert("post_id".to_string(), post_id.clone());
            record.insert(
                "platform".to_string(),
                Value::String(post.platform.to_string()),
            );
            records.push(record);
        }
    }
    Ok(Table::from_records(&records, COMMENT_COLUMNS))
}

/// File-name-safe form of the search query.
fn file_stem(query: &str) -> String {
    query
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

/// Write `posts` and their comments as two CSV files in `destination_dir`.
///
/// Files are named `<query>_posts_<timestamp>.csv` and
/// `<query>_comments_<timestamp>.csv`, with the timestamp taken once from `clock`.
/// The directory is created if missing. Two exports within the same second overwrite
/// each other.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written.
pub fn export(
    posts: &[Post],
    query: &str,
    destination_dir: &Path,
    clock: &dyn Clock,
) -> Result<ExportSummary> {
    std::fs::create_dir_all(destination_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            destination_dir.display()
        )
    })?;

    let timestamp = clock.now().format(RUN_TIMESTAMP_FORMAT).to_string();
    let stem = file_stem(query);
    let posts_path = destination_dir.join(format!("{stem}_posts_{timestamp}.csv"));
    let comments_path = destination_dir.join(format!("{stem}_comments_{timestamp}.csv"));

    let posts_table = posts_table(posts)?;
    posts_table.write_csv(&posts_path)?;

    let comments_table = comments_table(posts)?;
    comments_table.write_csv(&comments_path)?;

    info!(
        posts = posts_table.len(),
        comments = comments_table.len(),
        dir = %destination_dir.display(),
        "Saved export"
    );

    Ok(ExportSummary {
        posts_path,
        comments_path,
        posts_written: posts_table.len(),
        comments_written: comments_table.len(),
    })
}
