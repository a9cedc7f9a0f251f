//! 4chan catalog scanning through the read-only JSON API.
//!
//! Every thread in a board's catalog whose subject or body mentions the topic is
//! fetched in full. A thread that cannot be fetched or parsed is skipped without
//! affecting the rest of the run.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::traits::Source;
use crate::config::{Config, SearchConfig};
use crate::constants::{ANONYMOUS_AUTHOR, COLLECTOR_USER_AGENT};
use crate::models::{Comment, Platform, Post, RecordId};
use crate::text::normalize_opt;

/// Threads stay raw here so that one malformed entry only costs that thread.
#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    threads: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CatalogThread {
    no: u64,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    com: Option<String>,
    time: i64,
    #[serde(default)]
    replies: u64,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    posts: Vec<ThreadPost>,
}

#[derive(Debug, Deserialize)]
struct ThreadPost {
    no: u64,
    #[serde(default)]
    com: Option<String>,
    time: i64,
}

/// A catalog thread whose subject or body matched the topic, text already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MatchedThread {
    no: u64,
    title: String,
    content: String,
    time: i64,
    replies: u64,
}

pub struct ChanSource {
    client: reqwest::Client,
    api_url: String,
}

impl ChanSource {
    /// Create a source reading from `api_url` (e.g. `https://a.4cdn.org`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(COLLECTOR_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.chan_api_url, config.http_timeout)
    }

    /// Collect matching threads from each board in `communities`.
    ///
    /// Boards keep their input order, threads their catalog order and comments their
    /// reply order. The opening post of a thread is never listed as a comment.
    ///
    /// # Errors
    ///
    /// Returns an error if a board's catalog cannot be fetched or parsed. Failures on
    /// individual threads are logged and the thread is skipped.
    pub async fn fetch_posts(&self, communities: &[String], query: &str) -> Result<Vec<Post>> {
        let mut posts = Vec::new();

        for board in communities {
            let matched = self.matching_threads(board, query).await?;
            info!(board = %board, matched = matched.len(), "Scanned catalog");

            for thread in matched {
                match self.fetch_thread(board, thread.no).await {
                    Ok(replies) => posts.push(build_post(board, query, thread, replies)),
                    Err(e) => {
                        warn!(board = %board, thread = thread.no, "Skipping thread: {e:#}");
                    }
                }
            }
        }

        Ok(posts)
    }

    async fn matching_threads(&self, board: &str, query: &str) -> Result<Vec<MatchedThread>> {
        let url = format!("{}/{}/catalog.json", self.api_url, urlencoding::encode(board));

        let pages: Vec<CatalogPage> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog for /{board}/"))?
            .error_for_status()
            .with_context(|| format!("Catalog request for /{board}/ returned error"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse catalog for /{board}/"))?;

        let needle = query.to_lowercase();
        let matched = pages
            .into_iter()
            .flat_map(|page| page.threads)
            .filter_map(|entry| match serde_json::from_value::<CatalogThread>(entry) {
                Ok(thread) => Some(thread),
                Err(e) => {
                    warn!(board = %board, "Skipping malformed catalog entry: {e}");
                    None
                }
            })
            .filter_map(|thread| {
                let title = normalize_opt(thread.sub.as_deref());
                let content = normalize_opt(thread.com.as_deref());
                mentions(&title, &content, &needle).then_some(MatchedThread {
                    no: thread.no,
                    title,
                    content,
                    time: thread.time,
                    replies: thread.replies,
                })
            })
            .collect();

        Ok(matched)
    }

    async fn fetch_thread(&self, board: &str, thread_no: u64) -> Result<ThreadResponse> {
        let url = format!(
            "{}/{}/thread/{thread_no}.json",
            self.api_url,
            urlencoding::encode(board)
        );
        debug!(url = %url, "Fetching thread");

        self.client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch thread")?
            .error_for_status()
            .context("Thread request returned error")?
            .json()
            .await
            .context("Failed to parse thread")
    }
}

#[async_trait]
impl Source for ChanSource {
    fn platform(&self) -> Platform {
        Platform::FourChan
    }

    async fn collect(&self, search: &SearchConfig) -> Result<Vec<Post>> {
        self.fetch_posts(&search.boards, &search.topic).await
    }
}

/// Case-insensitive substring test; `needle` must already be lowercase.
fn mentions(title: &str, content: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle) || content.to_lowercase().contains(needle)
}

fn build_post(board: &str, query: &str, thread: MatchedThread, replies: ThreadResponse) -> Post {
    // The first entry is the opening post itself.
    let comments = replies
        .posts
        .into_iter()
        .skip(1)
        .map(|reply| Comment {
            comment_id: RecordId::Number(reply.no),
            comment_text: normalize_opt(reply.com.as_deref()),
            comment_author: ANONYMOUS_AUTHOR.to_string(),
            comment_score: None,
            comment_timestamp: reply.time,
        })
        .collect();

    Post {
        platform: Platform::FourChan,
        id: RecordId::Number(thread.no),
        title: thread.title,
        content: thread.content,
        timestamp: thread.time,
        comments_count: thread.replies,
        upvotes: None,
        author: ANONYMOUS_AUTHOR.to_string(),
        comments,
        topic: Some(query.to_string()),
        board: Some(board.to_string()),
    }
}
