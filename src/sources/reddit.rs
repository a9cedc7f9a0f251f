//! Reddit search through the OAuth API.
//!
//! Uses the application-only (client credentials) flow of a script app, searches one
//! subreddit and pulls the full comment tree of every result. Truncated branches
//! (`more` placeholders) are dropped rather than expanded.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Largest page the listing endpoints return.
const SEARCH_PAGE_SIZE: u32 = 100;

/// Comments requested per tree, the most the comments endpoint honours.
const COMMENT_TREE_LIMIT: &str = "2048";

use super::traits::Source;
use crate::config::{Config, RedditCredentials, SearchConfig};
use crate::models::{author_or_anonymous, Comment, Platform, Post, RecordId};

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("missing Reddit credential {0}")]
    MissingCredential(&'static str),
    #[error("Reddit rejected the credentials: {0}")]
    AuthRejected(String),
    #[error("unexpected Reddit response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
    /// Cursor for the next page; absent on the last one.
    #[serde(default)]
    after: Option<String>,
}

/// A listing entry. `kind` is `t3` for posts, `t1` for comments and `more` for
/// truncated comment branches.
#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    score: i64,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    replies: Replies,
}

/// Reddit sends `""` instead of a listing when a comment has no replies.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Replies {
    Listing(Listing),
    #[allow(dead_code)]
    Empty(String),
    #[default]
    Missing,
}

impl LinkData {
    fn into_post(self, comments: Vec<Comment>) -> Post {
        Post {
            platform: Platform::Reddit,
            id: RecordId::Text(self.id),
            title: self.title,
            content: self.selftext,
            timestamp: self.created_utc as i64,
            comments_count: self.num_comments,
            upvotes: Some(self.score),
            author: author_or_anonymous(self.author.as_deref()),
            comments,
            topic: None,
            board: None,
        }
    }
}

/// Bearer token plus the user agent it was issued to.
struct Session {
    token: String,
    user_agent: String,
}

pub struct RedditSource {
    client: reqwest::Client,
    credentials: RedditCredentials,
    auth_url: String,
    api_url: String,
}

impl RedditSource {
    /// Create a source talking to the given token and API hosts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        credentials: RedditCredentials,
        auth_url: &str,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.reddit.clone(),
            &config.reddit_auth_url,
            &config.reddit_api_url,
            config.http_timeout,
        )
    }

    /// Search `community` for `query` and fetch every result's comment tree.
    ///
    /// Posts keep the search API's order. Comments are listed breadth-first: all
    /// top-level comments, then their replies, level by level.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails or any request fails. Nothing is
    /// retried and no partial result is returned.
    pub async fn fetch_posts(&self, community: &str, query: &str, limit: u32) -> Result<Vec<Post>> {
        let session = self.authenticate().await?;
        let results = self.search(&session, community, query, limit).await?;
        info!(subreddit = %community, results = results.len(), "Reddit search complete");

        let mut posts = Vec::with_capacity(results.len());
        for link in results {
            let comments = self
                .fetch_comments(&session, &link.id)
                .await
                .with_context(|| format!("Failed to fetch comments for Reddit post {}", link.id))?;
            debug!(post_id = %link.id, comments = comments.len(), "Fetched comment tree");
            posts.push(link.into_post(comments));
        }

        Ok(posts)
    }

    async fn authenticate(&self) -> Result<Session> {
        let client_id = self
            .credentials
            .client_id
            .as_deref()
            .ok_or(RedditError::MissingCredential("REDDIT_CLIENT_ID"))?;
        let client_secret = self
            .credentials
            .client_secret
            .as_deref()
            .ok_or(RedditError::MissingCredential("REDDIT_CLIENT_SECRET"))?;
        let user_agent = self
            .credentials
            .user_agent
            .as_deref()
            .ok_or(RedditError::MissingCredential("REDDIT_USER_AGENT"))?;

        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_url))
            .basic_auth(client_id, Some(client_secret))
            .header(USER_AGENT, user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to reach Reddit token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::AuthRejected(format!("token endpoint returned {status}")).into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Reddit token response")?;

        match (token.access_token, token.error) {
            (Some(access_token), None) if !access_token.is_empty() => Ok(Session {
                token: access_token,
                user_agent: user_agent.to_string(),
            }),
            (_, Some(error)) => Err(RedditError::AuthRejected(error).into()),
            _ => Err(RedditError::AuthRejected("no access token in response".to_string()).into()),
        }
    }

    /// Page through search results with the `after` cursor until `limit` posts are
    /// collected or the listing runs out.
    async fn search(
        &self,
        session: &Session,
        community: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<LinkData>> {
        let url = format!("{}/r/{}/search", self.api_url, urlencoding::encode(community));
        let wanted = limit as usize;
        let mut links: Vec<LinkData> = Vec::new();
        let mut after: Option<String> = None;

        while links.len() < wanted {
            let page_size = (wanted - links.len()).min(SEARCH_PAGE_SIZE as usize);

            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&session.token)
                .header(USER_AGENT, session.user_agent.as_str())
                .query(&[
                    ("q", query),
                    ("restrict_sr", "1"),
                    ("sort", "relevance"),
                    ("t", "all"),
                    ("raw_json", "1"),
                ])
                .query(&[("limit", page_size)]);
            if let Some(cursor) = &after {
                request = request
                    .query(&[("after", cursor.as_str())])
                    .query(&[("count", links.len())]);
            }

            let listing: Listing = request
                .send()
                .await
                .context("Failed to send Reddit search request")?
                .error_for_status()
                .context("Reddit search returned error")?
                .json()
                .await
                .context("Failed to parse Reddit search response")?;

            let ListingData { children, after: next } = listing.data;
            if children.is_empty() {
                break;
            }

            for thing in children.into_iter().filter(|thing| thing.kind == "t3") {
                links.push(
                    serde_json::from_value(thing.data).context("Failed to parse Reddit post")?,
                );
            }
            debug!(subreddit = %community, collected = links.len(), "Fetched search page");

            if next.is_none() {
                break;
            }
            after = next;
        }

        links.truncate(wanted);
        Ok(links)
    }

    async fn fetch_comments(&self, session: &Session, post_id: &str) -> Result<Vec<Comment>> {
        let url = format!("{}/comments/{}", self.api_url, urlencoding::encode(post_id));

        // The response is [post listing, comment listing].
        let listings: Vec<Listing> = self
            .client
            .get(&url)
            .bearer_auth(&session.token)
            .header(USER_AGENT, session.user_agent.as_str())
            .query(&[
                ("limit", COMMENT_TREE_LIMIT),
                ("sort", "confidence"),
                ("raw_json", "1"),
            ])
            .send()
            .await
            .context("Failed to send Reddit comments request")?
            .error_for_status()
            .context("Reddit comments request returned error")?
            .json()
            .await
            .context("Failed to parse Reddit comments response")?;

        let forest = listings.into_iter().nth(1).ok_or_else(|| {
            RedditError::UnexpectedResponse(format!("no comment listing for post {post_id}"))
        })?;

        flatten_comment_forest(forest.data.children)
    }
}

#[async_trait]
impl Source for RedditSource {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn collect(&self, search: &SearchConfig) -> Result<Vec<Post>> {
        self.fetch_posts(&search.subreddit, &search.topic, search.result_limit)
            .await
    }
}

/// Flatten a comment tree breadth-first, dropping `more` placeholders.
fn flatten_comment_forest(roots: Vec<Thing>) -> Result<Vec<Comment>> {
    let mut queue: VecDeque<Thing> = roots.into();
    let mut comments = Vec::new();

    while let Some(thing) = queue.pop_front() {
        if thing.kind != "t1" {
            continue;
        }

        let data: CommentData =
            serde_json::from_value(thing.data).context("Failed to parse Reddit comment")?;

        if let Replies::Listing(listing) = data.replies {
            queue.extend(listing.data.children);
        }

        comments.push(Comment {
            comment_id: RecordId::Text(data.id),
            comment_text: data.body,
            comment_author: author_or_anonymous(data.author.as_deref()),
            comment_score: Some(data.score),
            comment_timestamp: data.created_utc as i64,
        });
    }

    Ok(comments)
}
