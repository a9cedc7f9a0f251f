use anyhow::Result;
use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::models::{Platform, Post};

/// A platform that posts about a topic can be collected from.
#[async_trait]
pub trait Source: Send + Sync {
    /// Platform tag carried by every post this source produces.
    fn platform(&self) -> Platform;

    /// Collect every post matching the search, each with its comments attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or rejects the request.
    /// Partial failures a source can recover from are handled internally.
    async fn collect(&self, search: &SearchConfig) -> Result<Vec<Post>>;
}
