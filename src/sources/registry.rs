use anyhow::Result;

use super::chan::ChanSource;
use super::reddit::RedditSource;
use super::traits::Source;
use crate::config::Config;

/// Sources of a run, kept in the order their posts are exported.
pub struct SourceRegistry {
    sources: Vec<Box<dyn Source>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Reddit followed by 4chan, configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(RedditSource::from_config(config)?));
        registry.register(Box::new(ChanSource::from_config(config)?));
        Ok(registry)
    }

    /// Append a source; it runs after every source registered before it.
    pub fn register(&mut self, source: Box<dyn Source>) {
        self.sources.push(source);
    }

    /// Get all registered sources in run order.
    #[must_use]
    pub fn sources(&self) -> &[Box<dyn Source>] {
        &self.sources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
