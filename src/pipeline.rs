//! A collection run: every source in registry order, then one export.
//!
//! Each source runs behind its own result. A source that fails is reported and the
//! run carries on with whatever the other sources produced.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::{Config, SearchConfig};
use crate::export::{export, Clock, ExportSummary};
use crate::models::{Platform, Post};
use crate::sources::{Source, SourceRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// Number of posts the source produced.
    Collected(usize),
    /// Why the source produced nothing.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub platform: Platform,
    pub status: SourceStatus,
}

/// Posts from every source that succeeded, in registry order.
#[derive(Debug, Default)]
pub struct Collection {
    pub posts: Vec<Post>,
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sources: Vec<SourceSummary>,
    pub export: ExportSummary,
}

impl RunReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_platforms().is_empty()
    }

    #[must_use]
    pub fn failed_platforms(&self) -> Vec<Platform> {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Failed(_)))
            .map(|s| s.platform)
            .collect()
    }
}

/// Run every registered source in order and concatenate their posts.
pub async fn collect_all(registry: &SourceRegistry, search: &SearchConfig) -> Collection {
    let mut collection = Collection::default();

    for source in registry.sources() {
        let platform = source.platform();
        info!(platform = %platform, topic = %search.topic, "Fetching posts");

        let status = match source.collect(search).await {
            Ok(posts) => {
                let comments: usize = posts.iter().map(|p| p.comments.len()).sum();
                info!(platform = %platform, posts = posts.len(), comments, "Fetched posts");
                let count = posts.len();
                collection.posts.extend(posts);
                SourceStatus::Collected(count)
            }
            Err(e) => {
                error!(platform = %platform, "Source failed: {e:#}");
                SourceStatus::Failed(format!("{e:#}"))
            }
        };

        collection.sources.push(SourceSummary { platform, status });
    }

    collection
}

/// Collect from every source and export the result to `config.output_dir`.
///
/// # Errors
///
/// Returns an error only if the export fails. Source failures are part of the report.
pub async fn run(
    config: &Config,
    registry: &SourceRegistry,
    clock: &dyn Clock,
) -> Result<RunReport> {
    let collection = collect_all(registry, &config.search).await;

    let export = export(
        &collection.posts,
        &config.search.topic,
        &config.output_dir,
        clock,
    )?;

    let report = RunReport {
        sources: collection.sources,
        export,
    };

    for platform in report.failed_platforms() {
        warn!(platform = %platform, "Export is missing posts from a failed source");
    }

    Ok(report)
}
