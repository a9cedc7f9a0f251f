//! Shared constants used across the application.

/// Author name recorded when a source has no identifiable (or a deleted) author.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Reddit's author placeholder for deleted accounts.
pub const REDDIT_DELETED_AUTHOR: &str = "[deleted]";

/// Host serving Reddit's OAuth token endpoint.
pub const DEFAULT_REDDIT_AUTH_URL: &str = "https://www.reddit.com";

/// Host serving authenticated Reddit API calls.
pub const DEFAULT_REDDIT_API_URL: &str = "https://oauth.reddit.com";

/// Read-only JSON API for 4chan boards.
pub const DEFAULT_CHAN_API_URL: &str = "https://a.4cdn.org";

/// User agent for unauthenticated catalog requests.
///
/// Reddit requests use the user agent supplied with the credentials instead.
pub const COLLECTOR_USER_AGENT: &str = "topic-collector/0.1";
