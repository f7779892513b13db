//! Error types, one per failure class.
//!
//! Only [`ConfigError`] is fatal, and only at startup.  Everything raised
//! while scanning or dispatching is logged and the process keeps running;
//! the next scheduled cycle acts as the retry.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Invalid or missing configuration.  Aborts the process before scheduling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing bot token (set BOT_TOKEN)")]
    MissingBotToken,

    #[error("no feed URLs configured (set RSS_URLS)")]
    NoFeeds,

    #[error("no destinations configured (set GROUP_IDS)")]
    NoDestinations,

    #[error("scan interval must be between 1 and {max} minutes, got {0}", max = crate::config::MAX_SCAN_INTERVAL_MINS)]
    InvalidInterval(u64),
}

/// Fetching or parsing one feed failed.  Scoped to that feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    #[error("invalid feed: {0}")]
    Parse(#[from] rss::Error),
}

/// Sending one message to one destination failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram rejected the message ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("delivery session already closed")]
    Closed,
}

/// Reading or writing the state file failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file: {0}")]
    Json(#[from] serde_json::Error),
}
