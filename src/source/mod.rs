//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait and the [`Article`] /
//! [`Feed`] types it produces.  Concrete implementations live in
//! sub-modules (currently only [`rss`]).
//!
//! ## For contributors: adding a new source
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a struct holding its HTTP client / settings and implement
//!    [`FeedSource`] for it.
//! 3. Add `mod atom;` below and re-export the struct.
//! 4. Construct it in `main.rs` instead of (or next to) `RssSource`.
//!
//! The scan engine, de-duplication and dispatch are source-agnostic.

mod article;
mod rss;

pub use self::article::{Article, Marker};
pub use self::rss::RssSource;

use async_trait::async_trait;

use crate::error::FetchError;

/// One fetched feed: its display title and its entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: String,
    pub items: Vec<Article>,
}

/// Trait that every feed source must implement.
///
/// The engine calls [`fetch()`](FeedSource::fetch) once per feed per scan
/// cycle, from whichever tokio worker runs the cycle, so implementations
/// must be `Send + Sync`.  Request timeouts are the implementation's concern;
/// the engine never retries within a cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Feed, FetchError>;
}
