//! RSS feed source implementation.
//!
//! Fetches a feed over HTTP with an async [`reqwest::Client`] and parses it
//! as RSS 2.0 using the [`rss`] crate.  Use it as a template when adding
//! support for Atom, JSON Feed, or any other format.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{Article, Feed, FeedSource};
use crate::error::FetchError;

/// An RSS feed source.
///
/// One instance serves every configured feed URL; the client is shared and
/// carries the request-level timeout and User-Agent.
pub struct RssSource {
    client: reqwest::Client,
}

impl RssSource {
    /// Create a new RSS source.
    ///
    /// # Arguments
    ///
    /// * `timeout`: per-request timeout applied to every fetch.
    /// * `user_agent`: sent with every request; some feed hosts reject
    ///   clients without one.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Convert an already-fetched [`rss::Channel`] into a [`Feed`].
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// parsing logic without hitting the network.  Item order is preserved.
    pub fn parse_channel(channel: &rss::Channel, url: &str) -> Feed {
        let items = channel
            .items()
            .iter()
            .map(|item| Article {
                title: item.title().map(String::from),
                link: item.link().map(String::from),
                guid: item.guid().map(|g| g.value().to_string()),
            })
            .collect();

        // Fall back to the URL so messages always name their feed.
        let title = match channel.title().trim() {
            "" => url.to_string(),
            title => title.to_string(),
        };

        Feed { title, items }
    }
}

#[async_trait]
impl FeedSource for RssSource {
    async fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let channel = rss::Channel::read_from(body.as_ref())?;
        debug!(url, items = channel.items().len(), "fetched feed");
        Ok(Self::parse_channel(&channel, url))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
