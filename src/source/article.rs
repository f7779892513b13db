//! The item type shared by every feed source.
//!
//! `Article` is what a [`FeedSource`](super::FeedSource) hands back for each
//! entry of a feed.  It is transient: articles are fetched once per cycle and
//! never stored.  Only the [`Marker`] of the newest one survives in the
//! persisted scan state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single feed entry as seen during one fetch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Article {
    /// Headline, if the feed provides one.
    pub title: Option<String>,

    /// URL of the full content.
    pub link: Option<String>,

    /// Feed-assigned unique identifier (`<guid>` for RSS).
    pub guid: Option<String>,
}

impl Article {
    /// Identity used for "already seen" checks.
    ///
    /// The first non-empty value of `guid`, `link`, `title` wins.  Whitespace
    /// counts as content.  An article carrying none of them has no identity
    /// and never matches a marker.
    pub fn marker(&self) -> Option<Marker> {
        [&self.guid, &self.link, &self.title]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .map(|value| Marker::new(value.clone()))
    }
}

/// Opaque identifier of the newest article observed for a feed.
///
/// Only ever compared for equality.  Serialises as a bare string so the
/// state file stays a plain `url -> id` map.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(String);

impl Marker {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
