//! `--check`: fetch each feed once and report, without sending anything.

use tracing::{error, info};

use crate::source::FeedSource;

/// Returns how many feeds failed to fetch or parse.
pub async fn probe_feeds(source: &dyn FeedSource, feeds: &[String]) -> usize {
    let mut failures = 0;
    for url in feeds {
        match source.fetch(url).await {
            Ok(feed) => {
                info!(url = %url, title = %feed.title, items = feed.items.len(), "feed ok");
                if let Some(newest) = feed.items.first() {
                    info!(
                        title = newest.title.as_deref().unwrap_or("(untitled)"),
                        link = newest.link.as_deref().unwrap_or(""),
                        "newest item"
                    );
                }
            }
            Err(e) => {
                error!(url = %url, error = %e, "feed check failed");
                failures += 1;
            }
        }
    }
    info!(checked = feeds.len(), failures, "feed check finished");
    failures
}
